//! Runs the bridge on the device: serial potentiometer board in, OSC to
//! Sushi out.

use canyonbridge::{
    args::{log_level, BridgeArgs},
    bridge::Bridge,
    line_source::LinkReader,
    osc::OscUdpSink,
    port::{find_available_port, list_ports, open_port, BAUD_RATE, FALLBACK_PORTS},
    shutdown_flag,
    system::{ensure_superuser, stop_getty},
    BridgeError,
};
use clap::Parser;
use log::{debug, error, info};
use std::process;

// Example:
// canyonbridge --serial-port /dev/ttyS0
//              --osc-ip      127.0.0.1
//              --osc-port    24024
//              --window      10
//              --debug

fn main() {
    let args = BridgeArgs::parse();
    env_logger::Builder::new()
        .filter_level(log_level(args.debug))
        .parse_default_env()
        .init();

    if let Err(e) = run(args) {
        error!("{e}");
        process::exit(1);
    }
}

fn run(args: BridgeArgs) -> Result<(), BridgeError> {
    if !args.no_system_setup {
        ensure_superuser()?;
    }

    debug!("Available devices: {:?}", list_ports());
    let port_path = find_available_port(&args.serial_port, &FALLBACK_PORTS, BAUD_RATE)?;

    // A login prompt on the same UART would eat the board's output
    if !args.no_system_setup {
        stop_getty(&port_path)?;
    }

    let port = open_port(&port_path, BAUD_RATE)?;
    let sink = OscUdpSink::new(&args.osc_ip, args.osc_port)?;
    let running = shutdown_flag()?;

    info!(
        "CanyonBridge started on port {}. Debug mode {} enabled.",
        port_path.display(),
        if args.debug { "is" } else { "is not" }
    );

    let bridge = Bridge::new(LinkReader::new(port), sink, args.smoothing.smoother());
    let (_port, sink) = bridge.run(&running)?;
    info!(
        "Closing {} and the OSC socket to {}",
        port_path.display(),
        sink.target()
    );
    Ok(())
}
