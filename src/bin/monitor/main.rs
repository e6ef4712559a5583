//! Runs the smoothing pipeline and logs every message that would be sent,
//! from a real port or from the simulated board.

use canyonbridge::{
    args::{log_level, MonitorArgs},
    bridge::Bridge,
    line_source::{LineSource, LinkReader},
    osc::LogSink,
    port::{open_port, BAUD_RATE},
    shutdown_flag,
    smoother::Smoother,
    BridgeError,
};
use clap::Parser;
use log::{error, info};
use std::process;

fn main() {
    let args = MonitorArgs::parse();
    env_logger::Builder::new()
        .filter_level(log_level(args.debug))
        .parse_default_env()
        .init();

    let smoother = args.smoothing.smoother();
    let res = match &args.serial_port {
        Some(path) => open_port(path, BAUD_RATE)
            .map_err(BridgeError::from)
            .and_then(|port| monitor(LinkReader::new(port), smoother)),
        None => {
            info!("No serial port given, using the simulated board");
            monitor(args.board.build(), smoother)
        }
    };

    if let Err(e) = res {
        error!("{e}");
        process::exit(1);
    }
}

fn monitor<S: LineSource>(source: S, smoother: Smoother) -> Result<(), BridgeError> {
    let running = shutdown_flag()?;
    Bridge::new(source, LogSink, smoother).run(&running)?;
    Ok(())
}
