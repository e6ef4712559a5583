// Commandline argument parser using clap for CanyonBridge

use crate::{
    dummy_board::DummyBoard,
    smoother::{GateMode, Smoother, DEFAULT_THRESHOLD, DEFAULT_WINDOW},
};
use clap::{builder::TypedValueParser, Args, Parser};
use std::{path::PathBuf, time::Duration};

/// Options shared by the bridge and the monitor.
#[derive(Debug, Args, Clone)]
pub struct SmoothingArgs {
    /// Number of samples averaged per channel
    #[arg(short = 'w', long = "window", default_value_t = DEFAULT_WINDOW,
          value_parser = clap::value_parser!(u16).range(1..).map(usize::from))]
    pub window: usize,

    /// Minimum change, in raw ADC units, before a new value is sent
    #[arg(short = 't', long = "threshold", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// What a new average is compared against: the previous raw sample
    /// (window) or the last value sent (emitted)
    #[arg(long = "gate", value_enum, default_value_t = GateMode::Window)]
    pub gate: GateMode,
}

impl SmoothingArgs {
    /// Builds the [`Smoother`] these options describe.
    pub fn smoother(&self) -> Smoother {
        Smoother::new(self.window, self.threshold, self.gate)
    }
}

#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
/// Forwards potentiometer readings from the serial link to Sushi as OSC
pub struct BridgeArgs {
    /// Serial port the potentiometer board is attached to
    #[arg(long = "serial-port", alias = "serial_port", default_value = "/dev/ttyS0")]
    pub serial_port: PathBuf,

    /// Address of the OSC server
    #[arg(long = "osc-ip", alias = "osc_ip", default_value = "127.0.0.1")]
    pub osc_ip: String,

    /// Port of the OSC server
    #[arg(long = "osc-port", alias = "osc_port", default_value_t = 24024)]
    pub osc_port: u16,

    #[command(flatten)]
    pub smoothing: SmoothingArgs,

    /// Skip the superuser check and leave the serial getty running
    #[arg(long = "no-system-setup")]
    pub no_system_setup: bool,

    /// Enable debug output, including every message sent
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
/// Runs the smoothing pipeline and logs what would be sent, without any OSC
pub struct MonitorArgs {
    /// Serial port to read from; the simulated board is used when omitted
    #[arg(long = "serial-port")]
    pub serial_port: Option<PathBuf>,

    #[command(flatten)]
    pub smoothing: SmoothingArgs,

    #[command(flatten)]
    pub board: BoardArgs,

    /// Enable debug output
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

/// Shape of the simulated board the monitor falls back to.
#[derive(Debug, Args, Clone)]
pub struct BoardArgs {
    /// Number of potentiometers on the simulated board
    #[arg(long = "channels", default_value_t = 6)]
    pub channels: usize,

    /// Starting positions, `@1` first; channels left out start centred
    #[arg(long = "levels", value_delimiter = ',', allow_negative_numbers = true)]
    pub levels: Vec<i32>,

    /// Jitter of the simulated board, in raw ADC units
    #[arg(long = "noise", default_value_t = 3)]
    pub noise: i32,

    /// Milliseconds between two rounds of readings
    #[arg(long = "period-ms", default_value_t = 10)]
    pub period_ms: u64,

    /// Milliseconds the simulated board takes to answer the probe
    #[arg(long = "ack-delay-ms", default_value_t = 0)]
    pub ack_delay_ms: u64,
}

impl BoardArgs {
    /// Starts the simulated board these options describe.
    pub fn build(&self) -> DummyBoard {
        self.levels
            .iter()
            .enumerate()
            .fold(
                DummyBoard::builder().channels(self.channels),
                |builder, (index, &level)| builder.level(index, level),
            )
            .noise(self.noise)
            .period(Duration::from_millis(self.period_ms))
            .ack_delay(Duration::from_millis(self.ack_delay_ms))
            .build()
    }
}

/// The log level `--debug` selects, unless `RUST_LOG` says otherwise.
pub fn log_level(debug: bool) -> log::LevelFilter {
    if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}
