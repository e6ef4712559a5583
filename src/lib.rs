//! CanyonBridge connects a small board of potentiometers to the Sushi audio
//! host. The board samples six knobs every 10ms and prints each reading on a
//! serial line as `@<knob>/<value>`. This crate reads those lines, smooths
//! every knob with a short moving average, drops changes too small to hear,
//! and sends what is left to the Canyon plugin's parameters as OSC messages
//! over UDP.
//!
//! The pipeline, one record at a time:
//!
//! 1. [`line_source`] pulls complete lines off the serial port without ever
//!    blocking.
//! 2. [`record_decoder`] turns a line into a [`record_decoder::Record`].
//! 3. [`smoother`] averages the knob's recent readings and decides whether
//!    the change is worth sending.
//! 4. [`router`] looks up the plugin parameter the knob drives.
//! 5. [`osc`] sends the normalized value.
//!
//! Before any of that, [`handshake`] checks that the board is alive and
//! tells it to start streaming. [`bridge`] ties it all together.
//!
//! Two binaries are built: `canyonbridge`, which runs on the device, and
//! `monitor`, which logs what would be sent (from a real port or from the
//! simulated board in [`dummy_board`]) for calibration and debugging.

#![warn(missing_docs)]
pub mod args;
pub mod bridge;
pub mod dummy_board;
mod error;
pub mod handshake;
pub mod line_source;
pub mod osc;
pub mod port;
pub mod record_decoder;
pub mod router;
pub mod smoother;
pub mod system;

pub use error::BridgeError;

use log::info;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Sets up a Ctrl-C/SIGTERM handler. The returned flag reads `true` until
/// the process is asked to stop.
pub fn shutdown_flag() -> Result<Arc<AtomicBool>, BridgeError> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        info!("Shutdown requested");
        r.store(false, Ordering::SeqCst);
    })?;
    Ok(running)
}
