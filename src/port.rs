//! Finding and opening the serial port the board is attached to.

use log::{debug, info, warn};
use serial2::SerialPort;
use std::{
    fmt, io,
    path::{Path, PathBuf},
    time::Duration,
};

/// The board talks at this rate.
pub const BAUD_RATE: u32 = 115200;

/// Ports tried, in order, when the requested one does not open. These are
/// the two UARTs of a Raspberry Pi compute module.
pub const FALLBACK_PORTS: [&str; 2] = ["/dev/ttyS0", "/dev/ttyAMA0"];

/// Returned when no candidate port could be opened.
#[derive(Debug)]
pub struct PortError {
    tried: Vec<(PathBuf, io::Error)>,
}

impl fmt::Display for PortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no available serial port found")?;
        for (path, error) in &self.tried {
            write!(f, "; {}: {}", path.display(), error)?;
        }
        Ok(())
    }
}

impl std::error::Error for PortError {}

/// Returns `preferred` if it opens at `baud`, otherwise the first of
/// `fallbacks` that does. The probe handle is closed again before returning.
pub fn find_available_port<P: AsRef<Path>>(
    preferred: &Path,
    fallbacks: &[P],
    baud: u32,
) -> Result<PathBuf, PortError> {
    let candidates = std::iter::once(preferred).chain(fallbacks.iter().map(AsRef::<Path>::as_ref));

    let mut tried = Vec::new();
    for candidate in candidates {
        match SerialPort::open(candidate, baud) {
            Ok(_probe) => {
                if candidate != preferred {
                    warn!(
                        "{} is unavailable, falling back to {}",
                        preferred.display(),
                        candidate.display()
                    );
                }
                return Ok(candidate.to_path_buf());
            }
            Err(e) => {
                debug!("Cannot open {}: {}", candidate.display(), e);
                tried.push((candidate.to_path_buf(), e));
            }
        }
    }

    Err(PortError { tried })
}

/// Opens `path` for the bridge: zero read timeout so reads never block,
/// and whatever was buffered before we arrived is thrown away.
pub fn open_port(path: &Path, baud: u32) -> io::Result<SerialPort> {
    let mut port = SerialPort::open(path, baud)?;
    port.set_read_timeout(Duration::ZERO)?;
    port.discard_input_buffer()?;
    info!("Opened {} at {} baud", path.display(), baud);
    Ok(port)
}

/// Names of the serial ports the OS knows about, for diagnostics.
pub fn list_ports() -> Vec<String> {
    match SerialPort::available_ports() {
        Ok(ports) => ports
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect(),
        Err(e) => {
            warn!("Failed to get available ports: {e}");
            Vec::new()
        }
    }
}
