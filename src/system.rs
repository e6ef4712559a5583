//! Host preparation done before the port is opened: the bridge has to run
//! as root, and the login getty that systemd attaches to the UART has to be
//! stopped or it will swallow the board's output.

use log::{info, warn};
use std::{fmt, path::Path, process::Command};

/// Returned when the host is not in a state the bridge can run in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// Not running with an effective uid of 0.
    NotSuperuser,
    /// The port path has no file name to derive a getty unit from.
    BadPortPath(String),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::NotSuperuser => {
                write!(f, "you need to be a superuser to run this program")
            }
            SetupError::BadPortPath(path) => write!(f, "{path} is not a serial device path"),
        }
    }
}

impl std::error::Error for SetupError {}

/// Fails unless the process runs as root.
pub fn ensure_superuser() -> Result<(), SetupError> {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let euid = unsafe { libc::geteuid() };
    if euid == 0 {
        Ok(())
    } else {
        Err(SetupError::NotSuperuser)
    }
}

/// The systemd unit running a login prompt on `port`, e.g.
/// `serial-getty@ttyS0.service` for `/dev/ttyS0`.
pub fn getty_unit(port: &Path) -> Result<String, SetupError> {
    port.file_name()
        .map(|name| format!("serial-getty@{}.service", name.to_string_lossy()))
        .ok_or_else(|| SetupError::BadPortPath(port.display().to_string()))
}

/// Stops the getty on `port`. A failing `systemctl` is only logged: if the
/// port is really unusable, opening it will say so.
pub fn stop_getty(port: &Path) -> Result<(), SetupError> {
    let unit = getty_unit(port)?;
    match Command::new("systemctl").arg("stop").arg(&unit).status() {
        Ok(status) if status.success() => info!("Stopped {unit}"),
        Ok(status) => warn!("systemctl stop {unit} exited with {status}"),
        Err(e) => warn!("Could not run systemctl: {e}"),
    }
    Ok(())
}
