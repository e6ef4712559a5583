use crate::{handshake::HandshakeError, osc::SinkError, port::PortError, system::SetupError};
use std::{error::Error, fmt::Display, io};

/// Everything that stops the bridge. Per-line problems never end up here;
/// they are logged and skipped.
#[derive(Debug)]
pub enum BridgeError {
    /// The host is not prepared for the bridge.
    Setup(SetupError),
    /// No serial port could be opened.
    Port(PortError),
    /// The board did not confirm it is ready.
    Handshake(HandshakeError),
    /// The OSC destination could not be set up.
    Sink(SinkError),
    /// The shutdown handler could not be installed.
    Signal(ctrlc::Error),
    /// The serial link failed.
    IOError(io::Error),
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeError::Setup(e) => write!(f, "{e}"),
            BridgeError::Port(e) => write!(f, "{e}"),
            BridgeError::Handshake(e) => write!(f, "{e}"),
            BridgeError::Sink(e) => write!(f, "{e}"),
            BridgeError::Signal(e) => write!(f, "cannot install signal handler: {e}"),
            BridgeError::IOError(e) => write!(f, "serial link failed: {e}"),
        }
    }
}

impl Error for BridgeError {}

impl From<SetupError> for BridgeError {
    fn from(value: SetupError) -> Self {
        Self::Setup(value)
    }
}

impl From<PortError> for BridgeError {
    fn from(value: PortError) -> Self {
        Self::Port(value)
    }
}

impl From<HandshakeError> for BridgeError {
    fn from(value: HandshakeError) -> Self {
        Self::Handshake(value)
    }
}

impl From<SinkError> for BridgeError {
    fn from(value: SinkError) -> Self {
        Self::Sink(value)
    }
}

impl From<ctrlc::Error> for BridgeError {
    fn from(value: ctrlc::Error) -> Self {
        Self::Signal(value)
    }
}

impl From<io::Error> for BridgeError {
    fn from(value: io::Error) -> Self {
        Self::IOError(value)
    }
}
