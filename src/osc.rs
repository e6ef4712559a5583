//! The outgoing side of the bridge: OSC messages over UDP.
//!
//! Only one message shape is ever produced, an address followed by a single
//! float argument:
//!
//! ```text
//! <address>\0 (padded to 4 bytes) ,f\0\0 <f32, big-endian>
//! ```

use log::info;
use std::{
    fmt, io,
    net::{SocketAddr, ToSocketAddrs, UdpSocket},
};

/// Something that accepts `(parameter address, value)` pairs. Sending is
/// fire-and-forget; nothing is ever read back.
pub trait ControlSink {
    /// Sends `value` to `address`.
    fn send(&mut self, address: &str, value: f32) -> io::Result<()>;
}

/// Returned when the OSC destination cannot be set up.
#[derive(Debug)]
pub enum SinkError {
    /// The host/port pair did not resolve to any address.
    Unresolved(String),
    /// The local socket could not be bound.
    IoError(io::Error),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Unresolved(target) => write!(f, "cannot resolve OSC target {target}"),
            SinkError::IoError(error) => write!(f, "io error: {error}"),
        }
    }
}

impl std::error::Error for SinkError {}

impl From<io::Error> for SinkError {
    fn from(value: io::Error) -> Self {
        Self::IoError(value)
    }
}

fn push_padded(buf: &mut Vec<u8>, s: &str) {
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    while buf.len() % 4 != 0 {
        buf.push(0);
    }
}

/// Encodes a single-float OSC message.
pub fn encode_message(address: &str, value: f32) -> Vec<u8> {
    let mut buf = Vec::with_capacity(address.len() + 12);
    push_padded(&mut buf, address);
    push_padded(&mut buf, ",f");
    buf.extend_from_slice(&value.to_be_bytes());
    buf
}

/// Sends OSC messages to one fixed UDP destination.
#[derive(Debug)]
pub struct OscUdpSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl OscUdpSink {
    /// Binds an ephemeral local socket that sends to `host:port`.
    pub fn new(host: &str, port: u16) -> Result<Self, SinkError> {
        let target = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| SinkError::Unresolved(format!("{host}:{port}")))?;

        let bind_addr: SocketAddr = if target.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind_addr)?;

        info!("Sending OSC to {target}");
        Ok(Self { socket, target })
    }

    /// Where messages go.
    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl ControlSink for OscUdpSink {
    fn send(&mut self, address: &str, value: f32) -> io::Result<()> {
        let packet = encode_message(address, value);
        self.socket.send_to(&packet, self.target).map(|_| ())
    }
}

/// A sink that only logs, for dry runs with the monitor.
#[derive(Debug, Default)]
pub struct LogSink;

impl ControlSink for LogSink {
    fn send(&mut self, address: &str, value: f32) -> io::Result<()> {
        info!("{address} <- {value:.2}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn encodes_aligned_message() {
        let packet = encode_message("/parameter/Canyon/Gain", 0.5);

        assert_eq!(packet.len() % 4, 0);
        // 22 address bytes + NUL, padded to 24
        assert_eq!(&packet[..22], b"/parameter/Canyon/Gain");
        assert_eq!(&packet[22..24], &[0, 0]);
        assert_eq!(&packet[24..28], b",f\0\0");
        assert_eq!(&packet[28..], &0.5f32.to_be_bytes());
    }

    /// An address whose length is already a multiple of four still gets a
    /// full word of terminating NULs.
    #[test]
    fn pads_word_sized_address() {
        let packet = encode_message("/abc", 1.0);
        assert_eq!(&packet[..8], b"/abc\0\0\0\0");
        assert_eq!(packet.len(), 16);
    }

    #[test]
    fn udp_sink_delivers_packet() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let port = receiver.local_addr().unwrap().port();

        let mut sink = OscUdpSink::new("127.0.0.1", port).unwrap();
        assert_eq!(sink.target().port(), port);
        sink.send("/parameter/Canyon/Blend", 0.25).unwrap();

        let mut buf = [0; 64];
        let len = receiver.recv(&mut buf).unwrap();
        assert_eq!(
            &buf[..len],
            encode_message("/parameter/Canyon/Blend", 0.25).as_slice()
        );
    }

    #[test]
    fn unresolvable_target_is_an_error() {
        assert!(OscUdpSink::new("definitely not a host", 24024).is_err());
    }
}
