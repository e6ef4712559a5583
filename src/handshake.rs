//! The startup exchange with the potentiometer board. The board stays
//! silent until it is asked `READY?` and answers `OK`, after which it starts
//! streaming readings.

use crate::line_source::LineSource;
use log::{debug, info};
use std::{
    fmt, io,
    time::{Duration, Instant},
};

/// Where a [`Negotiator`] is in the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    /// Nothing sent yet.
    Idle,
    /// The probe was sent and we are waiting for the answer.
    SentReady,
    /// The board answered with the acknowledgment.
    Confirmed,
    /// The board answered wrongly, or not at all.
    Failed,
}

/// Why the handshake did not succeed.
#[derive(Debug)]
pub enum HandshakeError {
    /// The board answered with something other than the acknowledgment.
    ProtocolMismatch(String),
    /// No answer before the deadline.
    Timeout(Duration),
    /// The link failed while probing or polling.
    IoError(io::Error),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeError::ProtocolMismatch(response) => write!(
                f,
                "protocol mismatch: unexpected response {response:?} from the other device"
            ),
            HandshakeError::Timeout(after) => write!(
                f,
                "negotiation timeout: the other device did not respond within {after:?}"
            ),
            HandshakeError::IoError(error) => write!(f, "io error during negotiation: {error}"),
        }
    }
}

impl std::error::Error for HandshakeError {}

impl From<io::Error> for HandshakeError {
    fn from(value: io::Error) -> Self {
        Self::IoError(value)
    }
}

/// Tokens and timings for the exchange.
#[derive(Debug, Clone)]
pub struct HandshakeConfig {
    /// Sent to the board, terminator included.
    pub probe: &'static [u8],
    /// The exact (case-sensitive) answer that means the board is ready.
    pub ack: &'static str,
    /// Wait after sending the probe before polling starts.
    pub settle: Duration,
    /// Wait between two polls that found nothing.
    pub poll_interval: Duration,
    /// How long to keep polling, counted from the end of `settle`.
    pub timeout: Duration,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            probe: b"READY?\n",
            ack: "OK",
            settle: Duration::from_secs(1),
            poll_interval: Duration::from_millis(100),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Runs the handshake over a [`LineSource`], tracking its state.
#[derive(Debug)]
pub struct Negotiator {
    config: HandshakeConfig,
    state: NegotiationState,
}

impl Negotiator {
    /// A negotiator in the [`NegotiationState::Idle`] state.
    pub fn new(config: HandshakeConfig) -> Self {
        Self {
            config,
            state: NegotiationState::Idle,
        }
    }

    /// The current state.
    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Probes the board and waits for its answer. Blocks for at most
    /// `settle + timeout` (plus one poll interval).
    pub fn negotiate(&mut self, source: &mut impl LineSource) -> Result<(), HandshakeError> {
        let result = self.exchange(source);
        self.state = match result {
            Ok(()) => NegotiationState::Confirmed,
            Err(_) => NegotiationState::Failed,
        };
        result
    }

    fn exchange(&mut self, source: &mut impl LineSource) -> Result<(), HandshakeError> {
        source.send(self.config.probe)?;
        self.state = NegotiationState::SentReady;
        debug!("Probe sent, waiting {:?} before polling", self.config.settle);
        spin_sleep::sleep(self.config.settle);

        let start = Instant::now();
        while start.elapsed() < self.config.timeout {
            match source.try_read_line()? {
                Some(line) => {
                    let response = match line.text() {
                        Ok(text) => text.to_owned(),
                        Err(_) => String::from_utf8_lossy(&line.0).into_owned(),
                    };
                    if response.is_empty() {
                        continue;
                    }
                    debug!("Board answered {response:?}");
                    if response == self.config.ack {
                        info!("Board confirmed it is ready");
                        return Ok(());
                    }
                    return Err(HandshakeError::ProtocolMismatch(response));
                }
                None => spin_sleep::sleep(self.config.poll_interval),
            }
        }

        Err(HandshakeError::Timeout(self.config.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_source::{mock::MockLink, LinkReader};
    use std::thread;

    fn quick() -> HandshakeConfig {
        HandshakeConfig {
            settle: Duration::from_millis(10),
            poll_interval: Duration::from_millis(5),
            timeout: Duration::from_millis(300),
            ..HandshakeConfig::default()
        }
    }

    #[test]
    fn default_timings() {
        let config = HandshakeConfig::default();
        assert_eq!(config.probe, b"READY?\n");
        assert_eq!(config.ack, "OK");
        assert_eq!(config.settle, Duration::from_secs(1));
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn confirms_on_ok() {
        let link = MockLink::new();
        link.inject(b"OK\r\n");
        let mut source = LinkReader::new(link.clone());

        let mut negotiator = Negotiator::new(quick());
        assert_eq!(negotiator.state(), NegotiationState::Idle);
        negotiator.negotiate(&mut source).unwrap();

        assert_eq!(negotiator.state(), NegotiationState::Confirmed);
        assert_eq!(link.written(), b"READY?\n");
    }

    /// The board takes a while to answer; that is fine as long as it is
    /// inside the deadline.
    #[test]
    fn confirms_late_answer() {
        let link = MockLink::new();
        let board = link.clone();
        let answer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(60));
            board.inject(b"OK\n");
        });

        let mut source = LinkReader::new(link);
        Negotiator::new(quick()).negotiate(&mut source).unwrap();
        answer.join().unwrap();
    }

    #[test]
    fn times_out_on_silence() {
        let mut source = LinkReader::new(MockLink::new());
        let mut negotiator = Negotiator::new(quick());

        let started = Instant::now();
        let err = negotiator.negotiate(&mut source).unwrap_err();

        assert!(matches!(err, HandshakeError::Timeout(_)));
        assert!(err.to_string().contains("timeout"));
        assert_eq!(negotiator.state(), NegotiationState::Failed);
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[test]
    fn rejects_wrong_answer() {
        let link = MockLink::new();
        link.inject(b"ERROR\n");
        let mut source = LinkReader::new(link);

        let mut negotiator = Negotiator::new(quick());
        match negotiator.negotiate(&mut source) {
            Err(HandshakeError::ProtocolMismatch(response)) => assert_eq!(response, "ERROR"),
            other => panic!("expected a mismatch, got {other:?}"),
        }
        assert_eq!(negotiator.state(), NegotiationState::Failed);
    }

    #[test]
    fn ack_is_case_sensitive() {
        let link = MockLink::new();
        link.inject(b"ok\n");
        let mut source = LinkReader::new(link);
        assert!(matches!(
            Negotiator::new(quick()).negotiate(&mut source),
            Err(HandshakeError::ProtocolMismatch(_))
        ));
    }

    #[test]
    fn skips_blank_lines() {
        let link = MockLink::new();
        link.inject(b"\r\n\nOK\n");
        let mut source = LinkReader::new(link);
        Negotiator::new(quick()).negotiate(&mut source).unwrap();
    }

    #[test]
    fn non_text_answer_is_a_mismatch() {
        let link = MockLink::new();
        link.inject(b"\xff\xff\n");
        let mut source = LinkReader::new(link);
        assert!(matches!(
            Negotiator::new(quick()).negotiate(&mut source),
            Err(HandshakeError::ProtocolMismatch(_))
        ));
    }
}
