//! Wires the pipeline together: serial lines in, smoothed OSC messages out.
//!
//! ```text
//! LineSource -> Record -> Smoother -> route() -> ControlSink
//! ```

use crate::{
    error::BridgeError,
    handshake::{HandshakeConfig, Negotiator},
    line_source::LineSource,
    osc::ControlSink,
    record_decoder::Record,
    router::route,
    smoother::{normalize, Smoother},
};
use log::{debug, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};

/// One message handed to the sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Emission {
    /// The parameter address.
    pub address: &'static str,
    /// The normalized value, `0.0..=1.0` for in-range readings.
    pub value: f64,
}

/// What a single [`Bridge::step`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// No complete line was waiting.
    Idle,
    /// A line was read and handled, and possibly sent on.
    Processed(Option<Emission>),
    /// A line was read but could not be decoded, so it was dropped.
    Skipped,
}

/// Owns the link to the board, the smoothing state and the sink.
pub struct Bridge<S, K> {
    source: S,
    sink: K,
    smoother: Smoother,
    handshake: HandshakeConfig,
}

impl<S, K> Bridge<S, K>
where
    S: LineSource,
    K: ControlSink,
{
    /// Instantiates a new `Bridge` with the default handshake.
    pub fn new(source: S, sink: K, smoother: Smoother) -> Self {
        Self {
            source,
            sink,
            smoother,
            handshake: HandshakeConfig::default(),
        }
    }

    /// Replaces the handshake tokens and timings.
    pub fn with_handshake(mut self, handshake: HandshakeConfig) -> Self {
        self.handshake = handshake;
        self
    }

    /// The smoothing state, mostly for inspection.
    pub fn smoother(&self) -> &Smoother {
        &self.smoother
    }

    /// Handles at most one line. Never blocks.
    ///
    /// Malformed lines are logged and skipped; only a failing link is an
    /// error.
    pub fn step(&mut self) -> Result<Step, BridgeError> {
        let Some(line) = self.source.try_read_line()? else {
            return Ok(Step::Idle);
        };

        let record = match line.text() {
            Ok(text) => match text.parse::<Record>() {
                Ok(record) => record,
                Err(e) => {
                    warn!("Was unable to parse serial record: {e}");
                    return Ok(Step::Skipped);
                }
            },
            // Often happens right after opening the port, when there is
            // still garbage in the hardware buffer
            Err(e) => {
                warn!("Failed to decode utf-8: {e}");
                return Ok(Step::Skipped);
            }
        };

        // Only routed channels get a history, so line noise in the channel
        // token cannot grow the smoother.
        let Some(address) = route(&record.channel) else {
            trace!("No parameter for channel {}", record.channel);
            return Ok(Step::Processed(None));
        };

        let Some(smoothed) = self.smoother.observe(&record.channel, record.value) else {
            return Ok(Step::Processed(None));
        };

        let value = normalize(smoothed);
        if let Err(e) = self.sink.send(address, value as f32) {
            warn!("Failed to send {address} <- {value}: {e}");
            return Ok(Step::Processed(None));
        }
        debug!("Message sent: {address} {value}");

        Ok(Step::Processed(Some(Emission { address, value })))
    }

    /// Negotiates with the board, then processes lines until `running` is
    /// cleared. Returns the source and sink so the caller decides when they
    /// are closed.
    pub fn run(mut self, running: &AtomicBool) -> Result<(S, K), BridgeError> {
        Negotiator::new(self.handshake.clone()).negotiate(&mut self.source)?;
        info!(
            "Bridge running, smoothing over {} samples",
            self.smoother.capacity()
        );

        while running.load(Ordering::SeqCst) {
            self.step()?;
        }

        info!("Bridge : terminated.");
        Ok((self.source, self.sink))
    }
}
