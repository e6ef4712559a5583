//! A stand-in for the potentiometer board, so the pipeline can be run and
//! tested without hardware. Like the real firmware it stays quiet until it
//! is probed with `READY?`, answers `OK`, then prints every channel once per
//! period.

use crate::line_source::{LineSource, RawLine};
use crate::record_decoder::Sample;
use log::warn;
use rand::prelude::*;
use std::collections::VecDeque;
use std::io::{self, ErrorKind};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const PROBE: &str = "READY?";
const ACK: &str = "OK";
const ADC_MAX: Sample = 1023;

/// The simulated board. Readings are produced on a background thread and
/// buffered until read.
pub struct DummyBoard {
    handle: Option<thread::JoinHandle<()>>,
    tx: mpsc::Sender<Signal>,
    lines: Arc<Mutex<VecDeque<Vec<u8>>>>,
}

enum Signal {
    Received(Vec<u8>),
    Stop,
}

/// Configures a [`DummyBoard`] before it starts.
#[derive(Debug, Clone)]
pub struct DummyBoardBuilder {
    levels: Vec<Sample>,
    noise: Sample,
    period: Duration,
    ack_delay: Duration,
}

impl Default for DummyBoardBuilder {
    fn default() -> Self {
        Self {
            levels: vec![512; 6],
            noise: 3,
            period: Duration::from_millis(10),
            ack_delay: Duration::ZERO,
        }
    }
}

impl DummyBoardBuilder {
    /// How many potentiometers the board has. New ones start centred.
    pub fn channels(mut self, channels: usize) -> Self {
        self.levels.resize(channels, 512);
        self
    }

    /// Starting position of channel `@<index + 1>`.
    pub fn level(mut self, index: usize, level: Sample) -> Self {
        if let Some(l) = self.levels.get_mut(index) {
            *l = level;
        }
        self
    }

    /// Readings wander up to this far from the set level.
    pub fn noise(mut self, noise: Sample) -> Self {
        self.noise = noise.abs();
        self
    }

    /// Time between two rounds of readings.
    pub fn period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// How long the board takes to answer the probe.
    pub fn ack_delay(mut self, ack_delay: Duration) -> Self {
        self.ack_delay = ack_delay;
        self
    }

    /// Starts the board.
    pub fn build(self) -> DummyBoard {
        let (tx, rx) = mpsc::channel::<Signal>();
        let lines = Arc::new(Mutex::new(VecDeque::new()));
        let th_lines = Arc::clone(&lines);

        let handle = thread::spawn(move || {
            let DummyBoardBuilder {
                levels,
                noise,
                period,
                ack_delay,
            } = self;
            let mut rng = thread_rng();
            let mut ack_at = None;
            let mut streaming = false;

            loop {
                while let Ok(received) = rx.try_recv() {
                    match received {
                        Signal::Received(bytes) => {
                            let text = String::from_utf8_lossy(&bytes);
                            if !streaming && text.trim() == PROBE {
                                ack_at = Some(Instant::now() + ack_delay);
                            }
                        }
                        Signal::Stop => return,
                    }
                }

                let mut out = th_lines.lock().unwrap();
                if ack_at.is_some_and(|at| Instant::now() >= at) {
                    out.push_back(format!("{ACK}\r\n").into_bytes());
                    ack_at = None;
                    streaming = true;
                }
                if streaming {
                    out.extend(generate_round(&levels, noise, &mut rng));
                }
                drop(out);

                spin_sleep::sleep(period);
            }
        });

        DummyBoard {
            handle: Some(handle),
            tx,
            lines,
        }
    }
}

impl DummyBoard {
    /// Configure a new board.
    pub fn builder() -> DummyBoardBuilder {
        DummyBoardBuilder::default()
    }

    /// Stops the background thread. Buffered lines can still be read.
    pub fn stop(&mut self) {
        let Some(thread) = self.handle.take() else {
            return;
        };
        if self.tx.send(Signal::Stop).is_err() {
            warn!("Simulated board exited before it was told to stop");
        }
        if thread.join().is_err() {
            warn!("Simulated board thread panicked");
        }
    }
}

impl Drop for DummyBoard {
    fn drop(&mut self) {
        self.stop();
    }
}

impl LineSource for DummyBoard {
    fn try_read_line(&mut self) -> io::Result<Option<RawLine>> {
        let line = self.lines.lock().unwrap().pop_front();
        Ok(line.map(|mut bytes| {
            if bytes.last() == Some(&b'\n') {
                bytes.pop();
            }
            RawLine(bytes)
        }))
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.tx
            .send(Signal::Received(data.to_vec()))
            .map_err(|_| io::Error::from(ErrorKind::BrokenPipe))
    }
}

/// One line per channel, `@1` first, each reading clamped to the ADC range.
fn generate_round(levels: &[Sample], noise: Sample, rng: &mut impl Rng) -> Vec<Vec<u8>> {
    levels
        .iter()
        .enumerate()
        .map(|(i, &level)| {
            let value = (level + rng.gen_range(-noise..=noise)).clamp(0, ADC_MAX);
            format!("@{}/{}\r\n", i + 1, value).into_bytes()
        })
        .collect()
}
