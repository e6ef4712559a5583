//! The `Smoother` keeps a short moving-average window per channel and
//! decides which averages are worth sending downstream.

use crate::record_decoder::{ChannelId, Sample};
use clap::ValueEnum;
use std::collections::{HashMap, VecDeque};

/// Default number of samples averaged per channel.
pub const DEFAULT_WINDOW: usize = 10;

/// Default minimum variation, in raw sensor units, needed to emit.
pub const DEFAULT_THRESHOLD: f64 = 1.2;

/// What a new average is compared against when deciding whether to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GateMode {
    /// Compare against the second-most-recent raw sample in the window.
    /// Slow drift made of sub-threshold steps never emits in this mode.
    #[default]
    Window,
    /// Compare against the last average that was actually emitted, so
    /// drift accumulates until it crosses the threshold.
    Emitted,
}

/// Per-channel state.
#[derive(Debug, Clone, Default)]
struct ChannelHistory {
    window: VecDeque<Sample>,
    observed: u64,
    last_emitted: Option<f64>,
}

/// Consumes raw samples and produces the smoothed values that should be
/// sent on. Owns the history for every channel it has seen.
#[derive(Debug, Clone)]
pub struct Smoother {
    capacity: usize,
    threshold: f64,
    gate: GateMode,
    histories: HashMap<ChannelId, ChannelHistory>,
}

impl Default for Smoother {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_THRESHOLD, GateMode::default())
    }
}

impl Smoother {
    /// Instantiates a new `Smoother`. A `capacity` of zero is treated as one.
    pub fn new(capacity: usize, threshold: f64, gate: GateMode) -> Self {
        Self {
            capacity: capacity.max(1),
            threshold,
            gate,
            histories: HashMap::new(),
        }
    }

    /// Records `sample` for `channel` and returns the new moving average if
    /// it differs enough from what it is compared against.
    ///
    /// The first sample of a channel never emits, and the second always
    /// does.
    pub fn observe(&mut self, channel: &str, sample: Sample) -> Option<f64> {
        let capacity = self.capacity;
        let history = match self.histories.get_mut(channel) {
            Some(history) => history,
            None => {
                let mut history = ChannelHistory::default();
                history.window.push_back(sample);
                history.observed = 1;
                self.histories.insert(channel.to_owned(), history);
                return None;
            }
        };

        history.window.push_back(sample);
        while history.window.len() > capacity {
            history.window.pop_front();
        }
        history.observed += 1;

        let smoothed = mean(&history.window);

        let previous = match self.gate {
            GateMode::Window => history
                .window
                .iter()
                .rev()
                .nth(1)
                .map(|&s| f64::from(s)),
            GateMode::Emitted => history.last_emitted,
        };

        let emit = match previous {
            _ if history.observed == 2 => true,
            None => true,
            Some(previous) => (smoothed - previous).abs() > self.threshold,
        };

        if emit {
            history.last_emitted = Some(smoothed);
            Some(smoothed)
        } else {
            None
        }
    }

    /// The current window for `channel`, oldest sample first.
    pub fn window(&self, channel: &str) -> Option<&VecDeque<Sample>> {
        self.histories.get(channel).map(|h| &h.window)
    }

    /// The window capacity in use.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many channels have a history.
    pub fn channel_count(&self) -> usize {
        self.histories.len()
    }
}

fn mean(window: &VecDeque<Sample>) -> f64 {
    let sum: i64 = window.iter().map(|&s| i64::from(s)).sum();
    sum as f64 / window.len() as f64
}

/// Scales a smoothed 10-bit reading to `0.0..=1.0`, rounded to two decimals.
///
/// Rounding works on the exact binary value of the scaled reading, so only
/// true ties (like 128 / 1024 = 0.125) go to the even digit. Scaling by 100
/// first would turn near-ties such as 25.6 / 1024 into false ties.
pub fn normalize(smoothed: f64) -> f64 {
    let scaled = smoothed / 1024.0;
    format!("{scaled:.2}").parse().unwrap_or(scaled)
}
