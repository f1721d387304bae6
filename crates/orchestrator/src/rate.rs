#![forbid(unsafe_code)]

use crate::domain::NetworkCounters;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Throughput per direction in KB/s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Throughput {
    pub sent: f64,
    pub received: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NetworkRates {
    pub current: Throughput,
    /// Highest rate seen since the tracker was created.
    pub peak: Throughput,
}

/// Counters as they were at a given instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSample {
    pub counters: NetworkCounters,
    pub observed_at: DateTime<Utc>,
}

/// Turns cumulative byte counters into instantaneous and peak rates.
#[derive(Debug, Default)]
pub struct RateTracker {
    baseline: Option<RateSample>,
    rates: NetworkRates,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `counters` observed at `now` and return the current rates.
    ///
    /// The first call only sets the baseline and reports zero. When the clock
    /// did not move forward the previous rates are kept.
    pub fn update(&mut self, counters: NetworkCounters, now: DateTime<Utc>) -> Throughput {
        if let Some(previous) = self.baseline {
            let elapsed = seconds_between(previous.observed_at, now);
            if elapsed > 0.0 {
                let current = Throughput {
                    sent: kb_per_sec(previous.counters.bytes_sent, counters.bytes_sent, elapsed),
                    received: kb_per_sec(
                        previous.counters.bytes_received,
                        counters.bytes_received,
                        elapsed,
                    ),
                };
                self.rates.current = current;
                self.rates.peak.sent = self.rates.peak.sent.max(current.sent);
                self.rates.peak.received = self.rates.peak.received.max(current.received);
            }
        }

        self.baseline = Some(RateSample {
            counters,
            observed_at: now,
        });
        self.rates.current
    }

    pub fn rates(&self) -> NetworkRates {
        self.rates
    }

    pub fn baseline(&self) -> Option<RateSample> {
        self.baseline
    }
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    let delta = to - from;
    delta
        .num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or_else(|| delta.num_milliseconds() as f64 / 1_000.0)
}

/// A counter that went backwards (interface reset) counts as no traffic.
fn kb_per_sec(before: u64, after: u64, seconds: f64) -> f64 {
    after.saturating_sub(before) as f64 / seconds / 1024.0
}
