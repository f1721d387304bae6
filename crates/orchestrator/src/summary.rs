#![forbid(unsafe_code)]

use crate::domain::{HistoryEntry, HistoryStats, MetricKind, Snapshot};
use chrono::{DateTime, Utc};
use config::{Color, ColorMode, Config};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MetricSummary {
    pub average: f64,
    pub peak: f64,
}

/// Aggregate of the samples returned by a history query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub samples: usize,
    /// Timestamp of the oldest sample.
    pub since: DateTime<Utc>,
    pub cpu: MetricSummary,
    pub memory: MetricSummary,
    pub disk: MetricSummary,
    pub temperature: MetricSummary,
}

impl HistorySummary {
    /// `None` for an empty slice.
    pub fn from_entries(entries: &[HistoryEntry]) -> Option<Self> {
        let first = entries.first()?;
        let summarize = |field: fn(&HistoryStats) -> f64| {
            let (sum, peak) = entries.iter().map(|entry| field(&entry.stats)).fold(
                (0.0, f64::NEG_INFINITY),
                |(sum, peak), value| (sum + value, peak.max(value)),
            );
            MetricSummary {
                average: sum / entries.len() as f64,
                peak,
            }
        };

        Some(Self {
            samples: entries.len(),
            since: first.timestamp,
            cpu: summarize(|stats| stats.cpu),
            memory: summarize(|stats| stats.memory),
            disk: summarize(|stats| stats.disk),
            temperature: summarize(|stats| stats.temperature),
        })
    }

    pub fn get(&self, kind: MetricKind) -> MetricSummary {
        match kind {
            MetricKind::Cpu => self.cpu,
            MetricKind::Memory => self.memory,
            MetricKind::Disk => self.disk,
            MetricKind::Temperature => self.temperature,
        }
    }
}

/// Colour hint for a status report. In dynamic mode it follows the busiest
/// of cpu, memory and disk.
pub fn status_color(config: &Config, snapshot: &Snapshot) -> Color {
    match config.color_mode {
        ColorMode::Static => config.embed_color,
        ColorMode::Dynamic => {
            let load = snapshot
                .cpu_percent
                .max(snapshot.memory_percent)
                .max(snapshot.disk_percent);
            if load >= 90.0 {
                Color::RED
            } else if load >= 75.0 {
                Color::ORANGE
            } else if load >= 50.0 {
                Color::YELLOW
            } else {
                Color::GREEN
            }
        }
    }
}
