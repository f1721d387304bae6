#![forbid(unsafe_code)]

use crate::metric::MetricKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    /// CPU usage in percent.
    pub cpu: f64,
    /// Memory usage in percent.
    pub memory: f64,
    /// Usage of the root filesystem in percent.
    pub disk: f64,
    /// CPU temperature in degrees Celsius.
    pub temperature: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu: 80.0,
            memory: 85.0,
            disk: 90.0,
            temperature: 75.0,
        }
    }
}

impl Thresholds {
    pub fn get(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Cpu => self.cpu,
            MetricKind::Memory => self.memory,
            MetricKind::Disk => self.disk,
            MetricKind::Temperature => self.temperature,
        }
    }

    pub fn set(&mut self, kind: MetricKind, value: f64) {
        let slot = match kind {
            MetricKind::Cpu => &mut self.cpu,
            MetricKind::Memory => &mut self.memory,
            MetricKind::Disk => &mut self.disk,
            MetricKind::Temperature => &mut self.temperature,
        };
        *slot = value;
    }
}
