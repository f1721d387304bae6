#![forbid(unsafe_code)]

use chrono::{DateTime, Utc};
use config::MetricKind;
use probe::{Container, CpuInfo, DiskUsage, MemoryUsage, ProcessUsage, ServiceStatus};
use serde::Serialize;
use std::time::Duration;

/// One point-in-time measurement of the thresholded metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    /// Zero when no sensor reports a temperature.
    pub temperature_celsius: f64,
}

impl Snapshot {
    /// A snapshot with every reading at zero.
    pub fn zeroed(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            cpu_percent: 0.0,
            memory_percent: 0.0,
            disk_percent: 0.0,
            temperature_celsius: 0.0,
        }
    }

    pub fn value(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Cpu => self.cpu_percent,
            MetricKind::Memory => self.memory_percent,
            MetricKind::Disk => self.disk_percent,
            MetricKind::Temperature => self.temperature_celsius,
        }
    }
}

/// Cumulative bytes moved over all interfaces since boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NetworkCounters {
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl NetworkCounters {
    pub fn new(bytes_sent: u64, bytes_received: u64) -> Self {
        Self {
            bytes_sent,
            bytes_received,
        }
    }
}

/// Display-only information gathered alongside a snapshot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HostDetails {
    pub cpu: Option<CpuInfo>,
    pub memory: MemoryUsage,
    pub disk: Option<DiskUsage>,
    pub network_totals: NetworkCounters,
    pub uptime: Duration,
    pub top_processes: Vec<ProcessUsage>,
    pub services: Vec<ServiceStatus>,
    pub containers: Vec<Container>,
}
