#![forbid(unsafe_code)]

use crate::domain::{Snapshot, timestamp};
use chrono::{DateTime, Utc};
use config::MetricKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: MetricKind,
    pub message: String,
    pub value: f64,
}

impl AlertRecord {
    /// Build the alert raised for `kind` by `snapshot`.
    pub fn exceeded(kind: MetricKind, snapshot: &Snapshot) -> Self {
        let value = snapshot.value(kind);
        let message = match kind {
            MetricKind::Cpu => format!("CPU usage is high: {value:.1}%"),
            MetricKind::Memory => format!("Memory usage is high: {value:.1}%"),
            MetricKind::Disk => format!("Disk usage is high: {value:.1}%"),
            MetricKind::Temperature => format!("CPU temperature is high: {value:.1}°C"),
        };
        Self {
            timestamp: snapshot.timestamp,
            kind,
            message,
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "user")]
    pub actor: String,
    pub command: String,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub stats: HistoryStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HistoryStats {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub temperature: f64,
}

impl From<&Snapshot> for HistoryEntry {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            stats: HistoryStats {
                cpu: snapshot.cpu_percent,
                memory: snapshot.memory_percent,
                disk: snapshot.disk_percent,
                temperature: snapshot.temperature_celsius,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn alert_uses_wire_field_names() {
        let snapshot = Snapshot {
            temperature_celsius: 81.34,
            ..Snapshot::zeroed(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        };
        let alert = AlertRecord::exceeded(MetricKind::Temperature, &snapshot);
        assert_eq!(alert.message, "CPU temperature is high: 81.3°C");

        let json = serde_json::to_value(&alert).unwrap();
        assert_eq!(json["type"], "temperature");
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00.000000Z");
        assert_eq!(json["value"], 81.34);
    }

    #[test]
    fn history_entry_reads_legacy_layout() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{"timestamp": "2024-05-01T12:00:00.5", "stats": {"cpu": 12.5, "memory": 40, "disk": 70.1, "temperature": 0}}"#,
        )
        .unwrap();
        assert_eq!(entry.stats.cpu, 12.5);
        assert_eq!(entry.stats.memory, 40.0);
    }
}
