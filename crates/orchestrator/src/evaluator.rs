#![forbid(unsafe_code)]

use crate::domain::{AlertRecord, MetricKind, Snapshot};
use crate::persistence::RollingStore;
use chrono::{DateTime, TimeDelta, Utc};
use config::Config;
use std::collections::HashMap;
use tracing::{debug, info};

/// Decides which thresholds a snapshot crosses, with a per-kind cooldown.
#[derive(Debug, Default)]
pub struct ThresholdEvaluator {
    last_fired: HashMap<MetricKind, DateTime<Utc>>,
}

impl ThresholdEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alerts raised by `snapshot`, in `cpu, memory, disk, temperature`
    /// order. Firing a kind restarts its cooldown at `snapshot.timestamp`.
    pub fn check(&mut self, snapshot: &Snapshot, config: &Config) -> Vec<AlertRecord> {
        if !config.enable_alerts {
            return Vec::new();
        }

        let cooldown = TimeDelta::from_std(config.alert_cooldown).unwrap_or(TimeDelta::MAX);
        let now = snapshot.timestamp;
        let mut alerts = Vec::new();

        for kind in MetricKind::ALL {
            let value = snapshot.value(kind);
            let threshold = config.thresholds.get(kind);
            if value <= threshold {
                continue;
            }
            if let Some(last) = self.last_fired.get(&kind)
                && now.signed_duration_since(*last) < cooldown
            {
                debug!(%kind, value, threshold, "alert suppressed by cooldown");
                continue;
            }

            self.last_fired.insert(kind, now);
            alerts.push(AlertRecord::exceeded(kind, snapshot));
        }

        alerts
    }

    /// [`Self::check`], then record every raised alert in `store`.
    pub async fn evaluate(
        &mut self,
        snapshot: &Snapshot,
        config: &Config,
        store: &mut RollingStore,
    ) -> Vec<AlertRecord> {
        let alerts = self.check(snapshot, config);
        for alert in &alerts {
            info!(kind = %alert.kind, value = alert.value, "{}", alert.message);
            store.append_alert(alert.clone()).await;
        }
        alerts
    }

    /// When `kind` last fired, if ever.
    pub fn last_fired(&self, kind: MetricKind) -> Option<DateTime<Utc>> {
        self.last_fired.get(&kind).copied()
    }
}
