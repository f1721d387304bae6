#![forbid(unsafe_code)]

use crate::domain::{AlertRecord, HostDetails, Snapshot};
use crate::error::Error;
use crate::rate::NetworkRates;
use async_trait::async_trait;
use config::{Color, ViewMode};
use serde::Serialize;
use std::time::Duration;

/// Where a status report should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusTarget {
    /// Replace the current status message, creating it if needed.
    Existing,
    /// Drop the current status message and post a new one.
    Fresh,
}

/// Everything needed to render one status message.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub snapshot: Snapshot,
    pub rates: NetworkRates,
    pub details: HostDetails,
    pub view_mode: ViewMode,
    pub color: Color,
    pub update_interval: Duration,
}

/// Outbound side of the messaging platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolves once the transport can deliver messages.
    async fn ready(&self);
    async fn publish_status(&self, report: &StatusReport, target: StatusTarget)
    -> Result<(), Error>;
    async fn notify(&self, channel_id: u64, alert: &AlertRecord) -> Result<(), Error>;
}
