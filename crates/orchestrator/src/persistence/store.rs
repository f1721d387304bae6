#![forbid(unsafe_code)]

use crate::domain::{AlertRecord, AuditRecord, HistoryEntry, Snapshot};
use crate::error::Error;
use crate::persistence::{CappedLog, StateRepository, StoreDocument};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const HISTORY_CAPACITY: usize = 1000;
pub const ALERT_CAPACITY: usize = 500;
pub const AUDIT_CAPACITY: usize = 500;

/// Borrowed view written on every append.
#[derive(Serialize)]
struct DocumentRef<'a> {
    history: &'a CappedLog<HistoryEntry>,
    alerts: &'a CappedLog<AlertRecord>,
    audit_logs: &'a CappedLog<AuditRecord>,
}

/// Capped history, alert and audit logs, written through to a repository
/// after every append.
///
/// The in-memory logs are authoritative: a failed write is logged and the
/// next append writes the whole document again.
pub struct RollingStore {
    history: CappedLog<HistoryEntry>,
    alerts: CappedLog<AlertRecord>,
    audit: CappedLog<AuditRecord>,
    repo: Box<dyn StateRepository>,
}

impl RollingStore {
    /// Create an empty store. Nothing is read from `repo`.
    pub fn empty(repo: Box<dyn StateRepository>) -> Self {
        Self::from_document(StoreDocument::default(), repo)
    }

    /// Load the store from `repo`, starting empty when the stored document
    /// is missing or unreadable.
    pub async fn open(repo: Box<dyn StateRepository>) -> Self {
        let document = match repo.load().await {
            Ok(Some(bytes)) => match StoreDocument::decode(&bytes) {
                Ok(document) => document,
                Err(err) => {
                    warn!(%err, "stored state is malformed, starting empty");
                    StoreDocument::default()
                }
            },
            Ok(None) => StoreDocument::default(),
            Err(err) => {
                warn!(%err, "failed to read stored state, starting empty");
                StoreDocument::default()
            }
        };
        Self::from_document(document, repo)
    }

    fn from_document(document: StoreDocument, repo: Box<dyn StateRepository>) -> Self {
        Self {
            history: CappedLog::from_entries(document.history, HISTORY_CAPACITY),
            alerts: CappedLog::from_entries(document.alerts, ALERT_CAPACITY),
            audit: CappedLog::from_entries(document.audit_logs, AUDIT_CAPACITY),
            repo,
        }
    }

    pub async fn append_history(&mut self, snapshot: &Snapshot) {
        self.history.push(HistoryEntry::from(snapshot));
        self.persist().await;
    }

    pub async fn append_alert(&mut self, record: AlertRecord) {
        self.alerts.push(record);
        self.persist().await;
    }

    pub async fn append_audit(&mut self, record: AuditRecord) {
        self.audit.push(record);
        self.persist().await;
    }

    /// History entries no older than `since` before `now`, oldest first.
    pub fn query_history(&self, since: Duration, now: DateTime<Utc>) -> Vec<HistoryEntry> {
        let cutoff = TimeDelta::from_std(since)
            .ok()
            .and_then(|window| now.checked_sub_signed(window));
        self.history
            .iter()
            .filter(|entry| cutoff.is_none_or(|cutoff| entry.timestamp >= cutoff))
            .copied()
            .collect()
    }

    /// The newest `count` alerts, newest first.
    pub fn recent_alerts(&self, count: usize) -> Vec<&AlertRecord> {
        self.alerts.latest(count).collect()
    }

    /// The newest `count` audit records, newest first.
    pub fn recent_audit(&self, count: usize) -> Vec<&AuditRecord> {
        self.audit.latest(count).collect()
    }

    pub fn history(&self) -> &CappedLog<HistoryEntry> {
        &self.history
    }

    pub fn alerts(&self) -> &CappedLog<AlertRecord> {
        &self.alerts
    }

    pub fn audit(&self) -> &CappedLog<AuditRecord> {
        &self.audit
    }

    /// Serialize the whole store and hand it to the repository.
    pub async fn flush(&self) -> Result<(), Error> {
        let document = DocumentRef {
            history: &self.history,
            alerts: &self.alerts,
            audit_logs: &self.audit,
        };
        let bytes = serde_json::to_vec_pretty(&document)?;
        self.repo.persist(&bytes).await
    }

    async fn persist(&self) {
        match self.flush().await {
            Ok(()) => debug!(
                history = self.history.len(),
                alerts = self.alerts.len(),
                audit = self.audit.len(),
                "store flushed"
            ),
            Err(err) => warn!(%err, "failed to persist store, keeping in-memory state"),
        }
    }
}

impl std::fmt::Debug for RollingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RollingStore")
            .field("history", &self.history.len())
            .field("alerts", &self.alerts.len())
            .field("audit", &self.audit.len())
            .finish()
    }
}
