#![forbid(unsafe_code)]

use crate::domain::{AlertRecord, AuditRecord, HistoryEntry};
use serde::{Deserialize, Serialize};

/// On-disk layout of the rolling store.
///
/// Unknown top-level keys are ignored on read; a missing collection reads
/// as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreDocument {
    pub history: Vec<HistoryEntry>,
    pub alerts: Vec<AlertRecord>,
    pub audit_logs: Vec<AuditRecord>,
}

impl StoreDocument {
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
