#![forbid(unsafe_code)]

mod records;
mod snapshot;
pub mod timestamp;

pub use config::MetricKind;
pub use records::{AlertRecord, AuditRecord, HistoryEntry, HistoryStats};
pub use snapshot::{HostDetails, NetworkCounters, Snapshot};
