#![forbid(unsafe_code)]

mod capped;
mod document;
mod repo;
mod store;

pub use capped::CappedLog;
pub use document::StoreDocument;
pub use repo::{JsonFileRepository, MemoryRepository, NoopRepository, StateRepository};
pub use store::{ALERT_CAPACITY, AUDIT_CAPACITY, HISTORY_CAPACITY, RollingStore};
