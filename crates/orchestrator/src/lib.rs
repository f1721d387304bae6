#![forbid(unsafe_code)]

pub mod clock;
pub mod commands;
pub mod domain;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod persistence;
pub mod platform;
pub mod rate;
pub mod summary;
pub mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::Command;
pub use engine::{ControlEvent, MonitorEngine, Services};
pub use error::Error;
pub use evaluator::ThresholdEvaluator;
pub use persistence::{
    JsonFileRepository, MemoryRepository, NoopRepository, RollingStore, StateRepository,
};
pub use platform::{Platform, SystemPlatform};
pub use rate::{NetworkRates, RateTracker, Throughput};
pub use transport::{StatusReport, StatusTarget, Transport};
