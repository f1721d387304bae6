#![forbid(unsafe_code)]

mod color;
mod display;
mod error;
mod metric;
mod model;
mod thresholds;
mod update;

pub use color::Color;
pub use display::{ColorMode, ViewMode};
pub use error::{Error, UpdateError};
pub use metric::MetricKind;
pub use model::{Actor, Config};
pub use thresholds::Thresholds;
pub use update::{ConfigUpdate, INTERVAL_RANGE};
