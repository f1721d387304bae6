mod containers;
mod error;
pub mod host;
mod services;
pub mod utils;

pub use containers::{Container, list_containers};
pub use error::Error;
pub use host::{CpuInfo, DiskUsage, HostProbe, MemoryUsage, ProcessUsage};
pub use services::{ServiceState, ServiceStatus, restart_service, service_status};
