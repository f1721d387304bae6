#![forbid(unsafe_code)]

use crate::domain::{HostDetails, NetworkCounters, Snapshot};
use crate::error::Error;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use config::Config;
use probe::{HostProbe, ServiceStatus};
use tracing::{debug, warn};

/// Number of monitored services shown in a status report.
pub const MAX_REPORTED_SERVICES: usize = 5;
/// Number of processes shown in a status report.
pub const TOP_PROCESSES: usize = 3;

/// Source of host measurements.
///
/// Readings the host cannot provide are reported as zero or empty rather
/// than as errors.
#[async_trait]
pub trait Platform: Send {
    async fn snapshot(&mut self, now: DateTime<Utc>) -> Snapshot;
    async fn network_counters(&mut self) -> NetworkCounters;
    async fn details(&mut self, config: &Config) -> HostDetails;
    async fn service_status(&mut self, name: &str) -> ServiceStatus;
    async fn restart_service(&mut self, name: &str) -> Result<(), Error>;
}

/// [`Platform`] backed by the local machine.
#[derive(Debug, Default)]
pub struct SystemPlatform {
    probe: HostProbe,
}

impl SystemPlatform {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Platform for SystemPlatform {
    async fn snapshot(&mut self, now: DateTime<Utc>) -> Snapshot {
        self.probe.refresh();
        let disk_percent = self
            .probe
            .root_disk()
            .map(|disk| disk.percent())
            .unwrap_or_default();
        let temperature_celsius = self.probe.temperature().unwrap_or_else(|| {
            debug!("no temperature sensor available");
            0.0
        });
        Snapshot {
            timestamp: now,
            cpu_percent: self.probe.cpu_usage(),
            memory_percent: self.probe.memory().percent(),
            disk_percent,
            temperature_celsius,
        }
    }

    async fn network_counters(&mut self) -> NetworkCounters {
        let (sent, received) = self.probe.network_totals();
        NetworkCounters::new(sent, received)
    }

    async fn details(&mut self, config: &Config) -> HostDetails {
        let (sent, received) = self.probe.network_totals();
        let mut services = Vec::new();
        for name in config.monitor_services.iter().take(MAX_REPORTED_SERVICES) {
            services.push(probe::service_status(name).await);
        }

        let containers = if config.monitor_docker {
            probe::list_containers().await.unwrap_or_else(|err| {
                warn!(%err, "failed to list containers");
                Vec::new()
            })
        } else {
            Vec::new()
        };

        HostDetails {
            cpu: Some(self.probe.cpu_info()),
            memory: self.probe.memory(),
            disk: self.probe.root_disk(),
            network_totals: NetworkCounters::new(sent, received),
            uptime: self.probe.uptime(),
            top_processes: self.probe.top_processes(TOP_PROCESSES),
            services,
            containers,
        }
    }

    async fn service_status(&mut self, name: &str) -> ServiceStatus {
        probe::service_status(name).await
    }

    async fn restart_service(&mut self, name: &str) -> Result<(), Error> {
        probe::restart_service(name).await?;
        Ok(())
    }
}
