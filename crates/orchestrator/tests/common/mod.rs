#![forbid(unsafe_code)]
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use config::Config;
use orchestrator::domain::{AlertRecord, HostDetails, NetworkCounters, Snapshot};
use orchestrator::{
    Error, ManualClock, MemoryRepository, MonitorEngine, Platform, RollingStore, Services,
    StatusReport, StatusTarget, Transport,
};
use parking_lot::Mutex;
use probe::{ServiceState, ServiceStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Readings {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
    pub temperature: f64,
}

#[derive(Debug, Default)]
struct PlatformState {
    readings: Mutex<Readings>,
    counters: Mutex<NetworkCounters>,
    snapshots: AtomicUsize,
    restarts: Mutex<Vec<String>>,
    restart_fails: AtomicBool,
}

/// Platform returning whatever readings the test set last.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPlatform {
    state: Arc<PlatformState>,
}

impl ScriptedPlatform {
    pub fn set_readings(&self, readings: Readings) {
        *self.state.readings.lock() = readings;
    }

    pub fn set_counters(&self, counters: NetworkCounters) {
        *self.state.counters.lock() = counters;
    }

    pub fn fail_restarts(&self) {
        self.state.restart_fails.store(true, Ordering::SeqCst);
    }

    pub fn snapshots(&self) -> usize {
        self.state.snapshots.load(Ordering::SeqCst)
    }

    pub fn restarts(&self) -> Vec<String> {
        self.state.restarts.lock().clone()
    }
}

#[async_trait]
impl Platform for ScriptedPlatform {
    async fn snapshot(&mut self, now: DateTime<Utc>) -> Snapshot {
        self.state.snapshots.fetch_add(1, Ordering::SeqCst);
        let readings = *self.state.readings.lock();
        Snapshot {
            timestamp: now,
            cpu_percent: readings.cpu,
            memory_percent: readings.memory,
            disk_percent: readings.disk,
            temperature_celsius: readings.temperature,
        }
    }

    async fn network_counters(&mut self) -> NetworkCounters {
        *self.state.counters.lock()
    }

    async fn details(&mut self, _config: &Config) -> HostDetails {
        HostDetails::default()
    }

    async fn service_status(&mut self, name: &str) -> ServiceStatus {
        ServiceStatus {
            name: name.to_string(),
            state: ServiceState::Running,
        }
    }

    async fn restart_service(&mut self, name: &str) -> Result<(), Error> {
        self.state.restarts.lock().push(name.to_string());
        if self.state.restart_fails.load(Ordering::SeqCst) {
            return Err(Error::Probe(probe::Error::InvalidServiceName(
                name.to_string(),
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct TransportState {
    published: Mutex<Vec<(StatusTarget, StatusReport)>>,
    notified: Mutex<Vec<(u64, AlertRecord)>>,
}

/// Transport that keeps everything it is asked to deliver.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    state: Arc<TransportState>,
}

impl RecordingTransport {
    pub fn published(&self) -> Vec<(StatusTarget, StatusReport)> {
        self.state.published.lock().clone()
    }

    pub fn publish_count(&self) -> usize {
        self.state.published.lock().len()
    }

    pub fn notified(&self) -> Vec<(u64, AlertRecord)> {
        self.state.notified.lock().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn ready(&self) {}

    async fn publish_status(
        &self,
        report: &StatusReport,
        target: StatusTarget,
    ) -> Result<(), Error> {
        self.state.published.lock().push((target, report.clone()));
        Ok(())
    }

    async fn notify(&self, channel_id: u64, alert: &AlertRecord) -> Result<(), Error> {
        self.state.notified.lock().push((channel_id, alert.clone()));
        Ok(())
    }
}

pub struct Harness {
    pub platform: ScriptedPlatform,
    pub transport: RecordingTransport,
    pub clock: Arc<ManualClock>,
    pub repo: MemoryRepository,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            platform: ScriptedPlatform::default(),
            transport: RecordingTransport::default(),
            clock: Arc::new(ManualClock::new(start())),
            repo: MemoryRepository::new(),
        }
    }

    pub fn engine(&self, config: Config) -> MonitorEngine {
        let services = Services {
            platform: Box::new(self.platform.clone()),
            transport: Box::new(self.transport.clone()),
            clock: Box::new(self.clock.clone()),
        };
        let store = RollingStore::empty(Box::new(self.repo.clone()));
        MonitorEngine::new(config, services, store)
    }
}

/// Configuration where actor 1 is an admin.
pub fn admin_config() -> Config {
    Config {
        admin_user_ids: vec![1],
        ..Config::default()
    }
}

pub fn admin() -> config::Actor {
    config::Actor {
        id: 1,
        name: "alice".into(),
        role_ids: Vec::new(),
    }
}

pub fn guest() -> config::Actor {
    config::Actor {
        id: 2,
        name: "bob".into(),
        role_ids: Vec::new(),
    }
}
