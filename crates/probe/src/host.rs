use crate::utils::{percent, select_root_disk};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use sysinfo::{
    Components, Disks, MINIMUM_CPU_UPDATE_INTERVAL, Networks, ProcessesToUpdate, System,
};
use tracing::debug;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CpuInfo {
    pub model: String,
    pub physical_cores: usize,
    pub logical_cores: usize,
    /// Current frequency of the first core in MHz, `None` when unknown.
    pub frequency_mhz: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct MemoryUsage {
    pub used: u64,
    pub total: u64,
    pub swap_used: u64,
    pub swap_total: u64,
}

impl MemoryUsage {
    pub fn percent(&self) -> f64 {
        percent(self.used, self.total)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DiskUsage {
    pub mount_point: PathBuf,
    pub total: u64,
    pub available: u64,
}

impl DiskUsage {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }

    pub fn percent(&self) -> f64 {
        percent(self.used(), self.total)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProcessUsage {
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f64,
}

/// Long-lived handle on the host's counters.
///
/// CPU usage is computed by sysinfo from the difference between two
/// refreshes, so the probe has to be kept around between samples.
/// [`HostProbe::refresh`] waits until [`MINIMUM_CPU_UPDATE_INTERVAL`] has
/// passed since the previous CPU refresh.
pub struct HostProbe {
    system: System,
    cpu_refreshed_at: Instant,
    disks: Disks,
    networks: Networks,
    components: Components,
}

impl std::fmt::Debug for HostProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostProbe")
            .field("disks", &self.disks.list().len())
            .field("networks", &self.networks.len())
            .field("components", &self.components.len())
            .finish()
    }
}

impl Default for HostProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        system.refresh_memory();
        Self {
            system,
            cpu_refreshed_at: Instant::now(),
            disks: Disks::new_with_refreshed_list(),
            networks: Networks::new_with_refreshed_list(),
            components: Components::new_with_refreshed_list(),
        }
    }

    /// Refresh the counters used by a snapshot: cpu, memory, disks,
    /// networks and sensors.
    pub fn refresh(&mut self) {
        let elapsed = self.cpu_refreshed_at.elapsed();
        if let Some(wait) = MINIMUM_CPU_UPDATE_INTERVAL.checked_sub(elapsed) {
            std::thread::sleep(wait);
        }
        self.system.refresh_cpu_all();
        self.cpu_refreshed_at = Instant::now();
        self.system.refresh_memory();
        self.disks.refresh(true);
        self.networks.refresh(true);
        self.components.refresh(true);
        debug!(probe = ?self, "host counters refreshed");
    }

    /// Global CPU usage in percent since the previous refresh.
    pub fn cpu_usage(&self) -> f64 {
        f64::from(self.system.global_cpu_usage())
    }

    pub fn memory(&self) -> MemoryUsage {
        MemoryUsage {
            used: self.system.used_memory(),
            total: self.system.total_memory(),
            swap_used: self.system.used_swap(),
            swap_total: self.system.total_swap(),
        }
    }

    pub fn disks(&self) -> Vec<DiskUsage> {
        self.disks
            .list()
            .iter()
            .filter(|disk| disk.total_space() > 0)
            .map(|disk| DiskUsage {
                mount_point: disk.mount_point().to_owned(),
                total: disk.total_space(),
                available: disk.available_space(),
            })
            .collect()
    }

    /// Usage of the root filesystem, `None` when no disk is visible.
    pub fn root_disk(&self) -> Option<DiskUsage> {
        select_root_disk(&self.disks()).cloned()
    }

    /// Temperature of the first sensor that reports one.
    pub fn temperature(&self) -> Option<f64> {
        self.components
            .iter()
            .filter_map(|component| component.temperature())
            .find(|temp| temp.is_finite())
            .map(f64::from)
    }

    /// Cumulative bytes `(sent, received)` over every non-loopback
    /// interface.
    pub fn network_totals(&self) -> (u64, u64) {
        self.networks
            .iter()
            .filter(|(name, _)| name.as_str() != "lo")
            .fold((0, 0), |(sent, received), (_, data)| {
                (
                    sent.saturating_add(data.total_transmitted()),
                    received.saturating_add(data.total_received()),
                )
            })
    }

    pub fn cpu_info(&self) -> CpuInfo {
        let cpus = self.system.cpus();
        let logical_cores = cpus.len();
        let model = cpus
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .unwrap_or_else(|| format!("{} Processor", System::cpu_arch()));
        CpuInfo {
            model,
            physical_cores: System::physical_core_count().unwrap_or((logical_cores / 2).max(1)),
            logical_cores,
            frequency_mhz: cpus
                .first()
                .map(|cpu| cpu.frequency())
                .filter(|mhz| *mhz > 0),
        }
    }

    /// The `count` processes using the most CPU, busiest first.
    pub fn top_processes(&mut self, count: usize) -> Vec<ProcessUsage> {
        self.system.refresh_processes(ProcessesToUpdate::All, true);
        let total_memory = self.system.total_memory();
        let mut processes: Vec<ProcessUsage> = self
            .system
            .processes()
            .values()
            .map(|process| ProcessUsage {
                name: process.name().to_string_lossy().into_owned(),
                cpu_percent: process.cpu_usage(),
                memory_percent: percent(process.memory(), total_memory),
            })
            .collect();
        processes.sort_by(|a, b| b.cpu_percent.total_cmp(&a.cpu_percent));
        processes.truncate(count);
        processes
    }

    pub fn uptime(&self) -> Duration {
        Duration::from_secs(System::uptime())
    }
}
