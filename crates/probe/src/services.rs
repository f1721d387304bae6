use crate::Error;
use crate::utils::is_valid_unit_name;
use serde::Serialize;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

const STATUS_TIMEOUT: Duration = Duration::from_secs(5);
const RESTART_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Running,
    Stopped,
    Unknown,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ServiceStatus {
    pub name: String,
    pub state: ServiceState,
}

impl ServiceStatus {
    pub fn is_active(&self) -> bool {
        self.state == ServiceState::Running
    }
}

/// Ask systemd whether `name` is active. Any failure to ask is reported as
/// [`ServiceState::Unknown`].
pub async fn service_status(name: &str) -> ServiceStatus {
    let state = if !is_valid_unit_name(name) {
        warn!(name, "refusing to query invalid service name");
        ServiceState::Unknown
    } else {
        match run("systemctl", &["is-active", name], STATUS_TIMEOUT).await {
            Ok(output) => state_from_is_active(&String::from_utf8_lossy(&output.stdout)),
            Err(err) => {
                debug!(name, %err, "service status unavailable");
                ServiceState::Unknown
            }
        }
    };

    ServiceStatus {
        name: name.to_string(),
        state,
    }
}

/// Restart `name` through systemd.
pub async fn restart_service(name: &str) -> Result<(), Error> {
    if !is_valid_unit_name(name) {
        return Err(Error::InvalidServiceName(name.to_string()));
    }
    let output = run("systemctl", &["restart", name], RESTART_TIMEOUT).await?;
    if output.status.success() {
        Ok(())
    } else {
        Err(Error::CommandFailed {
            program: "systemctl",
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// Run `program` with a deadline; the child is killed when the deadline
/// passes.
pub(crate) async fn run(
    program: &'static str,
    args: &[&str],
    after: Duration,
) -> Result<Output, Error> {
    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);
    match timeout(after, command.output()).await {
        Ok(result) => result.map_err(|source| Error::SpawnFailed { program, source }),
        Err(_) => Err(Error::Timeout { program, after }),
    }
}

fn state_from_is_active(stdout: &str) -> ServiceState {
    if stdout.trim() == "active" {
        ServiceState::Running
    } else {
        ServiceState::Stopped
    }
}
