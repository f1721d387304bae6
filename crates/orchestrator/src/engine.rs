#![forbid(unsafe_code)]

use crate::clock::Clock;
use crate::commands::{self, Command, ServiceAction};
use crate::domain::{AlertRecord, AuditRecord};
use crate::evaluator::ThresholdEvaluator;
use crate::persistence::RollingStore;
use crate::platform::Platform;
use crate::rate::{NetworkRates, RateTracker};
use crate::summary::{HistorySummary, status_color};
use crate::transport::{StatusReport, StatusTarget, Transport};
use config::{Actor, Config, ConfigUpdate, INTERVAL_RANGE, UpdateError};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Period of the threshold check, independent of the sampling interval.
pub const ALERT_PERIOD: Duration = Duration::from_secs(60);
/// How long a restart prompt waits for its `yes`.
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Services {
    pub platform: Box<dyn Platform>,
    pub transport: Box<dyn Transport>,
    pub clock: Box<dyn Clock>,
}

#[derive(Debug)]
pub enum ControlEvent {
    /// A chat message from `actor`. Replies go to `reply`.
    Command {
        actor: Actor,
        text: String,
        reply: mpsc::UnboundedSender<String>,
    },
    /// Replace the configuration.
    Reload(Box<Config>),
    /// Log the configuration and store sizes.
    DumpState,
}

struct PendingRestart {
    actor_id: u64,
    service: String,
    deadline: Instant,
    reply: mpsc::UnboundedSender<String>,
}

pub struct MonitorEngine {
    config: Config,
    config_path: Option<PathBuf>,
    services: Services,
    store: RollingStore,
    evaluator: ThresholdEvaluator,
    rates: RateTracker,
    pending: Option<PendingRestart>,
}

impl MonitorEngine {
    /// An out-of-range `update_interval` is clamped into 10..=300 seconds.
    pub fn new(mut config: Config, services: Services, store: RollingStore) -> Self {
        if let Err(err) = config.validate() {
            config.update_interval = bounded_interval(config.update_interval);
            warn!(%err, interval = config.update_interval.as_secs(), "clamped update interval");
        }
        Self {
            config,
            config_path: None,
            services,
            store,
            evaluator: ThresholdEvaluator::new(),
            rates: RateTracker::new(),
            pending: None,
        }
    }

    /// Write the configuration back to `path` after every accepted change.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Take a snapshot, record it and publish a status report.
    pub async fn sample(&mut self, target: StatusTarget) -> StatusReport {
        let now = self.services.clock.now();
        let snapshot = self.services.platform.snapshot(now).await;
        self.store.append_history(&snapshot).await;

        let counters = self.services.platform.network_counters().await;
        self.rates.update(counters, now);
        let details = self.services.platform.details(&self.config).await;

        let report = StatusReport {
            snapshot,
            rates: self.rates.rates(),
            details,
            view_mode: self.config.view_mode,
            color: status_color(&self.config, &snapshot),
            update_interval: self.config.update_interval,
        };
        debug!(
            cpu = snapshot.cpu_percent,
            memory = snapshot.memory_percent,
            disk = snapshot.disk_percent,
            temperature = snapshot.temperature_celsius,
            "sampled"
        );

        if let Err(err) = self.services.transport.publish_status(&report, target).await {
            warn!(%err, "failed to publish status");
        }
        report
    }

    /// Take a fresh snapshot and raise the alerts it triggers.
    pub async fn check_alerts(&mut self) -> Vec<AlertRecord> {
        let now = self.services.clock.now();
        let snapshot = self.services.platform.snapshot(now).await;
        let alerts = self
            .evaluator
            .evaluate(&snapshot, &self.config, &mut self.store)
            .await;

        if let Some(channel) = self.config.alert_channel() {
            for alert in &alerts {
                if let Err(err) = self.services.transport.notify(channel, alert).await {
                    warn!(%err, channel, kind = %alert.kind, "failed to deliver alert");
                }
            }
        }
        alerts
    }

    /// Drive both timers and the control channel until `cancel` fires.
    pub async fn run_until(
        &mut self,
        cancel: CancellationToken,
        mut control_rx: mpsc::UnboundedReceiver<ControlEvent>,
    ) {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = self.services.transport.ready() => {}
        }
        info!(
            interval = self.config.update_interval.as_secs(),
            "monitor started"
        );

        let mut sample_timer = interval(self.config.update_interval);
        sample_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut alert_timer = interval(ALERT_PERIOD);
        alert_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let confirmation = self.pending.as_ref().map(|pending| pending.deadline);
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("shutdown requested");
                    break;
                }
                _ = sample_timer.tick() => {
                    self.sample(StatusTarget::Existing).await;
                }
                _ = alert_timer.tick() => {
                    self.check_alerts().await;
                }
                Some(event) = control_rx.recv() => {
                    let previous = self.config.update_interval;
                    self.handle_control(event).await;
                    let current = self.config.update_interval;
                    if current != previous {
                        sample_timer = interval_at(Instant::now() + current, current);
                        sample_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        info!(interval = current.as_secs(), "sampling rescheduled");
                    }
                }
                _ = sleep_until(confirmation.unwrap_or_else(Instant::now)), if confirmation.is_some() => {
                    self.expire_confirmation();
                }
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &RollingStore {
        &self.store
    }

    pub fn rates(&self) -> NetworkRates {
        self.rates.rates()
    }

    async fn handle_control(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::Command { actor, text, reply } => {
                self.handle_command(actor, &text, reply).await;
            }
            ControlEvent::Reload(config) => {
                self.apply_reload(*config);
                info!("config reloaded");
            }
            ControlEvent::DumpState => {
                info!(
                    config = ?self.config,
                    history = self.store.history().len(),
                    alerts = self.store.alerts().len(),
                    audit = self.store.audit().len(),
                    rates = ?self.rates.rates(),
                    pending_restart = self.pending.is_some(),
                    "state dump"
                );
            }
        }
    }

    /// Run one chat command on behalf of `actor`.
    pub async fn handle_command(
        &mut self,
        actor: Actor,
        text: &str,
        reply: mpsc::UnboundedSender<String>,
    ) {
        let Some(command) = Command::parse(text) else {
            return;
        };
        debug!(actor = actor.id, ?command, "command received");

        if command == Command::Confirm {
            self.confirm_restart(&actor).await;
            return;
        }
        if command.requires_admin() && !self.config.is_admin(&actor) {
            let _ = reply.send(commands::ADMIN_ONLY.to_string());
            return;
        }

        match command {
            Command::Stats => {
                self.sample(StatusTarget::Existing).await;
            }
            Command::Repost => {
                self.sample(StatusTarget::Fresh).await;
            }
            Command::History { hours } => {
                let since = Duration::from_secs(hours.saturating_mul(3600));
                let entries = self.store.query_history(since, self.services.clock.now());
                let summary = HistorySummary::from_entries(&entries);
                let _ = reply.send(commands::format_history(hours, summary.as_ref()));
            }
            Command::Alerts => {
                let alerts = self.store.recent_alerts(commands::RECENT_ALERTS);
                let _ = reply.send(commands::format_alerts(&alerts));
            }
            Command::Help => {
                let _ = reply.send(commands::help_text());
            }
            Command::ShowConfig => {
                let _ = reply.send(commands::format_config(&self.config));
            }
            Command::Config { setting, args } => {
                let message = self.update_config(&actor, &setting, &args).await;
                let _ = reply.send(message);
            }
            Command::Audit => {
                let records = self.store.recent_audit(commands::RECENT_AUDIT);
                let _ = reply.send(commands::format_audit(&records));
            }
            Command::Service(action) => self.handle_service(&actor, action, reply).await,
            Command::Confirm => {}
        }
    }

    async fn update_config(&mut self, actor: &Actor, setting: &str, args: &[String]) -> String {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let result = ConfigUpdate::parse(setting, &args).and_then(|update| {
            self.config.apply(update)?;
            Ok(update)
        });

        if let Err(err @ UpdateError::Usage(_)) = &result {
            return err.to_string();
        }

        let success = result.is_ok();
        self.audit(actor, format!("config {setting} {}", args.join(" ")), success)
            .await;

        match result {
            Ok(update) => {
                info!(?update, actor = actor.id, "config updated");
                self.save_config();
                update.describe()
            }
            Err(err) => {
                debug!(%err, setting, "config update rejected");
                err.to_string()
            }
        }
    }

    async fn handle_service(
        &mut self,
        actor: &Actor,
        action: ServiceAction,
        reply: mpsc::UnboundedSender<String>,
    ) {
        match action {
            ServiceAction::Status(name) => {
                let status = self.services.platform.service_status(&name).await;
                self.audit(actor, format!("service status {name}"), true)
                    .await;
                let _ = reply.send(commands::format_service_status(&status));
            }
            ServiceAction::Restart(name) => {
                let _ = reply.send(commands::restart_prompt(&name));
                if let Some(previous) = self.pending.take() {
                    debug!(service = previous.service, "superseded pending restart");
                }
                self.pending = Some(PendingRestart {
                    actor_id: actor.id,
                    service: name,
                    deadline: Instant::now() + CONFIRMATION_TIMEOUT,
                    reply,
                });
            }
            ServiceAction::Usage => {
                let _ = reply.send(commands::SERVICE_USAGE.to_string());
            }
            ServiceAction::UnknownAction(_) => {
                let _ = reply.send(commands::UNKNOWN_SERVICE_ACTION.to_string());
            }
        }
    }

    async fn confirm_restart(&mut self, actor: &Actor) {
        let Some(pending) = self.pending.take_if(|pending| pending.actor_id == actor.id) else {
            return;
        };
        if Instant::now() >= pending.deadline {
            let _ = pending.reply.send(commands::RESTART_TIMEOUT.to_string());
            return;
        }

        let service = pending.service;
        let result = self.services.platform.restart_service(&service).await;
        self.audit(actor, format!("service restart {service}"), result.is_ok())
            .await;
        let message = match result {
            Ok(()) => {
                info!(service, actor = actor.id, "service restarted");
                format!("Service {service} restarted successfully")
            }
            Err(err) => {
                warn!(%err, service, "service restart failed");
                format!("Failed to restart service: {err}")
            }
        };
        let _ = pending.reply.send(message);
    }

    fn expire_confirmation(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(service = pending.service, "restart confirmation expired");
            let _ = pending.reply.send(commands::RESTART_TIMEOUT.to_string());
        }
    }

    async fn audit(&mut self, actor: &Actor, command: String, success: bool) {
        let record = AuditRecord {
            timestamp: self.services.clock.now(),
            actor: display_name(actor),
            command,
            success,
        };
        self.store.append_audit(record).await;
    }

    fn save_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(err) = self.config.save(path) {
            warn!(%err, path = %path.display(), "failed to save config");
        }
    }

    fn apply_reload(&mut self, mut config: Config) {
        if config.state_path != self.config.state_path {
            warn!(
                current = ?self.config.state_path,
                requested = ?config.state_path,
                "ignoring state_path change during reload"
            );
            config.state_path = self.config.state_path.clone();
        }
        if let Err(err) = config.validate() {
            warn!(%err, "keeping the current update interval");
            config.update_interval = self.config.update_interval;
        }
        self.config = config;
    }
}

fn bounded_interval(interval: Duration) -> Duration {
    let secs = interval
        .as_secs()
        .clamp(*INTERVAL_RANGE.start(), *INTERVAL_RANGE.end());
    Duration::from_secs(secs)
}

fn display_name(actor: &Actor) -> String {
    if actor.name.is_empty() {
        actor.id.to_string()
    } else {
        actor.name.clone()
    }
}
