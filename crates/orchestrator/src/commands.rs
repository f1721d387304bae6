#![forbid(unsafe_code)]

use crate::domain::{AlertRecord, AuditRecord, MetricKind};
use crate::summary::HistorySummary;
use chrono::Local;
use config::Config;
use probe::ServiceStatus;
use std::fmt::Write;

/// Window used by `!history` when no valid window is given.
pub const DEFAULT_HISTORY_HOURS: u64 = 24;
/// Alerts listed by `!alerts`.
pub const RECENT_ALERTS: usize = 10;
/// Audit records listed by `!audit`.
pub const RECENT_AUDIT: usize = 15;

pub const ADMIN_ONLY: &str = "Admin only!";
pub const SERVICE_USAGE: &str = "Usage: `!service <status/restart> <service_name>`";
pub const UNKNOWN_SERVICE_ACTION: &str = "Unknown action. Use 'status' or 'restart'";
pub const RESTART_TIMEOUT: &str = "Confirmation timeout. Restart cancelled.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceAction {
    Status(String),
    Restart(String),
    /// Action or service name missing.
    Usage,
    UnknownAction(String),
}

/// A chat message the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!stats` / `!updatestats`
    Stats,
    /// `!setstats`
    Repost,
    History { hours: u64 },
    Alerts,
    Help,
    /// `!config` without arguments.
    ShowConfig,
    Config { setting: String, args: Vec<String> },
    Audit,
    Service(ServiceAction),
    /// A bare `yes`, answering a restart prompt.
    Confirm,
}

impl Command {
    /// Parse a message. Returns `None` for anything that is not a known
    /// command.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("yes") {
            return Some(Self::Confirm);
        }

        let mut words = text.split_whitespace();
        let head = words.next()?.to_ascii_lowercase();
        let rest: Vec<&str> = words.collect();

        let command = match head.as_str() {
            "!stats" | "!updatestats" => Self::Stats,
            "!setstats" => Self::Repost,
            "!history" => Self::History {
                hours: rest
                    .first()
                    .and_then(|arg| parse_hours(arg))
                    .unwrap_or(DEFAULT_HISTORY_HOURS),
            },
            "!alerts" => Self::Alerts,
            "!help" => Self::Help,
            "!config" => match rest.split_first() {
                None => Self::ShowConfig,
                Some((setting, args)) => Self::Config {
                    setting: setting.to_ascii_lowercase(),
                    args: args.iter().map(|arg| arg.to_ascii_lowercase()).collect(),
                },
            },
            "!audit" => Self::Audit,
            "!service" => Self::Service(match rest.as_slice() {
                [action, name, ..] => match action.to_ascii_lowercase().as_str() {
                    "status" => ServiceAction::Status((*name).to_string()),
                    "restart" => ServiceAction::Restart((*name).to_string()),
                    other => ServiceAction::UnknownAction(other.to_string()),
                },
                _ => ServiceAction::Usage,
            }),
            _ => return None,
        };
        Some(command)
    }

    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            Self::ShowConfig | Self::Config { .. } | Self::Audit | Self::Service(_)
        )
    }
}

/// `24`, `24h` and `24H` all mean 24 hours. Zero is rejected.
fn parse_hours(arg: &str) -> Option<u64> {
    let digits = arg
        .strip_suffix('h')
        .or_else(|| arg.strip_suffix('H'))
        .unwrap_or(arg);
    digits.parse().ok().filter(|hours| *hours > 0)
}

pub fn help_text() -> String {
    let public = [
        ("!stats / !updatestats", "Show current server statistics"),
        ("!setstats", "Reset and create new stats message"),
        ("!history [hours]", "Show historical stats (default: 24h)"),
        ("!alerts", "Show recent alerts"),
        ("!help", "Show this help message"),
    ];
    let admin = [
        ("!config", "Show current configuration"),
        ("!config interval <seconds>", "Set update interval"),
        ("!config view <detailed/compact>", "Set view mode"),
        ("!config color <dynamic/static>", "Set color mode"),
        ("!config threshold <type> <value>", "Set alert threshold"),
        ("!config alerts <on/off>", "Enable/disable alerts"),
        ("!audit", "Show audit logs"),
        ("!service status <name>", "Check service status"),
        ("!service restart <name>", "Restart a service"),
    ];

    let mut text = String::from("Public commands:\n");
    for (command, description) in public {
        let _ = writeln!(text, "  {command:<34}{description}");
    }
    text.push_str("Admin commands:\n");
    for (command, description) in admin {
        let _ = writeln!(text, "  {command:<34}{description}");
    }
    text
}

pub fn format_config(config: &Config) -> String {
    let yes_no = |flag: bool| if flag { "yes" } else { "no" };
    let mut text = String::from("Current configuration:\n");
    let _ = writeln!(text, "  Update interval: {}s", config.update_interval.as_secs());
    let _ = writeln!(text, "  View mode: {}", config.view_mode);
    let _ = writeln!(text, "  Color mode: {}", config.color_mode);
    let _ = writeln!(text, "  Alerts enabled: {}", yes_no(config.enable_alerts));
    let _ = writeln!(text, "  Docker monitoring: {}", yes_no(config.monitor_docker));
    let _ = writeln!(
        text,
        "  Alert cooldown: {}s",
        config.alert_cooldown.as_secs()
    );
    text.push_str("  Alert thresholds:\n");
    for kind in MetricKind::ALL {
        let unit = if kind == MetricKind::Temperature {
            "°C"
        } else {
            "%"
        };
        let _ = writeln!(text, "    {kind}: {}{unit}", config.thresholds.get(kind));
    }
    if !config.monitor_services.is_empty() {
        text.push_str("  Monitored services:\n");
        for service in &config.monitor_services {
            let _ = writeln!(text, "    - {service}");
        }
    }
    text
}

pub fn format_history(hours: u64, summary: Option<&HistorySummary>) -> String {
    let Some(summary) = summary else {
        return "No historical data available yet.".to_string();
    };

    let mut text = format!("Historical stats (last {hours}h):\n");
    for kind in MetricKind::ALL {
        let unit = if kind == MetricKind::Temperature {
            "°C"
        } else {
            "%"
        };
        let metric = summary.get(kind);
        let _ = writeln!(
            text,
            "  {kind}: avg {:.1}{unit}, peak {:.1}{unit}",
            metric.average, metric.peak
        );
    }
    let _ = writeln!(text, "  Data points: {} samples", summary.samples);
    let _ = writeln!(
        text,
        "  Monitoring since {}",
        summary.since.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    text
}

/// `alerts` newest first.
pub fn format_alerts(alerts: &[&AlertRecord]) -> String {
    if alerts.is_empty() {
        return "No alerts have been triggered recently.".to_string();
    }
    let mut text = String::from("Recent alerts:\n");
    for alert in alerts {
        let _ = writeln!(
            text,
            "  {} - {}: {}",
            alert.kind.as_str().to_ascii_uppercase(),
            alert.timestamp.with_timezone(&Local).format("%m/%d %H:%M"),
            alert.message
        );
    }
    text
}

/// `records` newest first.
pub fn format_audit(records: &[&AuditRecord]) -> String {
    if records.is_empty() {
        return "No audit logs available.".to_string();
    }
    let mut text = String::from("Audit logs:\n");
    for record in records {
        let _ = writeln!(
            text,
            "  [{}] {} - {}: {}",
            if record.success { "ok" } else { "failed" },
            record.timestamp.with_timezone(&Local).format("%m/%d %H:%M"),
            record.actor,
            record.command
        );
    }
    text
}

pub fn format_service_status(status: &ServiceStatus) -> String {
    let state = match status.state {
        probe::ServiceState::Running => "active",
        probe::ServiceState::Stopped => "inactive",
        probe::ServiceState::Unknown => "unknown",
    };
    format!("Service {}: {state}", status.name)
}

pub fn restart_prompt(service: &str) -> String {
    format!("Are you sure you want to restart {service}? Reply with `yes` to confirm.")
}
