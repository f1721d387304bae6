#![forbid(unsafe_code)]

use crate::color::Color;
use crate::display::{ColorMode, ViewMode};
use crate::error::Error;
use crate::thresholds::Thresholds;
use crate::update::INTERVAL_RANGE;
use figment::Figment;
use figment::providers::{Format, Json, Serialized};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Channel the status message is published to.
    pub channel_id: u64,

    /// Sampling period in seconds.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub update_interval: Duration,

    /// Colour used when `color_mode` is static.
    pub embed_color: Color,

    pub admin_role_ids: Vec<u64>,

    pub admin_user_ids: Vec<u64>,

    /// Channel alerts are forwarded to. Zero disables forwarding; alerts are
    /// still recorded.
    pub alert_channel_id: u64,

    pub thresholds: Thresholds,

    pub view_mode: ViewMode,

    pub color_mode: ColorMode,

    pub enable_alerts: bool,

    pub monitor_docker: bool,

    pub monitor_services: Vec<String>,

    /// Minimum time between two alerts of the same kind.
    #[serde_as(as = "serde_with::DurationSeconds")]
    pub alert_cooldown: Duration,

    /// File holding history, alerts and audit logs.
    pub state_path: PathBuf,

    /// Identity used for commands typed on the console.
    pub console_actor: Actor,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channel_id: 0,
            update_interval: Duration::from_secs(30),
            embed_color: Color::default(),
            admin_role_ids: Vec::new(),
            admin_user_ids: Vec::new(),
            alert_channel_id: 0,
            thresholds: Thresholds::default(),
            view_mode: ViewMode::default(),
            color_mode: ColorMode::default(),
            enable_alerts: true,
            monitor_docker: false,
            monitor_services: Vec::new(),
            alert_cooldown: Duration::from_secs(300),
            state_path: PathBuf::from("monitor_data.json"),
            console_actor: Actor::default(),
        }
    }
}

/// Author of a command as reported by the messaging transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Actor {
    pub id: u64,
    pub name: String,
    pub role_ids: Vec<u64>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the configuration from a JSON file, filling missing keys with
    /// defaults. An `update_interval` outside 10..=300 seconds is rejected.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if path.is_dir() {
            return Err(Error::InvalidPath(path.to_owned()));
        }
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Json::file(path))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let secs = self.update_interval.as_secs();
        if self.update_interval.subsec_nanos() != 0 || !INTERVAL_RANGE.contains(&secs) {
            return Err(Error::InvalidInterval(secs));
        }
        Ok(())
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn alert_channel(&self) -> Option<u64> {
        (self.alert_channel_id != 0).then_some(self.alert_channel_id)
    }

    pub fn is_admin(&self, actor: &Actor) -> bool {
        self.admin_user_ids.contains(&actor.id)
            || actor
                .role_ids
                .iter()
                .any(|role| self.admin_role_ids.contains(role))
    }
}
