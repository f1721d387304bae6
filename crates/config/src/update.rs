#![forbid(unsafe_code)]

use crate::display::{ColorMode, ViewMode};
use crate::error::UpdateError;
use crate::metric::MetricKind;
use crate::model::Config;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Accepted sampling periods, in seconds.
pub const INTERVAL_RANGE: RangeInclusive<u64> = 10..=300;

/// A single change requested through `!config <setting> <value>`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigUpdate {
    Interval(u64),
    View(ViewMode),
    Color(ColorMode),
    Threshold(MetricKind, f64),
    Alerts(bool),
}

impl ConfigUpdate {
    /// Parse the words following `!config`. `setting` is matched
    /// case-insensitively.
    pub fn parse(setting: &str, args: &[&str]) -> Result<Self, UpdateError> {
        let setting = setting.to_ascii_lowercase();
        let Some(value) = args.first().map(|v| v.to_ascii_lowercase()) else {
            return Err(UpdateError::Usage("!config <setting> <value>"));
        };

        match setting.as_str() {
            "interval" => value
                .parse()
                .map(Self::Interval)
                .map_err(|_| UpdateError::InvalidValue(value)),
            "view" => value
                .parse()
                .map(Self::View)
                .map_err(|_| UpdateError::InvalidViewMode(value)),
            "color" => value
                .parse()
                .map(Self::Color)
                .map_err(|_| UpdateError::InvalidColorMode(value)),
            "threshold" => {
                let Some(raw) = args.get(1) else {
                    return Err(UpdateError::Usage("!config threshold <type> <value>"));
                };
                let kind = value
                    .parse()
                    .map_err(|_| UpdateError::UnknownThreshold(value.clone()))?;
                let threshold: f64 = raw
                    .parse()
                    .map_err(|_| UpdateError::InvalidValue(raw.to_string()))?;
                Ok(Self::Threshold(kind, threshold))
            }
            "alerts" => match value.as_str() {
                "on" => Ok(Self::Alerts(true)),
                "off" => Ok(Self::Alerts(false)),
                _ => Err(UpdateError::InvalidToggle(value)),
            },
            _ => Err(UpdateError::UnknownSetting(setting)),
        }
    }

    /// Confirmation shown to the user once the update is applied.
    pub fn describe(&self) -> String {
        match self {
            Self::Interval(secs) => format!("Update interval set to {secs} seconds"),
            Self::View(mode) => format!("View mode set to {mode}"),
            Self::Color(mode) => format!("Color mode set to {mode}"),
            Self::Threshold(kind, value) => format!("{kind} threshold set to {value}"),
            Self::Alerts(true) => "Alerts enabled".to_string(),
            Self::Alerts(false) => "Alerts disabled".to_string(),
        }
    }
}

impl Config {
    /// Validate and apply a change. On error the configuration is left
    /// untouched.
    pub fn apply(&mut self, update: ConfigUpdate) -> Result<(), UpdateError> {
        match update {
            ConfigUpdate::Interval(secs) => {
                if !INTERVAL_RANGE.contains(&secs) {
                    return Err(UpdateError::IntervalOutOfRange(secs));
                }
                self.update_interval = Duration::from_secs(secs);
            }
            ConfigUpdate::View(mode) => self.view_mode = mode,
            ConfigUpdate::Color(mode) => self.color_mode = mode,
            ConfigUpdate::Threshold(kind, value) => {
                if !value.is_finite() {
                    return Err(UpdateError::InvalidValue(value.to_string()));
                }
                self.thresholds.set(kind, value);
            }
            ConfigUpdate::Alerts(enabled) => self.enable_alerts = enabled,
        }
        Ok(())
    }
}
