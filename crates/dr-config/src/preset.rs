//! Configuration presets for common fleet profiles.
//!
//! - Default: stock thresholds
//! - Sensitive: flags smaller deviations and escalates sooner
//! - Relaxed: tolerates noisy fleets and lets stale risk fade faster

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::EngineConfig;

/// Available configuration presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    /// Stock engine behaviour
    Default,
    /// Lower anomaly and state thresholds
    Sensitive,
    /// Higher anomaly and state thresholds
    Relaxed,
}

impl PresetName {
    /// All available preset names.
    pub const ALL: &'static [PresetName] = &[
        PresetName::Default,
        PresetName::Sensitive,
        PresetName::Relaxed,
    ];

    /// Get preset name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetName::Default => "default",
            PresetName::Sensitive => "sensitive",
            PresetName::Relaxed => "relaxed",
        }
    }

    /// Parse preset name from string.
    pub fn parse(s: &str) -> Option<PresetName> {
        match s.to_lowercase().as_str() {
            "default" | "stock" => Some(PresetName::Default),
            "sensitive" | "strict" => Some(PresetName::Sensitive),
            "relaxed" | "lenient" => Some(PresetName::Relaxed),
            _ => None,
        }
    }

    /// Get a description of the preset.
    pub fn description(&self) -> &'static str {
        match self {
            PresetName::Default => "Stock thresholds: anomaly |z| > 2, warning at 0.5, critical at 0.8",
            PresetName::Sensitive => {
                "Flags |z| > 1.5 and escalates sooner; suited to small, homogeneous fleets"
            }
            PresetName::Relaxed => {
                "Flags |z| > 3 only and decays stale risk faster; suited to noisy fleets"
            }
        }
    }
}

impl fmt::Display for PresetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PresetName {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PresetName::parse(s).ok_or_else(|| PresetError::UnknownPreset(s.to_string()))
    }
}

/// Errors related to preset operations.
#[derive(Error, Debug, Clone)]
pub enum PresetError {
    #[error("Unknown preset '{0}'. Available: default, sensitive, relaxed")]
    UnknownPreset(String),
}

/// Build the configuration for a preset.
pub fn get_preset(name: PresetName) -> EngineConfig {
    let mut config = EngineConfig::default();
    match name {
        PresetName::Default => {}
        PresetName::Sensitive => {
            config.description = Some(name.description().to_string());
            config.anomaly_threshold = 1.5;
            config.smoothing.ema_alpha = 0.3;
            config.state_thresholds.warning = 0.4;
            config.state_thresholds.critical = 0.7;
            config.decay.rate_per_hour = 0.005;
        }
        PresetName::Relaxed => {
            config.description = Some(name.description().to_string());
            config.anomaly_threshold = 3.0;
            config.smoothing.ema_alpha = 0.1;
            config.state_thresholds.warning = 0.6;
            config.state_thresholds.critical = 0.9;
            config.decay.rate_per_hour = 0.02;
        }
    }
    config
}

/// List all presets with their descriptions.
pub fn list_presets() -> Vec<(PresetName, &'static str)> {
    PresetName::ALL
        .iter()
        .map(|p| (*p, p.description()))
        .collect()
}
