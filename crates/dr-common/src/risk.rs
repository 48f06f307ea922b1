//! Discrete risk states and administrative actions.

use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Durable risk state of a device.
///
/// Devices start in [`RiskState::Normal`]. There is no terminal state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskState {
    #[default]
    Normal,
    Warning,
    Critical,
}

impl RiskState {
    pub const ALL: [RiskState; 3] = [RiskState::Normal, RiskState::Warning, RiskState::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskState::Normal => "normal",
            RiskState::Warning => "warning",
            RiskState::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(RiskState::Normal),
            "warning" => Ok(RiskState::Warning),
            "critical" => Ok(RiskState::Critical),
            _ => Err(Error::UnknownRiskState(s.to_string())),
        }
    }
}

/// Administrative action recorded against a device.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum AdminAction {
    /// No action taken.
    #[default]
    None,
    /// An administrator has mitigated the risk.
    Mitigated,
}

impl AdminAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminAction::None => "none",
            AdminAction::Mitigated => "mitigated",
        }
    }
}

impl std::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdminAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(AdminAction::None),
            "mitigated" => Ok(AdminAction::Mitigated),
            _ => Err(Error::UnknownAdminAction(s.to_string())),
        }
    }
}
