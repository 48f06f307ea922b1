//! Risk state machine.
//!
//! Transitions, with `composite` the unweighted sum of external factors:
//!
//! | from     | condition                                   | to       |
//! |----------|---------------------------------------------|----------|
//! | normal   | `composite >= warning`                      | warning  |
//! | warning  | `composite >= critical` and action `none`   | critical |
//! | warning  | `composite < warning`                       | normal   |
//! | critical | action `mitigated`                          | warning  |
//!
//! Anything else leaves the state unchanged. There is no direct
//! critical → normal edge and no terminal state.

use std::collections::BTreeMap;

use dr_common::{AdminAction, Error, Result, RiskState};
use dr_config::StateThresholds;
use dr_math::MathError;
use serde::Serialize;
use tracing::info;

use crate::device::Device;

/// Validated transition thresholds (`warning <= critical`, both finite).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskThresholds {
    warning: f64,
    critical: f64,
}

impl RiskThresholds {
    pub fn new(warning: f64, critical: f64) -> Result<Self> {
        if !warning.is_finite() || !critical.is_finite() || warning > critical {
            return Err(Error::InvalidThresholds { warning, critical });
        }
        Ok(Self { warning, critical })
    }

    pub fn warning(&self) -> f64 {
        self.warning
    }

    pub fn critical(&self) -> f64 {
        self.critical
    }
}

impl TryFrom<&StateThresholds> for RiskThresholds {
    type Error = Error;

    fn try_from(config: &StateThresholds) -> Result<Self> {
        Self::new(config.warning, config.critical)
    }
}

/// Outcome of one state machine step.
///
/// Only the state machine constructs transitions; a device accepts one
/// through [`Device::apply`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    from: RiskState,
    to: RiskState,
    composite: f64,
    admin_action: AdminAction,
}

impl Transition {
    pub fn from_state(&self) -> RiskState {
        self.from
    }

    pub fn to_state(&self) -> RiskState {
        self.to
    }

    /// Unweighted sum of the external factors that drove the step.
    pub fn composite(&self) -> f64 {
        self.composite
    }

    pub fn admin_action(&self) -> AdminAction {
        self.admin_action
    }

    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

fn next_state(
    current: RiskState,
    admin_action: AdminAction,
    composite: f64,
    thresholds: &RiskThresholds,
) -> RiskState {
    match current {
        RiskState::Normal if composite >= thresholds.warning => RiskState::Warning,
        RiskState::Warning
            if composite >= thresholds.critical && admin_action == AdminAction::None =>
        {
            RiskState::Critical
        }
        RiskState::Warning if composite < thresholds.warning => RiskState::Normal,
        RiskState::Critical if admin_action == AdminAction::Mitigated => RiskState::Warning,
        unchanged => unchanged,
    }
}

/// Compute the next risk state.
///
/// # Errors
/// An analytics error if any factor is not finite.
pub fn transition(
    current: RiskState,
    admin_action: AdminAction,
    external_factors: &BTreeMap<String, f64>,
    thresholds: &RiskThresholds,
) -> Result<Transition> {
    if let Some((key, value)) = external_factors.iter().find(|(_, v)| !v.is_finite()) {
        return Err(MathError::OutOfRange {
            key: key.clone(),
            value: *value,
            expected: "finite risk factor",
        }
        .into());
    }
    let composite: f64 = external_factors.values().sum();
    Ok(Transition {
        from: current,
        to: next_state(current, admin_action, composite, thresholds),
        composite,
        admin_action,
    })
}

/// State machine bound to a set of thresholds.
#[derive(Debug, Clone, Copy)]
pub struct RiskStateMachine {
    thresholds: RiskThresholds,
}

impl RiskStateMachine {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RiskThresholds {
        &self.thresholds
    }

    pub fn transition(
        &self,
        current: RiskState,
        admin_action: AdminAction,
        external_factors: &BTreeMap<String, f64>,
    ) -> Result<Transition> {
        transition(current, admin_action, external_factors, &self.thresholds)
    }

    /// Step a device and record the new state on it.
    pub fn advance(
        &self,
        device: &mut Device,
        admin_action: AdminAction,
        external_factors: &BTreeMap<String, f64>,
    ) -> Result<Transition> {
        let step = self.transition(device.risk_state(), admin_action, external_factors)?;
        if device.apply(&step)? {
            info!(
                device_id = %device.id,
                from = %step.from,
                to = %step.to,
                composite = step.composite,
                "risk state changed"
            );
        }
        Ok(step)
    }
}
