//! Device records as held by a statistics store.

use dr_common::{DeviceId, Error, MetricSnapshot, MetricValues, Result, RiskState};
use serde::{Deserialize, Serialize};

use crate::state_machine::Transition;

/// One monitored device.
///
/// `metrics` is `None` when the device is registered but has never reported;
/// such a device has nothing to analyze. The risk state has no setter: it
/// only changes by applying a [`Transition`] produced by the risk state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub metrics: Option<MetricValues>,

    #[serde(default)]
    risk_state: RiskState,

    /// Snapshots, most recent first once loaded into a store.
    #[serde(default)]
    pub history: Vec<MetricSnapshot>,
}

impl Device {
    /// New device in the initial `normal` state.
    pub fn new(id: impl Into<DeviceId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            metrics: None,
            risk_state: RiskState::Normal,
            history: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_metrics(mut self, metrics: MetricValues) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_history(mut self, history: Vec<MetricSnapshot>) -> Self {
        self.history = history;
        self
    }

    pub fn risk_state(&self) -> RiskState {
        self.risk_state
    }

    /// Starting state for a device restored from a persisted record.
    pub fn with_risk_state(mut self, state: RiskState) -> Self {
        self.risk_state = state;
        self
    }

    /// Apply a transition computed from this device's current state.
    ///
    /// Returns whether the state changed.
    ///
    /// # Errors
    /// [`Error::StaleTransition`] if the device has moved on since the
    /// transition was computed.
    pub fn apply(&mut self, transition: &Transition) -> Result<bool> {
        if transition.from_state() != self.risk_state {
            return Err(Error::StaleTransition {
                device_id: self.id.to_string(),
                expected: transition.from_state().to_string(),
                actual: self.risk_state.to_string(),
            });
        }
        self.risk_state = transition.to_state();
        Ok(transition.changed())
    }

    /// Sort history most-recent-first. Equal timestamps keep their order.
    pub(crate) fn sort_history(&mut self) {
        self.history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{transition, RiskThresholds};
    use chrono::{TimeZone, Utc};
    use dr_common::{AdminAction, Metric};
    use std::collections::BTreeMap;

    fn snapshot(hour: u32, cpu: f64) -> MetricSnapshot {
        MetricSnapshot::new(
            Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            MetricValues::from_pairs([(Metric::CpuUsage, cpu)]).unwrap(),
        )
    }

    #[test]
    fn new_device_starts_normal() {
        let device = Device::new("d1");
        assert_eq!(device.risk_state(), RiskState::Normal);
        assert!(device.metrics.is_none());
    }

    #[test]
    fn risk_state_deserializes_but_defaults_to_normal() {
        let device: Device = serde_json::from_str(r#"{"id": "d1"}"#).unwrap();
        assert_eq!(device.risk_state(), RiskState::Normal);
        let device: Device =
            serde_json::from_str(r#"{"id": "d2", "risk_state": "critical"}"#).unwrap();
        assert_eq!(device.risk_state(), RiskState::Critical);
    }

    #[test]
    fn apply_moves_state() {
        let mut device = Device::new("d1");
        let thresholds = RiskThresholds::new(0.5, 0.8).unwrap();
        let factors = BTreeMap::from([("alerts".to_string(), 0.6)]);
        let t = transition(device.risk_state(), AdminAction::None, &factors, &thresholds).unwrap();
        assert!(device.apply(&t).unwrap());
        assert_eq!(device.risk_state(), RiskState::Warning);
    }

    #[test]
    fn apply_rejects_stale_transition() {
        let mut device = Device::new("d1").with_risk_state(RiskState::Critical);
        let thresholds = RiskThresholds::new(0.5, 0.8).unwrap();
        let t = transition(RiskState::Normal, AdminAction::None, &BTreeMap::new(), &thresholds)
            .unwrap();
        let err = device.apply(&t).unwrap_err();
        assert!(matches!(err, Error::StaleTransition { .. }));
        assert_eq!(device.risk_state(), RiskState::Critical);
    }

    #[test]
    fn sort_history_newest_first() {
        let mut device = Device::new("d1").with_history(vec![
            snapshot(1, 10.0),
            snapshot(3, 30.0),
            snapshot(2, 20.0),
        ]);
        device.sort_history();
        let cpus: Vec<f64> = device
            .history
            .iter()
            .map(|s| s.values.get(Metric::CpuUsage).unwrap())
            .collect();
        assert_eq!(cpus, vec![30.0, 20.0, 10.0]);
    }
}
