//! Multi-step risk state scenarios driven through a device record.

use std::collections::BTreeMap;

use dr_common::{AdminAction, Error, RiskState};
use dr_config::{get_preset, PresetName, StateThresholds};
use dr_core::{transition, Device, RiskStateMachine, RiskThresholds};

fn factors(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn machine() -> RiskStateMachine {
    RiskStateMachine::new(RiskThresholds::try_from(&StateThresholds::default()).unwrap())
}

#[test]
fn escalation_then_mitigation_then_recovery() {
    let machine = machine();
    let mut device = Device::new("kiosk-3");

    let steps = [
        (AdminAction::None, 0.3, RiskState::Normal),
        (AdminAction::None, 0.55, RiskState::Warning),
        (AdminAction::None, 0.85, RiskState::Critical),
        // Critical ignores the score until someone mitigates.
        (AdminAction::None, 0.0, RiskState::Critical),
        (AdminAction::Mitigated, 0.95, RiskState::Warning),
        (AdminAction::None, 0.2, RiskState::Normal),
    ];
    for (i, (action, score, expected)) in steps.into_iter().enumerate() {
        let step = machine
            .advance(&mut device, action, &factors(&[("score", score)]))
            .unwrap();
        assert_eq!(step.to_state(), expected, "step {i}");
        assert_eq!(device.risk_state(), expected, "step {i}");
    }
}

#[test]
fn mitigated_warning_does_not_escalate() {
    let machine = machine();
    let mut device = Device::new("d").with_risk_state(RiskState::Warning);
    let step = machine
        .advance(&mut device, AdminAction::Mitigated, &factors(&[("a", 0.9)]))
        .unwrap();
    assert!(!step.changed());
    assert_eq!(device.risk_state(), RiskState::Warning);
}

#[test]
fn factors_sum_without_weights() {
    let machine = machine();
    let mut device = Device::new("d");
    let step = machine
        .advance(
            &mut device,
            AdminAction::None,
            &factors(&[("open_cves", 0.25), ("failed_logins", 0.15), ("av_stale", 0.1)]),
        )
        .unwrap();
    assert!((step.composite() - 0.5).abs() < 1e-12);
    assert_eq!(device.risk_state(), RiskState::Warning);
}

#[test]
fn stale_transition_is_refused() {
    let thresholds = RiskThresholds::new(0.5, 0.8).unwrap();
    let computed = transition(
        RiskState::Normal,
        AdminAction::None,
        &factors(&[("a", 0.6)]),
        &thresholds,
    )
    .unwrap();

    let mut device = Device::new("d").with_risk_state(RiskState::Critical);
    let err = device.apply(&computed).unwrap_err();
    assert!(matches!(err, Error::StaleTransition { .. }));
    assert_eq!(device.risk_state(), RiskState::Critical);
}

#[test]
fn preset_thresholds_shift_the_boundaries() {
    let sensitive = get_preset(PresetName::Sensitive);
    let relaxed = get_preset(PresetName::Relaxed);
    let input = factors(&[("a", 0.45)]);

    let sensitive = RiskStateMachine::new(
        RiskThresholds::try_from(&sensitive.state_thresholds).unwrap(),
    );
    let relaxed =
        RiskStateMachine::new(RiskThresholds::try_from(&relaxed.state_thresholds).unwrap());

    assert_eq!(
        sensitive
            .transition(RiskState::Normal, AdminAction::None, &input)
            .unwrap()
            .to_state(),
        RiskState::Warning
    );
    assert_eq!(
        relaxed
            .transition(RiskState::Normal, AdminAction::None, &input)
            .unwrap()
            .to_state(),
        RiskState::Normal
    );
}
