//! Fuzz target for risk state transitions.
//!
//! Checks the structural rules hold for arbitrary factors and thresholds:
//! normal never jumps to critical, and critical only moves on mitigation.

#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use dr_common::{AdminAction, RiskState};
use dr_core::{transition, RiskThresholds};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    state: u8,
    mitigated: bool,
    warning: f64,
    critical: f64,
    factors: Vec<(String, f64)>,
}

fuzz_target!(|input: Input| {
    let Ok(thresholds) = RiskThresholds::new(input.warning, input.critical) else {
        return;
    };
    let current = match input.state % 3 {
        0 => RiskState::Normal,
        1 => RiskState::Warning,
        _ => RiskState::Critical,
    };
    let action = if input.mitigated {
        AdminAction::Mitigated
    } else {
        AdminAction::None
    };
    let factors: BTreeMap<String, f64> = input.factors.into_iter().collect();

    let Ok(step) = transition(current, action, &factors, &thresholds) else {
        return;
    };
    if current == RiskState::Normal {
        assert_ne!(step.to_state(), RiskState::Critical);
    }
    if current == RiskState::Critical && action == AdminAction::None {
        assert_eq!(step.to_state(), RiskState::Critical);
    }
});
