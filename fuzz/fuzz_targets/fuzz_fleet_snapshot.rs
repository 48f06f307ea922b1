//! Fuzz target for fleet snapshot parsing and analysis.
//!
//! Any snapshot that parses must be analyzable without panicking.

#![no_main]

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use dr_common::AdminAction;
use dr_config::EngineConfig;
use dr_core::{FleetSnapshot, InMemoryStore, RiskAssessor, ZScoreEngine};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(snapshot) = FleetSnapshot::parse_json(json) else {
        return;
    };
    let Ok(store) = InMemoryStore::from_snapshot(snapshot) else {
        return;
    };

    let config = EngineConfig::default();
    let engine = ZScoreEngine::new(&store, &config);
    let _ = engine.anomalies();
    let _ = engine.metric_rankings();

    let Some(now) = Utc.timestamp_opt(1_717_243_200, 0).single() else {
        return;
    };
    if let Ok(assessor) = RiskAssessor::new(&store, &config) {
        let _ = assessor.assess_fleet(AdminAction::None, &BTreeMap::new(), now);
    }
});
