//! Fuzz target for engine.json configuration parsing.
//!
//! Parsing and validation must return errors, never panic.

#![no_main]

use dr_config::{validate_config, EngineConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(config) = EngineConfig::parse_json(json) {
            let _ = validate_config(&config);
        }
    }
});
