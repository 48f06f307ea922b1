//! Device Risk engine configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for `engine.json`
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation
//! - Named presets

pub mod engine;
pub mod preset;
pub mod resolve;
pub mod validate;

pub use engine::{
    DecayConfig, EngineConfig, HoltWintersConfig, SigmoidConfig, SmoothingConfig,
    StateThresholds,
};
pub use preset::{get_preset, PresetName};
pub use resolve::{load_config, resolve_config, ConfigPaths, ConfigSource, LoadedConfig};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Schema version for configuration files.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0.0";
