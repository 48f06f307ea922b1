//! No-mock configuration validation + resolution tests.
//!
//! Covers:
//! - Engine config validation against real JSON fixtures
//! - Resolution order (CLI > env path > env config dir > XDG)
//! - Loading with fallback to built-in defaults
//! - Preset determinism

use dr_common::Metric;
use dr_config::preset::{get_preset, list_presets, PresetName};
use dr_config::resolve::{load_config, resolve_config, ConfigSource};
use dr_config::validate::{validate_config, ValidationError};
use dr_config::EngineConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const ENV_KEYS: &[&str] = &["DEVICE_RISK_CONFIG", "DEVICE_RISK_CONFIG_DIR", "XDG_CONFIG_HOME"];

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("test")
        .join("fixtures")
        .join("config")
}

fn load_fixture(name: &str) -> EngineConfig {
    EngineConfig::from_file(&fixtures_dir().join(name)).expect("read engine fixture")
}

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
            env::remove_var(key);
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f()
}

fn write_fixture(src_name: &str, dest: &Path) {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).expect("create fixture parent");
    }
    fs::copy(fixtures_dir().join(src_name), dest).expect("copy fixture");
}

#[test]
fn test_validate_engine_fixture_ok() {
    let config = load_fixture("valid_engine.json");
    validate_config(&config).expect("valid engine config should pass validation");
    assert_eq!(config.tracked_metrics.len(), 5);
    assert!(config.tracked_metrics.contains(&Metric::Temperature));
    assert_eq!(config.smoothing.holt_winters.season_length, 4);
    assert_eq!(config.history_limit, 50);
}

#[test]
fn test_validate_rejects_inverted_thresholds() {
    let config = load_fixture("invalid_engine_thresholds.json");
    let err = validate_config(&config).expect_err("inverted thresholds should fail validation");
    assert!(matches!(err, ValidationError::SemanticError(_)));
}

#[test]
fn test_validate_rejects_missing_weight() {
    let config = load_fixture("invalid_engine_weights.json");
    let err = validate_config(&config).expect_err("missing weight should fail validation");
    assert!(matches!(err, ValidationError::MissingField(ref f) if f == "risk_weights.memory_usage"));
}

#[test]
fn test_syntax_error_is_parse_error() {
    let err = EngineConfig::from_file(&fixtures_dir().join("invalid_engine_syntax.json"))
        .expect_err("truncated JSON should not parse");
    assert!(matches!(err, ValidationError::ParseError(_)));
    assert_eq!(err.code(), 61);
}

#[test]
fn test_missing_file_is_io_error() {
    let err = EngineConfig::from_file(&fixtures_dir().join("does_not_exist.json"))
        .expect_err("missing file should fail");
    assert!(matches!(err, ValidationError::IoError(_)));
}

#[test]
fn test_resolve_cli_over_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let cli_path = temp.path().join("cli").join("engine.json");
        let env_path = temp.path().join("env").join("engine.json");
        write_fixture("valid_engine.json", &cli_path);
        write_fixture("relaxed_engine.json", &env_path);

        env::set_var("DEVICE_RISK_CONFIG", env_path.display().to_string());

        let paths = resolve_config(Some(&cli_path));
        assert_eq!(paths.engine_source, ConfigSource::CliArgument);
        assert_eq!(paths.engine.unwrap(), cli_path);
    });
}

#[test]
fn test_resolve_env_path_over_config_dir() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let env_path = temp.path().join("env").join("engine.json");
        let config_dir = temp.path().join("config_dir");
        write_fixture("relaxed_engine.json", &env_path);
        write_fixture("valid_engine.json", &config_dir.join("engine.json"));

        env::set_var("DEVICE_RISK_CONFIG", env_path.display().to_string());
        env::set_var("DEVICE_RISK_CONFIG_DIR", config_dir.display().to_string());

        let paths = resolve_config(None);
        assert_eq!(paths.engine_source, ConfigSource::Environment);
        assert_eq!(paths.engine.unwrap(), env_path);
    });
}

#[test]
fn test_resolve_config_dir_over_xdg() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let config_dir = temp.path().join("config_dir");
        let xdg_home = temp.path().join("xdg");
        write_fixture("valid_engine.json", &config_dir.join("engine.json"));
        write_fixture(
            "relaxed_engine.json",
            &xdg_home.join("device-risk").join("engine.json"),
        );

        env::set_var("DEVICE_RISK_CONFIG_DIR", config_dir.display().to_string());
        env::set_var("XDG_CONFIG_HOME", xdg_home.display().to_string());

        let paths = resolve_config(None);
        assert_eq!(paths.engine_source, ConfigSource::Environment);
        assert_eq!(paths.engine.unwrap(), config_dir.join("engine.json"));
    });
}

#[test]
fn test_resolve_xdg_when_no_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let xdg_home = temp.path().join("xdg");
        let xdg_engine = xdg_home.join("device-risk").join("engine.json");
        write_fixture("relaxed_engine.json", &xdg_engine);

        env::set_var("XDG_CONFIG_HOME", xdg_home.display().to_string());

        let paths = resolve_config(None);
        assert_eq!(paths.engine_source, ConfigSource::XdgConfig);
        assert_eq!(paths.engine.unwrap(), xdg_engine);
    });
}

#[test]
fn test_load_config_applies_file_over_defaults() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("engine.json");
        write_fixture("relaxed_engine.json", &path);

        let loaded = load_config(Some(&path)).expect("load relaxed config");
        assert_eq!(loaded.source, ConfigSource::CliArgument);
        assert_eq!(loaded.config.anomaly_threshold, 3.0);
        assert_eq!(loaded.config.history_limit, 10);
        assert_eq!(loaded.config.smoothing.ema_alpha, 0.2);
    });
}

#[test]
fn test_load_config_rejects_invalid_file() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let path = fixtures_dir().join("invalid_engine_thresholds.json");
        let err = load_config(Some(&path)).expect_err("invalid config must not fall back");
        assert!(matches!(err, ValidationError::SemanticError(_)));
    });
}

#[test]
fn test_load_config_defaults_without_files() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);

        let temp = TempDir::new().expect("temp dir");
        env::set_var("XDG_CONFIG_HOME", temp.path().display().to_string());

        // Only meaningful when the host has no system-wide config installed.
        if Path::new("/etc/device-risk/engine.json").exists() {
            return;
        }
        let loaded = load_config(None).expect("defaults load");
        assert_eq!(loaded.source, ConfigSource::BuiltinDefault);
        assert!(loaded.path.is_none());
        assert_eq!(loaded.config, EngineConfig::default());
    });
}

#[test]
fn test_presets_are_deterministic_and_valid() {
    for (name, description) in list_presets() {
        let a = get_preset(name);
        let b = get_preset(name);
        assert_eq!(a, b);
        assert!(!description.is_empty());
        validate_config(&a).expect("preset validates");
    }
    assert_eq!(get_preset(PresetName::Relaxed).anomaly_threshold, 3.0);
}
