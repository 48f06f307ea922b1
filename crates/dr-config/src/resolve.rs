//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI argument → environment variables → XDG paths →
//! system path → built-in defaults.

use std::path::{Path, PathBuf};

use crate::engine::EngineConfig;
use crate::validate::{validate_config, ValidationResult};

/// Discovered configuration file path.
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// Path to engine.json (or None if not found).
    pub engine: Option<PathBuf>,

    /// Source of the engine config (for diagnostics).
    pub engine_source: ConfigSource,
}

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/device-risk/.
    SystemConfig,

    /// Named built-in preset.
    Preset,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ConfigSource::CliArgument => "CLI argument",
            ConfigSource::Environment => "environment variable",
            ConfigSource::XdgConfig => "XDG config",
            ConfigSource::SystemConfig => "system config",
            ConfigSource::Preset => "preset",
            ConfigSource::BuiltinDefault => "builtin default",
        };
        f.write_str(label)
    }
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "DEVICE_RISK_CONFIG";
pub const ENV_CONFIG_DIR: &str = "DEVICE_RISK_CONFIG_DIR";

/// Standard config file name.
pub const ENGINE_FILENAME: &str = "engine.json";

/// Application name for XDG directories.
const APP_NAME: &str = "device-risk";

/// Candidate locations for `engine.json`, highest precedence first.
fn candidates(cli_path: Option<&Path>) -> Vec<(PathBuf, ConfigSource)> {
    let mut out = Vec::new();
    if let Some(path) = cli_path {
        out.push((path.to_path_buf(), ConfigSource::CliArgument));
    }
    if let Some(path) = std::env::var_os(ENV_CONFIG_PATH) {
        out.push((PathBuf::from(path), ConfigSource::Environment));
    }
    if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR) {
        out.push((PathBuf::from(dir).join(ENGINE_FILENAME), ConfigSource::Environment));
    }
    if let Some(dir) = xdg_config_dir() {
        out.push((dir.join(ENGINE_FILENAME), ConfigSource::XdgConfig));
    }
    out.push((system_config_dir().join(ENGINE_FILENAME), ConfigSource::SystemConfig));
    out
}

/// Resolve the engine configuration path.
///
/// The first existing file wins, in this order:
/// 1. explicit CLI path
/// 2. `DEVICE_RISK_CONFIG`
/// 3. `DEVICE_RISK_CONFIG_DIR/engine.json`
/// 4. `~/.config/device-risk/engine.json`
/// 5. `/etc/device-risk/engine.json`
///
/// With none present, `engine` is `None` and the source is
/// [`ConfigSource::BuiltinDefault`].
pub fn resolve_config(cli_path: Option<&Path>) -> ConfigPaths {
    candidates(cli_path)
        .into_iter()
        .find(|(path, _)| path.is_file())
        .map(|(path, source)| ConfigPaths {
            engine: Some(path),
            engine_source: source,
        })
        .unwrap_or_default()
}

/// A validated configuration together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: EngineConfig,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Resolve, parse, and validate the engine configuration.
///
/// Falls back to [`EngineConfig::default`] when no file is found. A file
/// that exists but fails to parse or validate is an error, never a silent
/// fallback.
pub fn load_config(cli_path: Option<&Path>) -> ValidationResult<LoadedConfig> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(crate::validate::ValidationError::IoError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
    }

    let paths = resolve_config(cli_path);
    let config = match &paths.engine {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    validate_config(&config)?;

    Ok(LoadedConfig {
        config,
        path: paths.engine,
        source: paths.engine_source,
    })
}

/// Get the XDG config directory for device-risk.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Get the system config directory.
pub fn system_config_dir() -> PathBuf {
    PathBuf::from("/etc").join(APP_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::CliArgument), "CLI argument");
        assert_eq!(
            format!("{}", ConfigSource::Environment),
            "environment variable"
        );
        assert_eq!(format!("{}", ConfigSource::XdgConfig), "XDG config");
        assert_eq!(format!("{}", ConfigSource::SystemConfig), "system config");
        assert_eq!(format!("{}", ConfigSource::Preset), "preset");
        assert_eq!(
            format!("{}", ConfigSource::BuiltinDefault),
            "builtin default"
        );
    }

    #[test]
    fn test_xdg_config_dir() {
        if let Some(path) = xdg_config_dir() {
            assert!(path.ends_with(APP_NAME));
        }
    }

    #[test]
    fn test_system_config_dir() {
        assert_eq!(system_config_dir(), PathBuf::from("/etc/device-risk"));
    }

    #[test]
    fn missing_cli_path_is_error() {
        let err = load_config(Some(Path::new("/nonexistent/device-risk/engine.json"))).unwrap_err();
        assert!(matches!(err, crate::validate::ValidationError::IoError(_)));
    }
}
