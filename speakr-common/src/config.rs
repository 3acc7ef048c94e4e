//! Configuration loading and API key resolution
//!
//! Bootstrap settings come from three places, highest priority first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file (`~/.config/speakr/config.toml` unless overridden)
//!
//! Anything still unset falls back to a built-in default. A missing default
//! config file is not an error; a missing file that was named explicitly is.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variables checked for the API key, in priority order
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Speech API key
    #[serde(default)]
    pub api_key: Option<String>,

    /// Speech model name
    #[serde(default)]
    pub model: Option<String>,

    /// Base URL of the speech API
    #[serde(default)]
    pub base_url: Option<String>,

    /// Directory that downloads are written to
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    /// Audio output device name (None = system default)
    #[serde(default)]
    pub device: Option<String>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Platform config file location: `<config_dir>/speakr/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("speakr").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Where the bootstrap configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// No file at the default location (path shown when known)
    Defaults(Option<PathBuf>),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults(Some(path)) => {
                write!(f, "built-in defaults (no file at {})", path.display())
            }
            ConfigSource::Defaults(None) => {
                write!(f, "built-in defaults (no config directory)")
            }
        }
    }
}

/// Load configuration, degrading gracefully when no file exists
///
/// - `explicit`: path given on the command line; must exist and parse
/// - otherwise the platform default path is tried; absence yields defaults
///
/// Runs before logging is set up, so the source is returned for the caller
/// to log instead of being logged here.
pub fn load_config(explicit: Option<&Path>) -> Result<(TomlConfig, ConfigSource)> {
    if let Some(path) = explicit {
        let config = load_toml_config(path)?;
        return Ok((config, ConfigSource::File(path.to_path_buf())));
    }

    match default_config_path() {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            Ok((config, ConfigSource::File(path)))
        }
        other => Ok((TomlConfig::default(), ConfigSource::Defaults(other))),
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve the speech API key
///
/// **Priority:** command line → `GEMINI_API_KEY` → `API_KEY` → TOML
pub fn resolve_api_key(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let mut candidates: Vec<(&str, String)> = Vec::new();

    if let Some(key) = cli_arg {
        candidates.push(("command line", key.to_string()));
    }
    for var in API_KEY_ENV_VARS {
        if let Ok(key) = std::env::var(var) {
            candidates.push((var, key));
        }
    }
    if let Some(key) = &toml_config.api_key {
        candidates.push(("TOML", key.clone()));
    }

    let valid: Vec<&(&str, String)> = candidates
        .iter()
        .filter(|(_, key)| is_valid_key(key))
        .collect();

    if valid.len() > 1 {
        let sources: Vec<&str> = valid.iter().map(|(source, _)| *source).collect();
        warn!(
            "API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    match valid.first() {
        Some((source, key)) => {
            info!("API key loaded from {}", source);
            Ok(key.trim().to_string())
        }
        None => Err(Error::Config(
            "API_KEY environment variable not set. Configure the key using one of:\n\
             1. Command line: --api-key your-key\n\
             2. Environment: GEMINI_API_KEY=your-key (or API_KEY)\n\
             3. TOML config: ~/.config/speakr/config.toml (api_key = \"your-key\")"
                .to_string(),
        )),
    }
}

/// Resolve the download directory
///
/// **Priority:** command line → TOML → current directory
pub fn resolve_output_dir(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(dir) = cli_arg {
        return dir.to_path_buf();
    }
    if let Some(dir) = &toml_config.output_dir {
        return dir.clone();
    }
    PathBuf::from(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   \t"));
    }

    #[test]
    fn test_logging_default_level() {
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    fn test_output_dir_priority() {
        let toml_config = TomlConfig {
            output_dir: Some(PathBuf::from("/tmp/from-toml")),
            ..Default::default()
        };

        assert_eq!(
            resolve_output_dir(Some(Path::new("/tmp/from-cli")), &toml_config),
            PathBuf::from("/tmp/from-cli")
        );
        assert_eq!(
            resolve_output_dir(None, &toml_config),
            PathBuf::from("/tmp/from-toml")
        );
        assert_eq!(
            resolve_output_dir(None, &TomlConfig::default()),
            PathBuf::from(".")
        );
    }
}
