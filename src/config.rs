//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$MSGVIEW_CONFIG` (environment variable)
//! 2. `~/.config/msgview/config.toml` (Linux/macOS)
//!    `%APPDATA%\msgview\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::model::limits::Limits;
use crate::parser::ParseOptions;
use crate::preview::PreviewMode;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Input size and field length caps.
    pub limits: Limits,
    /// Body preview behavior.
    pub preview: PreviewConfig,
    /// Parser diagnostics.
    pub diagnostics: DiagnosticsConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Body preview settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Mode used by `show` when `--preview` is not given.
    pub default_mode: PreviewMode,
    /// Ask before the first content preview. `--yes` overrides this.
    pub require_confirmation: bool,
}

/// Parser diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Log the underlying cause when an MSG container fails to decode.
    pub verbose_parser: bool,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            default_mode: PreviewMode::None,
            require_confirmation: true,
        }
    }
}

impl Config {
    /// Parser options derived from this configuration. Limits above the
    /// built-in caps are clamped down to them.
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            limits: self.limits.clamped(),
            verbose_diagnostics: self.diagnostics.verbose_parser,
        }
    }
}

// ── Load / paths ────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("MSGVIEW_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("msgview").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("msgview")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("msgview.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.general.log_level, "warn");
        assert_eq!(cfg.preview.default_mode, PreviewMode::None);
        assert!(cfg.preview.require_confirmation);
        assert!(!cfg.diagnostics.verbose_parser);
        assert_eq!(cfg.limits.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let mut cfg = Config::default();
        cfg.preview.default_mode = PreviewMode::SandboxedHtml;
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.preview.default_mode, PreviewMode::SandboxedHtml);
        assert_eq!(parsed.limits, cfg.limits);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[preview]
default_mode = "text"

[limits]
max_body_chars = 5000

[diagnostics]
verbose_parser = true
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.preview.default_mode, PreviewMode::PlainText);
        assert!(cfg.preview.require_confirmation);
        assert_eq!(cfg.limits.max_body_chars, 5000);
        assert_eq!(cfg.limits.max_headers, 1000);
        assert_eq!(cfg.general.log_level, "warn");

        let opts = cfg.parse_options();
        assert!(opts.verbose_diagnostics);
        assert_eq!(opts.limits.max_body_chars, 5000);
    }

    #[test]
    fn test_raised_limits_clamped_in_parse_options() {
        let cfg: Config = toml::from_str(
            "[limits]\nmax_headers = 5000\nmax_header_value_chars = 10000\nmax_file_size = 1073741824\n",
        )
        .expect("parse");
        // The file value is kept as written; only the derived options clamp
        assert_eq!(cfg.limits.max_headers, 5000);

        let opts = cfg.parse_options();
        assert_eq!(opts.limits.max_headers, 1000);
        assert_eq!(opts.limits.max_header_value_chars, 2000);
        assert_eq!(opts.limits.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn test_log_file_in_cache_dir_override() {
        let mut cfg = Config::default();
        cfg.general.cache_dir = Some(PathBuf::from("/tmp/msgview-test"));
        assert_eq!(
            log_file_path(&cfg),
            PathBuf::from("/tmp/msgview-test/msgview.log")
        );
    }
}
