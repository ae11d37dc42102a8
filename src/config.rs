//! Configuration management for memon.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use memon::analysis::{DEFAULT_INIT_PID, DEFAULT_TOP_N};
use memon::process::{SourceKind, SourceSettings, DEFAULT_PROC_ROOT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const DEFAULT_NAME_WIDTH: usize = 40;

/// Narrowest name column that still fits a truncation marker.
pub const MIN_NAME_WIDTH: usize = 8;

/// Config files tried in order when no `--config` is given.
pub const DEFAULT_CONFIG_PATHS: [&str; 6] = [
    "/etc/memon/memon.yaml",
    "/etc/memon/memon.toml",
    "./memon.yaml",
    "./memon.yml",
    "./memon.toml",
    "./memon.json",
];

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("{0}")]
    Invalid(String),
}

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Output
    #[serde(alias = "no-color")]
    pub no_color: Option<bool>,
    #[serde(alias = "name-width")]
    pub name_width: Option<usize>,
    #[serde(alias = "top-n")]
    pub top_n: Option<usize>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    // Process source
    pub source: Option<SourceKind>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "snapshot-file")]
    pub snapshot_file: Option<PathBuf>,
    #[serde(alias = "max-processes")]
    pub max_processes: Option<usize>,

    // Analysis
    #[serde(alias = "init-pid")]
    pub init_pid: Option<u32>,
    /// Seconds between watch iterations; unset runs once
    #[serde(alias = "watch-interval")]
    pub watch_interval: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            no_color: Some(false),
            name_width: Some(DEFAULT_NAME_WIDTH),
            top_n: Some(DEFAULT_TOP_N),
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
            source: Some(SourceKind::Auto),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            snapshot_file: None,
            max_processes: None,
            init_pid: Some(DEFAULT_INIT_PID),
            watch_interval: None,
        }
    }
}

impl Config {
    /// Settings for opening the configured process source.
    pub fn source_settings(&self) -> SourceSettings {
        SourceSettings {
            proc_root: self
                .proc_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT)),
            max_processes: self.max_processes,
            snapshot_file: self.snapshot_file.clone(),
        }
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source.unwrap_or_default()
    }

    /// Configured log level; unknown names fall back to the default.
    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(LogLevel::Warn)
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.watch_interval == Some(0) {
        return Err(ConfigError::Invalid(
            "Watch interval must be greater than 0".into(),
        ));
    }

    if cfg.source == Some(SourceKind::Snapshot) && cfg.snapshot_file.is_none() {
        return Err(ConfigError::Invalid(
            "source is set to snapshot, but no snapshot_file defined".into(),
        ));
    }

    if let Some(width) = cfg.name_width {
        if width < MIN_NAME_WIDTH {
            return Err(ConfigError::Invalid(format!(
                "name_width must be at least {}, got {}",
                MIN_NAME_WIDTH, width
            )));
        }
    }

    if cfg.top_n == Some(0) {
        return Err(ConfigError::Invalid("top_n must be greater than 0".into()));
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if LogLevel::parse(level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
                level
            )));
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if args.no_color {
        config.no_color = Some(true);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    // Negative intervals collapse to 0 so validation rejects them
    if let Some(seconds) = args.watch {
        config.watch_interval = Some(u64::try_from(seconds).unwrap_or(0));
    }

    if let Some(source) = args.source {
        config.source = Some(source);
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(file) = &args.snapshot_file {
        config.snapshot_file = Some(file.clone());
    }
    if args.max_processes.is_some() {
        config.max_processes = args.max_processes;
    }
    if args.init_pid.is_some() {
        config.init_pid = args.init_pid;
    }
    if args.name_width.is_some() {
        config.name_width = args.name_width;
    }
    if args.top_n.is_some() {
        config.top_n = args.top_n;
    }

    Ok(config)
}

/// Loads the config file at `path`, or the first existing default location.
///
/// Missing fields keep their defaults. Without any config file the defaults
/// are returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound(p.to_path_buf()));
            }
            p.to_path_buf()
        }
        None => match DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(p) => p.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;

    let loaded: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.clone(),
            source,
        })?,
        Some("toml") => toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.clone(),
            source,
        })?,
        _ => {
            // Default to YAML
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.clone(),
                source,
            })?
        }
    };
    info!("Loaded configuration from: {}", path.display());

    Ok(merge_defaults(loaded))
}

/// Fills unset fields from `Config::default()`.
fn merge_defaults(loaded: Config) -> Config {
    let defaults = Config::default();
    Config {
        no_color: loaded.no_color.or(defaults.no_color),
        name_width: loaded.name_width.or(defaults.name_width),
        top_n: loaded.top_n.or(defaults.top_n),
        log_level: loaded.log_level.or(defaults.log_level),
        source: loaded.source.or(defaults.source),
        proc_root: loaded.proc_root.or(defaults.proc_root),
        snapshot_file: loaded.snapshot_file.or(defaults.snapshot_file),
        max_processes: loaded.max_processes.or(defaults.max_processes),
        init_pid: loaded.init_pid.or(defaults.init_pid),
        watch_interval: loaded.watch_interval.or(defaults.watch_interval),
    }
}

/// Serializes a config in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String, ConfigError> {
    match format {
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))
        }
        ConfigFormat::Toml => {
            toml::to_string_pretty(config).map_err(|e| ConfigError::Serialize(e.to_string()))
        }
        ConfigFormat::Yaml => {
            serde_yaml::to_string(config).map_err(|e| ConfigError::Serialize(e.to_string()))
        }
    }
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), ConfigError> {
    let output = render_config(config, format)?;
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    // -------------------------------------------------------------------------
    // Tests for validate_effective_config
    // -------------------------------------------------------------------------

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_effective_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_watch_interval_rejected() {
        let cfg = Config {
            watch_interval: Some(0),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_snapshot_source_needs_file() {
        let cfg = Config {
            source: Some(SourceKind::Snapshot),
            ..Config::default()
        };
        assert!(validate_effective_config(&cfg).is_err());

        let cfg = Config {
            snapshot_file: Some(PathBuf::from("procs.json")),
            ..cfg
        };
        assert!(validate_effective_config(&cfg).is_ok());
    }

    #[test]
    fn test_name_width_top_n_and_log_level_rejected() {
        let narrow = Config {
            name_width: Some(3),
            ..Config::default()
        };
        let no_top = Config {
            top_n: Some(0),
            ..Config::default()
        };
        let loud = Config {
            log_level: Some("loud".into()),
            ..Config::default()
        };
        assert!(validate_effective_config(&narrow).is_err());
        assert!(validate_effective_config(&no_top).is_err());
        assert!(validate_effective_config(&loud).is_err());
    }

    // -------------------------------------------------------------------------
    // Tests for resolve_config
    // -------------------------------------------------------------------------

    #[test]
    fn test_cli_overrides_defaults() {
        let args = parse(&[
            "memon",
            "--no-config",
            "--no-color",
            "--top-n",
            "5",
            "--init-pid",
            "0",
            "-t",
            "2",
            "app",
        ]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.no_color, Some(true));
        assert_eq!(cfg.top_n, Some(5));
        assert_eq!(cfg.init_pid, Some(0));
        assert_eq!(cfg.watch_interval, Some(2));
    }

    #[test]
    fn test_negative_watch_becomes_invalid() {
        let args = parse(&["memon", "--no-config", "-t", "-1", "app"]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.watch_interval, Some(0));
        assert!(validate_effective_config(&cfg).is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("memon.yaml");
        fs::write(&path, "top_n: 7\nname-width: 20\nsource: ps\n").unwrap();

        let path_str = path.to_str().unwrap();
        let args = parse(&["memon", "-c", path_str, "--top-n", "4", "app"]);
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.top_n, Some(4));
        assert_eq!(cfg.name_width, Some(20));
        assert_eq!(cfg.source, Some(SourceKind::Ps));
        // unset in file, filled from defaults
        assert_eq!(cfg.init_pid, Some(DEFAULT_INIT_PID));
    }

    // -------------------------------------------------------------------------
    // Tests for load_config
    // -------------------------------------------------------------------------

    #[test]
    fn test_load_json_and_toml() {
        let tmp = tempfile::tempdir().unwrap();

        let json = tmp.path().join("memon.json");
        fs::write(&json, r#"{"init_pid": 0, "no_color": true}"#).unwrap();
        let cfg = load_config(Some(&json)).unwrap();
        assert_eq!(cfg.init_pid, Some(0));
        assert_eq!(cfg.no_color, Some(true));

        let toml_path = tmp.path().join("memon.toml");
        fs::write(&toml_path, "watch_interval = 3\nlog_level = \"debug\"\n").unwrap();
        let cfg = load_config(Some(&toml_path)).unwrap();
        assert_eq!(cfg.watch_interval, Some(3));
        assert_eq!(cfg.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("nope.yaml");
        assert!(matches!(
            load_config(Some(&missing)),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("broken.yaml");
        fs::write(&path, "top_n: [unclosed").unwrap();
        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn test_render_config_round_trips_yaml() {
        let cfg = Config::default();
        let yaml = render_config(&cfg, ConfigFormat::Yaml).unwrap();
        let back: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, cfg);
    }
}
