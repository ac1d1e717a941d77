//! Configuration management for sockmap.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::cli::{Args, ConfigFormat};
use crate::report::OutputFormat;

// Default configuration constants
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_INTERVAL_SECS: i64 = 5;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Configuration file locations tried when no path is given.
const DEFAULT_CONFIG_PATHS: [&str; 4] = [
    "/etc/sockmap/sockmap.yaml",
    "./sockmap.yaml",
    "./sockmap.json",
    "./sockmap.toml",
];

/// Effective configuration. Every field is optional so files may set any subset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(alias = "output-format")]
    pub output_format: Option<OutputFormat>,
    /// Seconds between cycles; 0 runs one cycle.
    #[serde(alias = "interval-secs", alias = "interval")]
    pub interval_secs: Option<i64>,
    pub verbose: Option<bool>,

    // Logging
    #[serde(alias = "log-level")]
    pub log_level: Option<String>,

    // Scanning
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    /// Build the inode -> process index once per cycle.
    #[serde(alias = "cache-inodes")]
    pub cache_inodes: Option<bool>,
    #[serde(alias = "include-names")]
    pub include_names: Option<Vec<String>>,
    #[serde(alias = "exclude-names")]
    pub exclude_names: Option<Vec<String>>,
    /// Caps the memory and process scans. Socket owner resolution always
    /// walks every process.
    #[serde(alias = "max-processes")]
    pub max_processes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_format: Some(OutputFormat::Json),
            interval_secs: Some(DEFAULT_INTERVAL_SECS),
            verbose: Some(false),
            log_level: Some(DEFAULT_LOG_LEVEL.into()),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            cache_inodes: Some(true),
            include_names: None,
            exclude_names: None,
            max_processes: None,
        }
    }
}

/// Rejected configuration values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid interval {0}: must be zero or positive")]
    NegativeInterval(i64),

    #[error("Invalid log_level '{0}', expected one of off/error/warn/info/debug/trace")]
    InvalidLogLevel(String),

    #[error("proc_root must not be empty")]
    EmptyProcRoot,

    #[error("max_processes must be greater than zero")]
    ZeroMaxProcesses,
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(secs) = cfg.interval_secs {
        if secs < 0 {
            return Err(ConfigError::NegativeInterval(secs));
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(level.to_string()));
        }
    }

    if cfg
        .proc_root
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(ConfigError::EmptyProcRoot);
    }

    if cfg.max_processes == Some(0) {
        return Err(ConfigError::ZeroMaxProcesses);
    }

    Ok(())
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if args.table {
        config.output_format = Some(OutputFormat::Table);
    } else if args.json {
        config.output_format = Some(OutputFormat::Json);
    }
    if let Some(secs) = args.interval {
        config.interval_secs = Some(secs);
    }
    if args.verbose {
        config.verbose = Some(true);
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }
    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if args.no_inode_cache {
        config.cache_inodes = Some(false);
    }
    if let Some(include) = &args.include_names {
        config.include_names = Some(split_names(include));
    }
    if let Some(exclude) = &args.exclude_names {
        config.exclude_names = Some(split_names(exclude));
    }
    if args.max_processes.is_some() {
        config.max_processes = args.max_processes;
    }

    Ok(config)
}

/// Enhanced configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let parsed: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON config {}", path.display()))?,
        Some("toml") => toml::from_str(&content)
            .with_context(|| format!("Invalid TOML config {}", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid YAML config {}", path.display()))?,
    };
    info!("Loaded configuration from: {}", path.display());

    Ok(merge_with_defaults(parsed))
}

/// Fills fields the file left out with defaults.
fn merge_with_defaults(file: Config) -> Config {
    let defaults = Config::default();
    Config {
        output_format: file.output_format.or(defaults.output_format),
        interval_secs: file.interval_secs.or(defaults.interval_secs),
        verbose: file.verbose.or(defaults.verbose),
        log_level: file.log_level.or(defaults.log_level),
        proc_root: file.proc_root.or(defaults.proc_root),
        cache_inodes: file.cache_inodes.or(defaults.cache_inodes),
        include_names: file.include_names.or(defaults.include_names),
        exclude_names: file.exclude_names.or(defaults.exclude_names),
        max_processes: file.max_processes.or(defaults.max_processes),
    }
}

/// Renders configuration in requested format
pub fn render_config(config: &Config, format: ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Scanner inputs derived from a validated [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanSettings {
    pub proc_root: PathBuf,
    pub cache_inodes: bool,
    pub include_names: Vec<String>,
    pub exclude_names: Vec<String>,
    pub max_processes: Option<usize>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            cache_inodes: true,
            include_names: Vec::new(),
            exclude_names: Vec::new(),
            max_processes: None,
        }
    }
}

impl ScanSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            proc_root: cfg
                .proc_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT)),
            cache_inodes: cfg.cache_inodes.unwrap_or(true),
            include_names: cfg.include_names.clone().unwrap_or_default(),
            exclude_names: cfg.exclude_names.clone().unwrap_or_default(),
            max_processes: cfg.max_processes,
        }
    }

    pub fn has_name_filters(&self) -> bool {
        !self.include_names.is_empty() || !self.exclude_names.is_empty()
    }
}

/// Loop inputs derived from a validated [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub format: OutputFormat,
    /// Zero means a single pass.
    pub interval: Duration,
}

impl MonitorSettings {
    pub fn from_config(cfg: &Config) -> Self {
        let secs = cfg.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS).max(0) as u64;
        Self {
            format: cfg.output_format.unwrap_or_default(),
            interval: Duration::from_secs(secs),
        }
    }

    pub fn single_pass(&self) -> bool {
        self.interval.is_zero()
    }
}
