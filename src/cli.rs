//! CLI arguments and subcommands for sockmap.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "sockmap",
    about = "Snapshot TCP sockets, memory mappings and process resources from /proc",
    long_about = "Snapshot TCP sockets, memory mappings and process resources from /proc.\n\n\
                  Every interval, sockmap reads the kernel connection table, maps each socket \
                  to its owning process, classifies every process's memory regions, and prints \
                  the snapshot as JSON or as a fixed-width table. Hung (CLOSE_WAIT) and \
                  leak-suspect sockets are flagged.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output in JSON format (default)
    #[arg(short = 'j', long, conflicts_with = "table")]
    pub json: bool,

    /// Output in table format
    #[arg(short = 't', long)]
    pub table: bool,

    /// Scan interval in seconds (0 = single pass)
    #[arg(short = 'i', long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub interval: Option<i64>,

    /// Enable verbose diagnostics on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Run built-in parser smoke checks and exit
    #[arg(long)]
    pub test: bool,

    /// Log level
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Root of the process-information filesystem
    #[arg(long, value_name = "PATH")]
    pub proc_root: Option<PathBuf>,

    /// Resolve socket owners with a linear search per socket instead of a per-cycle index
    #[arg(long)]
    pub no_inode_cache: bool,

    /// Include only processes matching these names (comma-separated)
    #[arg(long)]
    pub include_names: Option<String>,

    /// Exclude processes matching these names (comma-separated)
    #[arg(long)]
    pub exclude_names: Option<String>,

    /// Maximum number of processes to scan
    #[arg(long)]
    pub max_processes: Option<usize>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and /proc accessibility
    Check,
}
