//! SockMap: point-in-time socket, memory-map and process introspection.
//!
//! Every cycle reads the kernel connection table, maps each socket inode to
//! the process holding it, classifies every process's memory mappings and
//! gathers per-process resource figures. The resulting [`Snapshot`] is
//! rendered as JSON or as a fixed-width table.
//!
//! # Usage
//!
//! ```no_run
//! use sockmap::config::{MonitorSettings, ScanSettings};
//! use sockmap::monitor::{shutdown_channel, Monitor, ProcfsSource};
//! use std::time::Duration;
//!
//! # async fn run() {
//! let settings = MonitorSettings {
//!     format: sockmap::OutputFormat::Json,
//!     interval: Duration::ZERO,
//! };
//! let (_trigger, mut shutdown) = shutdown_channel();
//! let mut monitor = Monitor::new(settings, ProcfsSource::new(ScanSettings::default()), std::io::stdout());
//! let report = monitor.run(&mut shutdown).await;
//! assert_eq!(report.total(), 1);
//! # }
//! ```

pub mod cli;
pub mod collectors;
pub mod commands;
pub mod config;
pub mod monitor;
pub mod procfs;
pub mod report;
pub mod snapshot;
pub mod startup_checks;

// Re-export main types for convenience
pub use collectors::ScanError;
pub use config::{Config, MonitorSettings, ScanSettings};
pub use monitor::{LoopReport, Monitor, ProcfsSource, Shutdown, ShutdownTrigger, SnapshotSource};
pub use report::OutputFormat;
pub use snapshot::{MemoryRegion, ProcessRecord, Snapshot, SocketRecord};
