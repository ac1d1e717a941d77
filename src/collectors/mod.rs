//! Snapshot collectors.
//!
//! This module contains the three scanners run by every monitoring cycle,
//! in this order: connection table, memory mappings, process resources.

pub mod memory_maps;
pub mod processes;
pub mod sockets;

use std::io;
use std::path::PathBuf;

pub use memory_maps::scan_memory;
pub use processes::scan_processes;
pub use sockets::scan_sockets;

/// Cycle-level scanner failure.
///
/// Malformed lines and processes that exit mid-scan are not errors; they are
/// skipped by the scanners.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cannot open {}: {}", .path.display(), .source)]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed reading {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ScanError {
    pub fn unavailable(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ScanError::Unavailable {
            path: path.into(),
            source,
        }
    }
}
