//! Startup requirement validation for sockmap.
//!
//! Checks run once before the first cycle. Missing privileges only produce
//! warnings; an unreadable proc root is an error.

use nix::unistd::geteuid;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::collectors::sockets::CONNECTION_TABLE;

/// Validate all runtime requirements
pub fn validate_requirements(proc_root: &Path) -> Result<(), ValidationError> {
    info!("Validating runtime requirements...");

    check_user_privileges();
    check_proc_root(proc_root)?;
    check_connection_table(proc_root);

    info!("Runtime requirements validated");
    Ok(())
}

/// Check if running with sufficient privileges
pub fn check_user_privileges() -> bool {
    if geteuid().is_root() {
        info!("Running as root (uid=0)");
        true
    } else {
        warn!("Not running as root - descriptor directories of other users' processes are unreadable");
        warn!("   Sockets owned by those processes will be reported as 'unknown'");
        false
    }
}

fn check_proc_root(proc_root: &Path) -> Result<(), ValidationError> {
    match fs::read_dir(proc_root) {
        Ok(_) => Ok(()),
        Err(e) => Err(ValidationError::ProcRootUnreadable {
            path: proc_root.display().to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Warns when the connection table is missing. Every cycle will fail until it appears.
pub fn check_connection_table(proc_root: &Path) -> bool {
    let table = proc_root.join(CONNECTION_TABLE);
    match fs::metadata(&table) {
        Ok(_) => true,
        Err(e) => {
            warn!("Connection table {} not accessible: {}", table.display(), e);
            false
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Cannot read proc root {path}: {reason}")]
    ProcRootUnreadable { path: String, reason: String },
}
