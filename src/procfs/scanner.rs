//! Process scanning utilities for discovering process entries.
//!
//! Enumerates the numeric directories of the process-information filesystem
//! and reads each process's short command name.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ScanSettings;

/// Name reported when a process's comm cannot be read.
pub const UNKNOWN_PROCESS: &str = "unknown";

/// Upper bound the kernel places on a comm name, including the terminator.
pub const MAX_PROCESS_NAME: usize = 256;

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Scans `root` for process entries with numeric PIDs, in directory order.
///
/// Fails only when `root` itself cannot be listed.
pub fn collect_proc_entries(root: &Path, max: Option<usize>) -> io::Result<Vec<ProcEntry>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(root)?.flatten() {
        let p = entry.path();
        let name = match p.file_name().and_then(|s| s.to_str()) {
            Some(v) => v,
            None => continue,
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let pid: u32 = match name.parse() {
            Ok(v) if v > 0 => v,
            _ => continue,
        };
        if !p.is_dir() {
            continue;
        }
        out.push(ProcEntry { pid, proc_path: p });
        if let Some(maxp) = max {
            if out.len() >= maxp {
                break;
            }
        }
    }
    Ok(out)
}

/// Reads the short command name from `<proc_path>/comm`.
///
/// Only the trailing newline is stripped. Returns `None` if the file cannot
/// be read, which usually means the process has exited.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    let mut s = fs::read_to_string(proc_path.join("comm")).ok()?;
    if s.ends_with('\n') {
        s.pop();
    }
    if s.len() >= MAX_PROCESS_NAME {
        let mut cut = MAX_PROCESS_NAME - 1;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    Some(s)
}

/// Name used for filtering and reporting, `"unknown"` when comm is unreadable.
pub fn process_name_or_unknown(proc_path: &Path) -> String {
    read_process_name(proc_path).unwrap_or_else(|| UNKNOWN_PROCESS.to_string())
}

/// Determines if a process should be included based on the name filters.
pub fn should_include_process(name: &str, settings: &ScanSettings) -> bool {
    if settings.exclude_names.iter().any(|s| name.contains(s.as_str())) {
        return false;
    }
    if !settings.include_names.is_empty() {
        return settings.include_names.iter().any(|s| name.contains(s.as_str()));
    }
    true
}
