//! Memory-mapping collector.
//!
//! Turns every well-formed line of `/proc/<pid>/maps` into a classified
//! [`MemoryRegion`]:
//!
//! ```text
//! 55d0c8a3e000-55d0c8a5f000 rw-p 00000000 00:00 0          [heap]
//! 7f3b2c000000-7f3b2c021000 r-xp 00000000 08:01 131090     /usr/lib/libc.so.6
//! ```

use std::fs;
use std::path::Path;
use tracing::trace;

use super::ScanError;
use crate::config::ScanSettings;
use crate::procfs::{collect_proc_entries, process_name_or_unknown, should_include_process};
use crate::snapshot::{MemoryRegion, RegionKind};

/// Pops the next whitespace-delimited field off the front of `rest`.
fn next_field<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let current: &'a str = *rest;
    let trimmed = current.trim_start();
    if trimmed.is_empty() {
        *rest = trimmed;
        return None;
    }
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let (field, tail) = trimmed.split_at(end);
    *rest = tail;
    Some(field)
}

/// Parses one mapping line.
///
/// The address range and permission string are required; offset, device and
/// inode are skipped when present and the remainder of the line is the
/// backing path.
pub fn parse_maps_line(pid: u32, line: &str) -> Option<MemoryRegion> {
    let mut rest = line;

    let (start_hex, end_hex) = next_field(&mut rest)?.split_once('-')?;
    let start = u64::from_str_radix(start_hex, 16).ok()?;
    let end = u64::from_str_radix(end_hex, 16).ok()?;
    if end < start {
        return None;
    }

    let perms = next_field(&mut rest)?;
    if perms.len() != 4 || !perms.is_ascii() {
        return None;
    }

    // offset, dev, inode
    for _ in 0..3 {
        if next_field(&mut rest).is_none() {
            break;
        }
    }
    let path = rest.trim();

    Some(MemoryRegion {
        pid,
        address: format!("0x{:x}", start),
        size: end - start,
        permissions: perms.to_string(),
        kind: RegionKind::classify(path),
        is_shared: perms.as_bytes()[3] == b's',
    })
}

/// Reads all regions of one process, in listing order.
pub fn read_process_maps(pid: u32, proc_path: &Path) -> Result<Vec<MemoryRegion>, std::io::Error> {
    // Backing paths are not guaranteed to be UTF-8.
    let raw = fs::read(proc_path.join("maps"))?;
    Ok(String::from_utf8_lossy(&raw)
        .lines()
        .filter_map(|line| parse_maps_line(pid, line))
        .collect())
}

/// Scans the mapping listings of every live process.
///
/// Processes that exit before their listing is opened are skipped.
pub fn scan_memory(settings: &ScanSettings) -> Result<Vec<MemoryRegion>, ScanError> {
    let root = settings.proc_root.as_path();
    let entries = collect_proc_entries(root, settings.max_processes)
        .map_err(|e| ScanError::unavailable(root, e))?;

    let mut regions = Vec::new();
    for entry in entries {
        if settings.has_name_filters() {
            if !should_include_process(&process_name_or_unknown(&entry.proc_path), settings) {
                continue;
            }
        }
        match read_process_maps(entry.pid, &entry.proc_path) {
            Ok(mut process_regions) => regions.append(&mut process_regions),
            Err(e) => trace!("Skipping maps of pid {}: {}", entry.pid, e),
        }
    }
    Ok(regions)
}
