//! Per-process resource collector.
//!
//! Each field is read independently and falls back to zero or "unknown" when
//! its source cannot be read, so one unreadable file never drops a record.

use tracing::trace;

use super::ScanError;
use crate::config::ScanSettings;
use crate::procfs::{
    collect_proc_entries, count_sockets, process_name_or_unknown, read_stat, read_vm_rss_kb,
    should_include_process, ProcEntry,
};
use crate::snapshot::{ProcessRecord, ProcessStatus};

/// Divisor turning cumulative user+system ticks into the reported score.
pub const CPU_TICK_DIVISOR: f64 = 100.0;

/// Assembles one record. Returns `None` when the process has already exited.
pub fn read_process_record(entry: &ProcEntry) -> Option<ProcessRecord> {
    if !entry.proc_path.exists() {
        return None;
    }
    Some(build_record(entry, process_name_or_unknown(&entry.proc_path)))
}

/// Reads the remaining fields of a process whose name is already known.
fn build_record(entry: &ProcEntry, name: String) -> ProcessRecord {
    let proc_path = entry.proc_path.as_path();

    let memory_usage = match read_vm_rss_kb(proc_path) {
        Ok(kb) => kb.unwrap_or(0) as f64 / 1024.0,
        Err(e) => {
            trace!("Failed to read VmRSS for pid {}: {}", entry.pid, e);
            0.0
        }
    };

    let (cpu_usage, status) = match read_stat(proc_path) {
        Ok(stat) => (
            stat.total_ticks() as f64 / CPU_TICK_DIVISOR,
            ProcessStatus::from_state_char(stat.state),
        ),
        Err(e) => {
            trace!("Failed to read stat for pid {}: {}", entry.pid, e);
            (0.0, ProcessStatus::Unknown)
        }
    };

    ProcessRecord {
        pid: entry.pid,
        name,
        socket_count: count_sockets(proc_path),
        memory_usage,
        cpu_usage,
        status,
    }
}

/// Builds one record per live process, in enumeration order.
pub fn scan_processes(settings: &ScanSettings) -> Result<Vec<ProcessRecord>, ScanError> {
    let root = settings.proc_root.as_path();
    let entries = collect_proc_entries(root, settings.max_processes)
        .map_err(|e| ScanError::unavailable(root, e))?;

    let mut records = Vec::with_capacity(entries.len());
    for entry in &entries {
        if !entry.proc_path.exists() {
            trace!("pid {} exited during scan", entry.pid);
            continue;
        }
        // Filter before the fd walk and stat/status reads.
        let name = process_name_or_unknown(&entry.proc_path);
        if settings.has_name_filters() && !should_include_process(&name, settings) {
            continue;
        }
        records.push(build_record(entry, name));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::symlink;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_process(root: &Path, pid: u32) -> std::path::PathBuf {
        let proc_path = root.join(pid.to_string());
        fs::create_dir_all(proc_path.join("fd")).expect("Failed to create fd dir");
        fs::write(proc_path.join("comm"), "postgres\n").expect("Failed to write comm");
        fs::write(proc_path.join("status"), "Name:\tpostgres\nVmRSS:\t   2560 kB\n")
            .expect("Failed to write status");
        fs::write(
            proc_path.join("stat"),
            format!("{} (postgres) D 1 1 1 0 -1 0 0 0 0 0 250 150 0 0 20 0 1 0 100", pid),
        )
        .expect("Failed to write stat");
        symlink("socket:[1]", proc_path.join("fd").join("3")).expect("Failed to symlink");
        symlink("socket:[2]", proc_path.join("fd").join("4")).expect("Failed to symlink");
        symlink("/dev/null", proc_path.join("fd").join("0")).expect("Failed to symlink");
        proc_path
    }

    // -------------------------------------------------------------------------
    // Tests for read_process_record
    // -------------------------------------------------------------------------

    #[test]
    fn test_read_process_record_full() {
        let dir = tempdir().expect("Failed to create temp dir");
        let proc_path = write_process(dir.path(), 900);

        let record = read_process_record(&ProcEntry { pid: 900, proc_path }).expect("process exists");
        assert_eq!(record.pid, 900);
        assert_eq!(record.name, "postgres");
        assert_eq!(record.socket_count, 2);
        assert!((record.memory_usage - 2.5).abs() < f64::EPSILON);
        assert!((record.cpu_usage - 4.0).abs() < f64::EPSILON);
        assert_eq!(record.status, ProcessStatus::Waiting);
    }

    #[test]
    fn test_read_process_record_defaults_unreadable_fields() {
        let dir = tempdir().expect("Failed to create temp dir");
        let proc_path = dir.path().join("5");
        fs::create_dir(&proc_path).expect("Failed to create proc dir");

        let record = read_process_record(&ProcEntry { pid: 5, proc_path }).expect("dir exists");
        assert_eq!(record.name, "unknown");
        assert_eq!(record.socket_count, 0);
        assert_eq!(record.memory_usage, 0.0);
        assert_eq!(record.cpu_usage, 0.0);
        assert_eq!(record.status, ProcessStatus::Unknown);
    }

    #[test]
    fn test_read_process_record_vanished() {
        let dir = tempdir().expect("Failed to create temp dir");
        let entry = ProcEntry {
            pid: 6,
            proc_path: dir.path().join("6"),
        };
        assert_eq!(read_process_record(&entry), None);
    }

    // -------------------------------------------------------------------------
    // Tests for scan_processes
    // -------------------------------------------------------------------------

    #[test]
    fn test_scan_processes_with_filters() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_process(dir.path(), 900);
        let other = dir.path().join("901");
        fs::create_dir(&other).expect("Failed to create proc dir");
        fs::write(other.join("comm"), "nginx\n").expect("Failed to write comm");

        let mut settings = ScanSettings {
            proc_root: dir.path().to_path_buf(),
            ..ScanSettings::default()
        };
        assert_eq!(scan_processes(&settings).expect("scan ok").len(), 2);

        settings.exclude_names = vec!["nginx".to_string()];
        let records = scan_processes(&settings).expect("scan ok");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "postgres");
    }

    #[test]
    fn test_scan_processes_filters_on_fallback_name() {
        let dir = tempdir().expect("Failed to create temp dir");
        write_process(dir.path(), 900);
        // No comm, status or stat: only the name fallback applies.
        fs::create_dir(dir.path().join("902")).expect("Failed to create proc dir");

        let settings = ScanSettings {
            proc_root: dir.path().to_path_buf(),
            include_names: vec!["unknown".to_string()],
            ..ScanSettings::default()
        };
        let records = scan_processes(&settings).expect("scan ok");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pid, 902);
        assert_eq!(records[0].name, "unknown");
        assert_eq!(records[0].status, ProcessStatus::Unknown);
    }
}
