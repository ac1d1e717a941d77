//! Parsing of `/proc/<pid>/status` key-value listings.

use std::fs;
use std::path::Path;

/// Parses kilobyte values such as `"   1234 kB"`.
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Reads one `Key:   <n> kB` field from /proc/[pid]/status.
///
/// Returns `Ok(None)` when the key is absent (kernel threads carry no `Vm*`
/// fields).
pub fn read_status_kb(proc_path: &Path, key: &str) -> Result<Option<u64>, std::io::Error> {
    let content = fs::read_to_string(proc_path.join("status"))?;
    Ok(find_status_kb(&content, key))
}

fn find_status_kb(content: &str, key: &str) -> Option<u64> {
    content.lines().find_map(|line| {
        line.strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(':'))
            .and_then(parse_kb_value)
    })
}

/// Resident set size in kB.
pub fn read_vm_rss_kb(proc_path: &Path) -> Result<Option<u64>, std::io::Error> {
    read_status_kb(proc_path, "VmRSS")
}

/// Data segment size in kB.
pub fn read_vm_data_kb(proc_path: &Path) -> Result<Option<u64>, std::io::Error> {
    read_status_kb(proc_path, "VmData")
}
