//! Readers for the process-information filesystem.
//!
//! This module provides:
//! - `scanner`: Process discovery and short-name lookup
//! - `fd`: Open-descriptor walking and socket inode resolution
//! - `status`: `VmRSS` / `VmData` from /proc/<pid>/status
//! - `stat`: State and tick counters from /proc/<pid>/stat
//!
//! Every reader takes the filesystem root as a parameter so the scanners can
//! run against a synthetic tree.

pub mod fd;
pub mod scanner;
pub mod stat;
pub mod status;

// Re-export commonly used types
pub use fd::{
    count_sockets, fd_targets, find_process_by_inode, socket_inode, InodeIndex, SocketOwner,
};
pub use scanner::{
    collect_proc_entries, process_name_or_unknown, read_process_name, should_include_process,
    ProcEntry, MAX_PROCESS_NAME, UNKNOWN_PROCESS,
};
pub use stat::{parse_stat, read_stat, StatFields};
pub use status::{parse_kb_value, read_status_kb, read_vm_data_kb, read_vm_rss_kb};
