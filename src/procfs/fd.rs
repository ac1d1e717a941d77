//! Open file-descriptor walking for socket ownership.
//!
//! Every entry of `/proc/<pid>/fd` is a symlink. Socket descriptors point at
//! the pseudo path `socket:[<inode>]`, where the inode matches the last
//! column of the connection table.

use ahash::AHashMap as HashMap;
use std::fs;
use std::path::Path;
use tracing::trace;

use super::scanner::{collect_proc_entries, process_name_or_unknown};

/// Process that holds a given socket inode open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketOwner {
    pub pid: u32,
    pub name: String,
}

impl SocketOwner {
    fn for_pid(pid: u32, proc_path: &Path) -> Self {
        Self {
            pid,
            name: process_name_or_unknown(proc_path),
        }
    }
}

/// Returns the link targets of every open descriptor of a process.
///
/// Descriptors that close while the directory is being walked are skipped.
pub fn fd_targets(proc_path: &Path) -> std::io::Result<Vec<String>> {
    let mut targets = Vec::new();
    for entry in fs::read_dir(proc_path.join("fd"))?.flatten() {
        if let Ok(link) = fs::read_link(entry.path()) {
            targets.push(link.to_string_lossy().into_owned());
        }
    }
    Ok(targets)
}

/// Extracts the inode from a `socket:[<inode>]` link target.
pub fn socket_inode(target: &str) -> Option<u64> {
    target
        .strip_prefix("socket:[")
        .and_then(|s| s.strip_suffix(']'))
        .and_then(|s| s.parse().ok())
}

/// Counts descriptors whose target begins with `socket:`.
///
/// An unreadable descriptor directory counts as zero sockets.
pub fn count_sockets(proc_path: &Path) -> usize {
    match fd_targets(proc_path) {
        Ok(targets) => targets.iter().filter(|t| t.starts_with("socket:")).count(),
        Err(e) => {
            trace!("Cannot read fds of {}: {}", proc_path.display(), e);
            0
        }
    }
}

/// Linear search for the first process holding `socket:[inode]` open.
///
/// Search order is directory enumeration order. Cost is
/// O(processes x descriptors) per call.
pub fn find_process_by_inode(root: &Path, inode: u64) -> Option<SocketOwner> {
    let expected = format!("socket:[{}]", inode);
    let entries = collect_proc_entries(root, None).ok()?;
    for entry in entries {
        let Ok(targets) = fd_targets(&entry.proc_path) else {
            continue;
        };
        if targets.iter().any(|t| *t == expected) {
            return Some(SocketOwner::for_pid(entry.pid, &entry.proc_path));
        }
    }
    None
}

/// Inode to owner mapping built by a single pass over all processes.
///
/// When several processes share an inode (inherited descriptors), the first
/// one in enumeration order wins, matching [`find_process_by_inode`].
#[derive(Debug, Default)]
pub struct InodeIndex {
    owners: HashMap<u64, SocketOwner>,
}

impl InodeIndex {
    /// Walks every process's descriptors once.
    pub fn build(root: &Path) -> std::io::Result<Self> {
        let mut owners: HashMap<u64, SocketOwner> = HashMap::new();
        for entry in collect_proc_entries(root, None)? {
            let Ok(targets) = fd_targets(&entry.proc_path) else {
                continue;
            };
            let mut name: Option<String> = None;
            for inode in targets.iter().filter_map(|t| socket_inode(t)) {
                owners.entry(inode).or_insert_with(|| SocketOwner {
                    pid: entry.pid,
                    name: name
                        .get_or_insert_with(|| process_name_or_unknown(&entry.proc_path))
                        .clone(),
                });
            }
        }
        Ok(Self { owners })
    }

    pub fn lookup(&self, inode: u64) -> Option<&SocketOwner> {
        self.owners.get(&inode)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
