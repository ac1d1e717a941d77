//! Synthetic process-information trees for integration tests.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

use sockmap::config::ScanSettings;

pub const TCP_HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";

/// Builds one connection-table line.
pub fn tcp_line(slot: u32, local: &str, remote: &str, state: &str, inode: u64) -> String {
    format!(
        "{:>4}: {} {} {} 00000000:00000000 00:00000000 00000000  1000        0 {} 1 0000000000000000 20 4 30 10 -1",
        slot, local, remote, state, inode
    )
}

pub struct FakeProc {
    dir: TempDir,
}

impl FakeProc {
    pub fn new() -> Self {
        Self {
            dir: tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn settings(&self) -> ScanSettings {
        ScanSettings {
            proc_root: self.root().to_path_buf(),
            ..ScanSettings::default()
        }
    }

    /// Writes `net/tcp` with the header followed by `lines`.
    pub fn write_tcp(&self, lines: &[String]) {
        let net = self.root().join("net");
        fs::create_dir_all(&net).expect("Failed to create net dir");
        let mut content = format!("{}\n", TCP_HEADER);
        for line in lines {
            content.push_str(line);
            content.push('\n');
        }
        fs::write(net.join("tcp"), content).expect("Failed to write tcp table");
    }

    /// Writes a complete process directory holding `sockets` as descriptors 3, 4, ...
    pub fn add_process(&self, pid: u32, name: &str, vm_data_kb: u64, sockets: &[u64]) -> PathBuf {
        let proc_path = self.root().join(pid.to_string());
        let fd_dir = proc_path.join("fd");
        fs::create_dir_all(&fd_dir).expect("Failed to create fd dir");

        fs::write(proc_path.join("comm"), format!("{}\n", name)).expect("Failed to write comm");
        fs::write(
            proc_path.join("status"),
            format!(
                "Name:\t{}\nState:\tS (sleeping)\nVmRSS:\t    5120 kB\nVmData:\t{:>8} kB\n",
                name, vm_data_kb
            ),
        )
        .expect("Failed to write status");
        fs::write(
            proc_path.join("stat"),
            format!(
                "{} ({}) S 1 {} {} 0 -1 4194560 500 0 0 0 300 100 0 0 20 0 1 0 1000 0 0",
                pid, name, pid, pid
            ),
        )
        .expect("Failed to write stat");
        fs::write(
            proc_path.join("maps"),
            "55d0c8a3e000-55d0c8a5f000 rw-p 00000000 00:00 0          [heap]\n\
             7f3b2c000000-7f3b2c021000 r-xp 00000000 08:01 131090     /usr/lib/libc.so.6\n\
             7ffd1c9a0000-7ffd1c9c1000 rw-p 00000000 00:00 0          [stack]\n",
        )
        .expect("Failed to write maps");

        symlink("/dev/null", fd_dir.join("0")).expect("Failed to symlink");
        for (i, inode) in sockets.iter().enumerate() {
            symlink(format!("socket:[{}]", inode), fd_dir.join((i + 3).to_string()))
                .expect("Failed to symlink");
        }
        proc_path
    }
}
