//! Snapshot data model: sockets, memory regions and process records.
//!
//! Records are built fresh every cycle and never mutated afterwards. The
//! serde field order of each record is the JSON report's field order.

use serde::{Serialize, Serializer};

/// Estimated footprint above which a socket is flagged as leaking.
pub const LEAK_THRESHOLD_BYTES: u64 = 10 * 1024;

/// Transport label for connection-table entries.
pub const PROTOCOL_TCP: &str = "TCP";

/// Connection states with a canonical name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpState {
    Established,
    SynSent,
    SynRecv,
    TimeWait,
    CloseWait,
    Listening,
    Unknown,
}

impl TcpState {
    /// Maps the connection table's numeric state code.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => TcpState::Established,
            2 => TcpState::SynSent,
            3 => TcpState::SynRecv,
            6 => TcpState::TimeWait,
            8 => TcpState::CloseWait,
            10 => TcpState::Listening,
            _ => TcpState::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TcpState::Established => "ESTABLISHED",
            TcpState::SynSent => "SYN_SENT",
            TcpState::SynRecv => "SYN_RECV",
            TcpState::TimeWait => "TIME_WAIT",
            TcpState::CloseWait => "CLOSE_WAIT",
            TcpState::Listening => "LISTENING",
            TcpState::Unknown => "UNKNOWN",
        }
    }
}

/// One connection-table entry with its owner and health flags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocketRecord {
    pid: u32,
    process_name: String,
    local_address: String,
    remote_address: String,
    state: String,
    protocol: String,
    memory_usage: u64,
    is_hung: bool,
    has_leak: bool,
}

impl SocketRecord {
    /// Builds a TCP record. The hung and leak flags are derived here from
    /// `state` and `memory_usage` and cannot change afterwards.
    pub fn new(
        pid: u32,
        process_name: impl Into<String>,
        local_address: impl Into<String>,
        remote_address: impl Into<String>,
        state: impl Into<String>,
        memory_usage: u64,
    ) -> Self {
        let state = state.into();
        Self {
            pid,
            process_name: process_name.into(),
            local_address: local_address.into(),
            remote_address: remote_address.into(),
            is_hung: state == TcpState::CloseWait.as_str(),
            has_leak: memory_usage > LEAK_THRESHOLD_BYTES,
            state,
            protocol: PROTOCOL_TCP.to_string(),
            memory_usage,
        }
    }

    /// Owning pid, 0 when unresolved.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn local_address(&self) -> &str {
        &self.local_address
    }

    pub fn remote_address(&self) -> &str {
        &self.remote_address
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Heuristic footprint estimate in bytes.
    pub fn memory_usage(&self) -> u64 {
        self.memory_usage
    }

    /// CLOSE_WAIT, regardless of how long the socket has been in it.
    pub fn is_hung(&self) -> bool {
        self.is_hung
    }

    pub fn has_leak(&self) -> bool {
        self.has_leak
    }
}

/// Purpose of a mapped region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    Heap,
    Stack,
    Library,
    File,
    Anonymous,
}

impl RegionKind {
    /// Classifies by backing path. Precedence: heap, stack, library, file,
    /// anonymous.
    pub fn classify(path: &str) -> Self {
        if path.contains("[heap]") {
            RegionKind::Heap
        } else if path.contains("[stack]") {
            RegionKind::Stack
        } else if is_shared_library(path) {
            RegionKind::Library
        } else if path.starts_with('/') {
            RegionKind::File
        } else {
            RegionKind::Anonymous
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegionKind::Heap => "heap",
            RegionKind::Stack => "stack",
            RegionKind::Library => "library",
            RegionKind::File => "file",
            RegionKind::Anonymous => "anonymous",
        }
    }
}

/// True for `*.so` and versioned `*.so.N[.M...]` file names.
fn is_shared_library(path: &str) -> bool {
    let path = path.strip_suffix(" (deleted)").unwrap_or(path);
    if path.ends_with(".so") {
        return true;
    }
    match path.rfind(".so.") {
        Some(idx) => {
            let version = &path[idx + 4..];
            !version.is_empty()
                && version
                    .split('.')
                    .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
        }
        None => false,
    }
}

/// One line of a process's mapping listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryRegion {
    pub pid: u32,
    /// Start address as `0x...`.
    pub address: String,
    pub size: u64,
    pub permissions: String,
    #[serde(rename = "type")]
    pub kind: RegionKind,
    pub is_shared: bool,
}

/// Coarse scheduling state of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Running,
    Sleeping,
    Waiting,
    Zombie,
    Stopped,
    Unknown,
}

impl ProcessStatus {
    /// Maps the single-character state field of the stat listing.
    pub fn from_state_char(state: char) -> Self {
        match state {
            'R' => ProcessStatus::Running,
            'S' => ProcessStatus::Sleeping,
            'D' => ProcessStatus::Waiting,
            'Z' => ProcessStatus::Zombie,
            'T' => ProcessStatus::Stopped,
            _ => ProcessStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessStatus::Running => "running",
            ProcessStatus::Sleeping => "sleeping",
            ProcessStatus::Waiting => "waiting",
            ProcessStatus::Zombie => "zombie",
            ProcessStatus::Stopped => "stopped",
            ProcessStatus::Unknown => "unknown",
        }
    }
}

/// Per-process resource usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub socket_count: usize,
    /// Resident memory in MB.
    #[serde(serialize_with = "serialize_two_decimals")]
    pub memory_usage: f64,
    /// Cumulative user+system ticks scaled down; not a utilization rate.
    #[serde(serialize_with = "serialize_two_decimals")]
    pub cpu_usage: f64,
    pub status: ProcessStatus,
}

fn serialize_two_decimals<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64((value * 100.0).round() / 100.0)
}

/// One polling cycle's output. The three collections are read independently
/// and are not guaranteed to be consistent with each other.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Capture time in epoch seconds.
    pub timestamp: i64,
    pub sockets: Vec<SocketRecord>,
    pub memory: Vec<MemoryRegion>,
    pub processes: Vec<ProcessRecord>,
}

impl Snapshot {
    pub fn summary(&self) -> SnapshotSummary {
        let mut summary = SnapshotSummary::default();
        for s in &self.sockets {
            match s.state() {
                "ESTABLISHED" => summary.established += 1,
                "LISTENING" => summary.listening += 1,
                _ => {}
            }
            if s.is_hung() {
                summary.hung += 1;
            }
            if s.has_leak() {
                summary.leaking += 1;
            }
            summary.socket_memory_bytes = summary.socket_memory_bytes.saturating_add(s.memory_usage());
        }
        summary
    }
}

/// Aggregate socket health counts for one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub established: usize,
    pub listening: usize,
    pub hung: usize,
    pub leaking: usize,
    pub socket_memory_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(state: &str, memory_usage: u64) -> SocketRecord {
        SocketRecord::new(0, "unknown", "0.0.0.0:0", "0.0.0.0:0", state, memory_usage)
    }

    // -------------------------------------------------------------------------
    // Tests for TcpState
    // -------------------------------------------------------------------------

    #[test]
    fn test_tcp_state_documented_codes() {
        assert_eq!(TcpState::from_code(1).as_str(), "ESTABLISHED");
        assert_eq!(TcpState::from_code(2).as_str(), "SYN_SENT");
        assert_eq!(TcpState::from_code(3).as_str(), "SYN_RECV");
        assert_eq!(TcpState::from_code(6).as_str(), "TIME_WAIT");
        assert_eq!(TcpState::from_code(8).as_str(), "CLOSE_WAIT");
        assert_eq!(TcpState::from_code(10).as_str(), "LISTENING");
    }

    #[test]
    fn test_tcp_state_everything_else_unknown() {
        for code in 0..=u8::MAX {
            if [1, 2, 3, 6, 8, 10].contains(&code) {
                continue;
            }
            assert_eq!(TcpState::from_code(code), TcpState::Unknown, "code {}", code);
        }
    }

    // -------------------------------------------------------------------------
    // Tests for health heuristics
    // -------------------------------------------------------------------------

    #[test]
    fn test_is_hung_only_for_close_wait() {
        assert!(record("CLOSE_WAIT", 0).is_hung());
        for state in ["ESTABLISHED", "LISTENING", "TIME_WAIT", "close_wait", "CLOSE_WAIT ", ""] {
            assert!(!record(state, 0).is_hung(), "state {:?}", state);
        }
    }

    #[test]
    fn test_has_leak_boundary() {
        assert!(!record("ESTABLISHED", 10239).has_leak());
        assert!(!record("ESTABLISHED", 10240).has_leak());
        assert!(record("ESTABLISHED", 10241).has_leak());
    }

    #[test]
    fn test_socket_record_protocol() {
        assert_eq!(record("ESTABLISHED", 0).protocol(), "TCP");
    }

    // -------------------------------------------------------------------------
    // Tests for RegionKind::classify
    // -------------------------------------------------------------------------

    #[test]
    fn test_classify_basic_kinds() {
        assert_eq!(RegionKind::classify("[heap]"), RegionKind::Heap);
        assert_eq!(RegionKind::classify("[stack]"), RegionKind::Stack);
        assert_eq!(RegionKind::classify("/usr/lib/libfoo.so"), RegionKind::Library);
        assert_eq!(RegionKind::classify("/usr/lib/x86_64-linux-gnu/libc.so.6"), RegionKind::Library);
        assert_eq!(RegionKind::classify("/usr/lib/libssl.so.3.0.2"), RegionKind::Library);
        assert_eq!(RegionKind::classify("/usr/bin/bash"), RegionKind::File);
        assert_eq!(RegionKind::classify("/opt/app/data.sock"), RegionKind::File);
        assert_eq!(RegionKind::classify(""), RegionKind::Anonymous);
        assert_eq!(RegionKind::classify("[vdso]"), RegionKind::Anonymous);
    }

    #[test]
    fn test_classify_precedence() {
        // Heap marker beats the library suffix.
        assert_eq!(RegionKind::classify("/tmp/[heap]/libevil.so"), RegionKind::Heap);
        // Stack marker beats the library suffix and the absolute path.
        assert_eq!(RegionKind::classify("/tmp/[stack]/libevil.so"), RegionKind::Stack);
        // Library beats plain file.
        assert_eq!(RegionKind::classify("/lib/libz.so.1 (deleted)"), RegionKind::Library);
    }

    // -------------------------------------------------------------------------
    // Tests for ProcessStatus
    // -------------------------------------------------------------------------

    #[test]
    fn test_process_status_mapping() {
        assert_eq!(ProcessStatus::from_state_char('R').as_str(), "running");
        assert_eq!(ProcessStatus::from_state_char('S').as_str(), "sleeping");
        assert_eq!(ProcessStatus::from_state_char('D').as_str(), "waiting");
        assert_eq!(ProcessStatus::from_state_char('Z').as_str(), "zombie");
        assert_eq!(ProcessStatus::from_state_char('T').as_str(), "stopped");
        assert_eq!(ProcessStatus::from_state_char('I').as_str(), "unknown");
    }

    // -------------------------------------------------------------------------
    // Tests for Snapshot
    // -------------------------------------------------------------------------

    #[test]
    fn test_empty_snapshot_release() {
        let snapshot = Snapshot::default();
        assert_eq!(snapshot.summary(), SnapshotSummary::default());
        drop(snapshot);
    }

    #[test]
    fn test_summary_counts() {
        let snapshot = Snapshot {
            timestamp: 0,
            sockets: vec![
                record("ESTABLISHED", 20000),
                record("LISTENING", 1024),
                record("CLOSE_WAIT", 1024),
                record("TIME_WAIT", 1024),
            ],
            memory: Vec::new(),
            processes: Vec::new(),
        };
        let summary = snapshot.summary();
        assert_eq!(summary.established, 1);
        assert_eq!(summary.listening, 1);
        assert_eq!(summary.hung, 1);
        assert_eq!(summary.leaking, 1);
        assert_eq!(summary.socket_memory_bytes, 20000 + 3 * 1024);
    }
}
