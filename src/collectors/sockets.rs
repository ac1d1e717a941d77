//! Connection-table collector.
//!
//! Reads `<proc_root>/net/tcp`, decodes every well-formed entry, attaches the
//! owning process and applies the hung/leak heuristics.
//!
//! Line format (header line skipped):
//! `sl local_address rem_address st tx_queue:rx_queue tr:tm->when retrnsmt uid timeout inode ...`

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::Ipv4Addr;
use std::path::Path;
use tracing::{debug, trace};

use super::ScanError;
use crate::config::ScanSettings;
use crate::procfs::{find_process_by_inode, read_vm_data_kb, InodeIndex, SocketOwner, UNKNOWN_PROCESS};
use crate::snapshot::{SocketRecord, TcpState};

/// Connection table path relative to the proc root.
pub const CONNECTION_TABLE: &str = "net/tcp";

/// Footprint reported when no data-segment size is available.
pub const BASE_SOCKET_MEMORY: u64 = 1024;

/// Divisor applied to the owner's data-segment bytes.
pub const SOCKET_MEMORY_DIVISOR: u64 = 100;

/// One decoded connection-table line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    pub local: String,
    pub remote: String,
    pub state: TcpState,
    pub inode: u64,
}

/// Decodes `AABBCCDD:PPPP` (little-endian hex address, hex port) into
/// `a.b.c.d:port`.
pub fn decode_endpoint(s: &str) -> Option<String> {
    let (addr_hex, port_hex) = s.split_once(':')?;
    if addr_hex.len() != 8 || port_hex.is_empty() || port_hex.len() > 4 {
        return None;
    }
    let n = u32::from_str_radix(addr_hex, 16).ok()?;
    let port = u16::from_str_radix(port_hex, 16).ok()?;
    Some(format!("{}:{}", Ipv4Addr::from(n.to_le_bytes()), port))
}

/// Inverse of [`decode_endpoint`].
pub fn encode_endpoint(addr: Ipv4Addr, port: u16) -> String {
    format!("{:08X}:{:04X}", u32::from_le_bytes(addr.octets()), port)
}

/// Parses one connection-table line. Returns `None` for anything that does
/// not have the expected fields.
pub fn parse_table_line(line: &str) -> Option<TableEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 10 {
        return None;
    }
    fields[0].strip_suffix(':')?.parse::<u64>().ok()?;

    let local = decode_endpoint(fields[1])?;
    let remote = decode_endpoint(fields[2])?;
    let state = TcpState::from_code(u8::from_str_radix(fields[3], 16).ok()?);
    let inode: u64 = fields[9].parse().ok()?;

    Some(TableEntry {
        local,
        remote,
        state,
        inode,
    })
}

/// Parses a whole table, skipping the header and every malformed line.
pub fn parse_connection_table<R: BufRead>(
    reader: R,
    path: &Path,
) -> Result<Vec<TableEntry>, ScanError> {
    let mut entries = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| ScanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        if idx == 0 {
            continue;
        }
        match parse_table_line(&line) {
            Some(entry) => entries.push(entry),
            None => trace!("Skipping malformed connection-table line: {:?}", line),
        }
    }
    Ok(entries)
}

/// Estimates a socket's footprint from its owner's `VmData`.
pub fn estimate_socket_memory(root: &Path, owner_pid: Option<u32>) -> u64 {
    let Some(pid) = owner_pid else {
        return BASE_SOCKET_MEMORY;
    };
    match read_vm_data_kb(&root.join(pid.to_string())) {
        Ok(Some(data_kb)) => data_kb.saturating_mul(1024) / SOCKET_MEMORY_DIVISOR,
        Ok(None) => BASE_SOCKET_MEMORY,
        Err(e) => {
            trace!("Cannot read status of pid {}: {}", pid, e);
            BASE_SOCKET_MEMORY
        }
    }
}

/// Inode-to-owner strategy for one scan.
enum Resolver<'a> {
    Indexed(InodeIndex),
    Linear(&'a Path),
}

impl Resolver<'_> {
    fn resolve(&self, inode: u64) -> Option<SocketOwner> {
        if inode == 0 {
            return None;
        }
        match self {
            Resolver::Indexed(index) => index.lookup(inode).cloned(),
            Resolver::Linear(root) => find_process_by_inode(root, inode),
        }
    }
}

/// Scans the connection table into socket records, in table order.
pub fn scan_sockets(settings: &ScanSettings) -> Result<Vec<SocketRecord>, ScanError> {
    let root = settings.proc_root.as_path();
    let path = root.join(CONNECTION_TABLE);
    let file = File::open(&path).map_err(|e| ScanError::unavailable(&path, e))?;
    let entries = parse_connection_table(BufReader::new(file), &path)?;

    let resolver = if settings.cache_inodes && !entries.is_empty() {
        match InodeIndex::build(root) {
            Ok(index) => {
                debug!("Indexed {} socket inodes", index.len());
                Resolver::Indexed(index)
            }
            Err(e) => {
                debug!("Cannot build inode index under {}: {}", root.display(), e);
                Resolver::Indexed(InodeIndex::default())
            }
        }
    } else {
        Resolver::Linear(root)
    };

    let records = entries
        .into_iter()
        .map(|entry| {
            let owner = resolver.resolve(entry.inode);
            let pid = owner.as_ref().map(|o| o.pid);
            let memory_usage = estimate_socket_memory(root, pid);
            let (pid, name) = match owner {
                Some(o) => (o.pid, o.name),
                None => (0, UNKNOWN_PROCESS.to_string()),
            };
            SocketRecord::new(
                pid,
                name,
                entry.local,
                entry.remote,
                entry.state.as_str(),
                memory_usage,
            )
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    const HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";
    const LISTEN_LINE: &str = "   0: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000  1000        0 4242 1 0000000000000000 100 0 0 10 0";

    // -------------------------------------------------------------------------
    // Tests for endpoint decoding
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_endpoint() {
        assert_eq!(decode_endpoint("0100007F:1F90").as_deref(), Some("127.0.0.1:8080"));
        assert_eq!(decode_endpoint("00000000:0000").as_deref(), Some("0.0.0.0:0"));
        assert_eq!(decode_endpoint("0B01A8C0:01BB").as_deref(), Some("192.168.1.11:443"));
    }

    #[test]
    fn test_decode_endpoint_invalid() {
        assert_eq!(decode_endpoint("0100007F"), None);
        assert_eq!(decode_endpoint("0100007:1F90"), None);
        assert_eq!(decode_endpoint("0100007G:1F90"), None);
        assert_eq!(decode_endpoint("0100007F:1F9000"), None);
        // IPv6 entries belong to a different table
        assert_eq!(decode_endpoint("00000000000000000000000001000000:0016"), None);
    }

    #[test]
    fn test_endpoint_round_trip() {
        for (addr, port) in [
            (Ipv4Addr::new(127, 0, 0, 1), 8080),
            (Ipv4Addr::new(10, 20, 30, 40), 65535),
            (Ipv4Addr::new(255, 0, 128, 1), 1),
        ] {
            let encoded = encode_endpoint(addr, port);
            assert_eq!(decode_endpoint(&encoded), Some(format!("{}:{}", addr, port)));
        }
        assert_eq!(encode_endpoint(Ipv4Addr::new(127, 0, 0, 1), 8080), "0100007F:1F90");
    }

    // -------------------------------------------------------------------------
    // Tests for table parsing
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_table_line() {
        let entry = parse_table_line(LISTEN_LINE).expect("valid line");
        assert_eq!(entry.local, "127.0.0.1:8080");
        assert_eq!(entry.remote, "0.0.0.0:0");
        assert_eq!(entry.state, TcpState::Listening);
        assert_eq!(entry.inode, 4242);
    }

    #[test]
    fn test_parse_table_line_malformed() {
        assert_eq!(parse_table_line(""), None);
        assert_eq!(parse_table_line("   0: 0100007F:1F90 00000000:0000 0A"), None);
        assert_eq!(parse_table_line(HEADER), None);
        let bad_inode = LISTEN_LINE.replace(" 4242 ", " xyz ");
        assert_eq!(parse_table_line(&bad_inode), None);
    }

    #[test]
    fn test_parse_connection_table_skips_header_and_garbage() {
        let content = format!("{}\n{}\nnot a socket line\n", HEADER, LISTEN_LINE);
        let entries = parse_connection_table(content.as_bytes(), Path::new("tcp"))
            .expect("in-memory read");
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_parse_connection_table_empty() {
        let entries =
            parse_connection_table("".as_bytes(), Path::new("tcp")).expect("in-memory read");
        assert!(entries.is_empty());
    }

    // -------------------------------------------------------------------------
    // Tests for estimate_socket_memory
    // -------------------------------------------------------------------------

    #[test]
    fn test_estimate_socket_memory() {
        let dir = tempdir().expect("Failed to create temp dir");
        let proc_path = dir.path().join("55");
        fs::create_dir(&proc_path).expect("Failed to create proc dir");
        fs::write(proc_path.join("status"), "Name:\tx\nVmData:\t    2000 kB\n")
            .expect("Failed to write status");

        assert_eq!(estimate_socket_memory(dir.path(), Some(55)), 2000 * 1024 / 100);
        assert_eq!(estimate_socket_memory(dir.path(), Some(56)), BASE_SOCKET_MEMORY);
        assert_eq!(estimate_socket_memory(dir.path(), None), BASE_SOCKET_MEMORY);
    }

    // -------------------------------------------------------------------------
    // Tests for scan_sockets
    // -------------------------------------------------------------------------

    fn settings_for(root: &Path, cache_inodes: bool) -> ScanSettings {
        ScanSettings {
            proc_root: root.to_path_buf(),
            cache_inodes,
            ..ScanSettings::default()
        }
    }

    #[test]
    fn test_scan_sockets_missing_table() {
        let dir = tempdir().expect("Failed to create temp dir");
        let err = scan_sockets(&settings_for(dir.path(), true)).expect_err("table is missing");
        assert!(matches!(err, ScanError::Unavailable { .. }));
    }

    #[test]
    fn test_scan_sockets_resolves_owner_both_strategies() {
        let dir = tempdir().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("net")).expect("Failed to create net dir");
        fs::write(
            dir.path().join(CONNECTION_TABLE),
            format!("{}\n{}\n", HEADER, LISTEN_LINE),
        )
        .expect("Failed to write table");

        let proc_path = dir.path().join("321");
        fs::create_dir_all(proc_path.join("fd")).expect("Failed to create fd dir");
        fs::write(proc_path.join("comm"), "nginx\n").expect("Failed to write comm");
        fs::write(proc_path.join("status"), "VmData:\t     500 kB\n").expect("Failed to write status");
        symlink("socket:[4242]", proc_path.join("fd").join("3")).expect("Failed to symlink");

        for cache_inodes in [true, false] {
            let records = scan_sockets(&settings_for(dir.path(), cache_inodes)).expect("scan ok");
            assert_eq!(records.len(), 1);
            let r = &records[0];
            assert_eq!(r.pid(), 321);
            assert_eq!(r.process_name(), "nginx");
            assert_eq!(r.state(), "LISTENING");
            assert_eq!(r.memory_usage(), 500 * 1024 / 100);
            assert!(!r.is_hung());
            assert!(!r.has_leak());
        }
    }
}
