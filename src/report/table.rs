//! Fixed-width table report. Memory regions are not rendered here.

use chrono::DateTime;
use std::io::{self, Write};

use crate::snapshot::Snapshot;

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "YES"
    } else {
        "NO"
    }
}

/// Writes the banner, SOCKETS and PROCESSES tables and a summary footer.
pub fn write_table<W: Write>(snapshot: &Snapshot, out: &mut W) -> io::Result<()> {
    let when = DateTime::from_timestamp(snapshot.timestamp, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string());
    writeln!(
        out,
        "=== SockMap Report (Timestamp: {}, {}) ===",
        snapshot.timestamp, when
    )?;
    writeln!(out)?;

    writeln!(out, "SOCKETS:")?;
    writeln!(
        out,
        "{:<8} {:<16} {:<20} {:<20} {:<12} {:<8} {:<8} {:<5} {:<5}",
        "PID", "Process", "Local", "Remote", "State", "Protocol", "Memory", "Hung", "Leak"
    )?;
    writeln!(
        out,
        "{:<8} {:<16} {:<20} {:<20} {:<12} {:<8} {:<8} {:<5} {:<5}",
        "---", "-------", "-----", "------", "-----", "--------", "------", "----", "----"
    )?;
    for s in &snapshot.sockets {
        writeln!(
            out,
            "{:<8} {:<16} {:<20} {:<20} {:<12} {:<8} {:<8} {:<5} {:<5}",
            s.pid(),
            s.process_name(),
            s.local_address(),
            s.remote_address(),
            s.state(),
            s.protocol(),
            s.memory_usage(),
            yes_no(s.is_hung()),
            yes_no(s.has_leak())
        )?;
    }

    writeln!(out)?;
    writeln!(out, "PROCESSES:")?;
    writeln!(
        out,
        "{:<8} {:<16} {:<8} {:<10} {:<8} {:<10}",
        "PID", "Name", "Sockets", "Memory(MB)", "CPU(%)", "Status"
    )?;
    writeln!(
        out,
        "{:<8} {:<16} {:<8} {:<10} {:<8} {:<10}",
        "---", "----", "-------", "---------", "-----", "------"
    )?;
    for p in &snapshot.processes {
        writeln!(
            out,
            "{:<8} {:<16} {:<8} {:<10.2} {:<8.2} {:<10}",
            p.pid,
            p.name,
            p.socket_count,
            p.memory_usage,
            p.cpu_usage,
            p.status.as_str()
        )?;
    }

    let summary = snapshot.summary();
    writeln!(out)?;
    writeln!(
        out,
        "SUMMARY: {} established, {} listening, {} hung, {} leak suspects, {} bytes estimated socket memory",
        summary.established,
        summary.listening,
        summary.hung,
        summary.leaking,
        summary.socket_memory_bytes
    )
}
