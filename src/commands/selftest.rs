//! Self-test command implementation.
//!
//! Smoke checks of the pure parsers. Touches no files.

use std::net::Ipv4Addr;

use crate::collectors::memory_maps::parse_maps_line;
use crate::collectors::sockets::{decode_endpoint, encode_endpoint, parse_table_line};
use crate::procfs::parse_stat;
use crate::snapshot::{RegionKind, SocketRecord, TcpState};

type Check = (&'static str, fn() -> bool);

const CHECKS: [Check; 6] = [
    ("endpoint decode/encode", check_endpoints),
    ("connection state table", check_states),
    ("connection table line", check_table_line),
    ("region classification", check_regions),
    ("leak threshold boundary", check_leak_boundary),
    ("stat line parsing", check_stat),
];

fn check_endpoints() -> bool {
    decode_endpoint("0100007F:0050").as_deref() == Some("127.0.0.1:80")
        && encode_endpoint(Ipv4Addr::new(127, 0, 0, 1), 80) == "0100007F:0050"
        && decode_endpoint("zz:1").is_none()
}

fn check_states() -> bool {
    [
        (1, "ESTABLISHED"),
        (2, "SYN_SENT"),
        (3, "SYN_RECV"),
        (6, "TIME_WAIT"),
        (8, "CLOSE_WAIT"),
        (10, "LISTENING"),
        (4, "UNKNOWN"),
    ]
    .iter()
    .all(|(code, name)| TcpState::from_code(*code).as_str() == *name)
}

fn check_table_line() -> bool {
    let line = "   0: 0100007F:1F90 00000000:0000 0A 00000000:00000000 00:00000000 00000000     0        0 4242 1 0000000000000000 100 0 0 10 0";
    parse_table_line(line).is_some_and(|e| e.inode == 4242 && e.state == TcpState::Listening)
        && parse_table_line("garbage").is_none()
}

fn check_regions() -> bool {
    RegionKind::classify("[heap]/libfoo.so") == RegionKind::Heap
        && RegionKind::classify("/usr/lib/libc.so.6") == RegionKind::Library
        && RegionKind::classify("/usr/bin/cat") == RegionKind::File
        && RegionKind::classify("") == RegionKind::Anonymous
        && parse_maps_line(1, "00400000-00401000 rw-s 00000000 00:00 0")
            .is_some_and(|r| r.size == 0x1000 && r.is_shared)
}

fn check_leak_boundary() -> bool {
    let at = SocketRecord::new(0, "x", "", "", "ESTABLISHED", 10240);
    let above = SocketRecord::new(0, "x", "", "", "ESTABLISHED", 10241);
    !at.has_leak() && above.has_leak()
}

fn check_stat() -> bool {
    let line = "42 (a) b) S 1 42 42 0 -1 4194560 100 0 0 0 150 50 0 0 20 0 1 0 100 0 0";
    parse_stat(line).is_some_and(|s| s.state == 'S' && s.total_ticks() == 200)
}

/// Runs every smoke check, printing one line each. Returns `true` when all pass.
pub fn command_selftest() -> bool {
    println!("🧪 SockMap - Self Test");
    println!("======================");

    let mut failed = 0;
    for (name, check) in CHECKS {
        if check() {
            println!("   ✅ {}", name);
        } else {
            println!("   ❌ {}", name);
            failed += 1;
        }
    }

    if failed == 0 {
        println!("\n✅ Self test passed");
        true
    } else {
        println!("\n❌ {} of {} checks failed", failed, CHECKS.len());
        false
    }
}
