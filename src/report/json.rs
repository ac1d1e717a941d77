//! JSON report.
//!
//! ```text
//! {
//!   "timestamp": 1700000000,
//!   "sockets": [ { "pid": .., "process_name": .., ... } ],
//!   "memory": [ { "pid": .., "address": .., ... } ],
//!   "processes": [ { "pid": .., "name": .., ... } ]
//! }
//! ```

use serde::Serialize;
use std::io::{self, Write};

use crate::snapshot::{MemoryRegion, ProcessRecord, Snapshot, SocketRecord};

#[derive(Serialize)]
struct JsonReport<'a> {
    timestamp: i64,
    sockets: &'a [SocketRecord],
    memory: &'a [MemoryRegion],
    processes: &'a [ProcessRecord],
}

impl<'a> From<&'a Snapshot> for JsonReport<'a> {
    fn from(snapshot: &'a Snapshot) -> Self {
        Self {
            timestamp: snapshot.timestamp,
            sockets: &snapshot.sockets,
            memory: &snapshot.memory,
            processes: &snapshot.processes,
        }
    }
}

/// Writes the snapshot as pretty-printed JSON followed by a newline.
pub fn write_json<W: Write>(snapshot: &Snapshot, out: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, &JsonReport::from(snapshot))?;
    writeln!(out)
}
