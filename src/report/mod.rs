//! Report rendering.
//!
//! Two read-only renderers over the same [`Snapshot`]: JSON (all three
//! collections) and a fixed-width table (sockets and processes only).

pub mod json;
pub mod table;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::snapshot::Snapshot;

pub use json::write_json;
pub use table::write_table;

/// Report format selected on the command line or in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

/// Renders `snapshot` in `format` and flushes `out`.
pub fn write_report<W: Write>(
    format: OutputFormat,
    snapshot: &Snapshot,
    out: &mut W,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => write_json(snapshot, out)?,
        OutputFormat::Table => write_table(snapshot, out)?,
    }
    out.flush()
}
