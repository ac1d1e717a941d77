//! Parsing of `/proc/<pid>/stat`.
//!
//! The second field is the command name in parentheses and may itself contain
//! spaces or `)`, so the remaining fields are located after the last `)`.

use std::fs;
use std::path::Path;

/// Fields of interest from one stat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatFields {
    /// Single-character scheduling state (field 3).
    pub state: char,
    /// Cumulative user-mode ticks (field 14).
    pub utime: u64,
    /// Cumulative kernel-mode ticks (field 15).
    pub stime: u64,
}

impl StatFields {
    pub fn total_ticks(&self) -> u64 {
        self.utime.saturating_add(self.stime)
    }
}

/// Parses a stat line. Returns `None` if the layout does not match.
pub fn parse_stat(content: &str) -> Option<StatFields> {
    let close = content.rfind(')')?;
    // Fields 3.. follow the comm; field N sits at index N - 3.
    let rest: Vec<&str> = content[close + 1..].split_whitespace().collect();
    if rest.len() <= 12 {
        return None;
    }

    let mut state_chars = rest[0].chars();
    let state = state_chars.next()?;
    if state_chars.next().is_some() {
        return None;
    }

    Some(StatFields {
        state,
        utime: rest[11].parse().ok()?,
        stime: rest[12].parse().ok()?,
    })
}

/// Reads and parses `<proc_path>/stat`.
pub fn read_stat(proc_path: &Path) -> Result<StatFields, std::io::Error> {
    let content = fs::read_to_string(proc_path.join("stat"))?;
    parse_stat(&content).ok_or_else(|| std::io::Error::other("Invalid stat format"))
}
