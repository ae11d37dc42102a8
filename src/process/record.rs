//! Raw process records and parsing of `ps` text output.
//!
//! A `ProcessRecord` is the flat tuple every process source produces. The
//! parsers in this module turn rows of `ps` output into records and skip rows
//! that are malformed instead of failing the whole scan.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// `ps` reports RSS and VSZ in kibibytes.
const KIB: u64 = 1024;

/// One entry of the process table as reported by a process source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    #[serde(alias = "ppid")]
    pub parent_pid: u32,
    pub name: String,
    /// Resident set size in bytes.
    #[serde(alias = "rss")]
    pub resident_bytes: u64,
    /// Virtual memory size in bytes.
    #[serde(alias = "vsz", default)]
    pub virtual_bytes: u64,
}

impl ProcessRecord {
    pub fn new(
        pid: u32,
        parent_pid: u32,
        name: impl Into<String>,
        resident_bytes: u64,
        virtual_bytes: u64,
    ) -> Self {
        Self {
            pid,
            parent_pid,
            name: name.into(),
            resident_bytes,
            virtual_bytes,
        }
    }
}

/// How the name column of a `ps` row is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameColumn {
    /// `command`: full command line, reduced to the executable name.
    Command,
    /// `comm`: bare executable name, kept verbatim (may contain spaces).
    Comm,
}

/// Reduces a full command line to a bare executable name.
///
/// Everything before the final `/` is dropped first, then everything after the
/// first space.
pub fn extract_process_name(command: &str) -> String {
    let base = command.rsplit('/').next().unwrap_or(command);
    base.split(' ').next().unwrap_or(base).to_string()
}

/// Parses one row of `ps -eo pid,ppid,<name>,rss,vsz` output.
///
/// The name column may span several whitespace-separated fields; RSS and VSZ
/// are always the last two. Returns `None` for rows with fewer than five
/// fields, non-numeric columns or a zero pid.
pub fn parse_ps_line(line: &str, column: NameColumn) -> Option<ProcessRecord> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }

    let pid: u32 = parts[0].parse().ok()?;
    if pid == 0 {
        return None;
    }
    let parent_pid: u32 = parts[1].parse().ok()?;
    let rss_kb: u64 = parts[parts.len() - 2].parse().ok()?;
    let vsz_kb: u64 = parts[parts.len() - 1].parse().ok()?;

    let raw_name = parts[2..parts.len() - 2].join(" ");
    let name = match column {
        NameColumn::Command => extract_process_name(&raw_name),
        NameColumn::Comm => raw_name,
    };

    Some(ProcessRecord {
        pid,
        parent_pid,
        name,
        resident_bytes: rss_kb.saturating_mul(KIB),
        virtual_bytes: vsz_kb.saturating_mul(KIB),
    })
}

/// Parses complete `ps` output, skipping the header and any malformed rows.
pub fn parse_ps_output(output: &str, column: NameColumn) -> Vec<ProcessRecord> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for line in output.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_ps_line(line, column) {
            Some(record) => records.push(record),
            None => {
                skipped += 1;
                debug!("Skipping malformed ps row: {:?}", line);
            }
        }
    }

    if skipped > 0 {
        debug!("Skipped {} malformed ps rows", skipped);
    }
    records
}
