//! Process scanning utilities for discovering and reading process entries from /proc.
//!
//! This module provides functions to scan a proc filesystem root for process
//! entries and turn each one into a `ProcessRecord`.

use crate::process::memory::read_proc_stat;
use crate::process::record::ProcessRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Scans the proc root for process entries with numeric PIDs.
///
/// Fails only if the root itself cannot be listed; unreadable entries are
/// skipped.
pub fn collect_proc_entries(root: &Path, max: Option<usize>) -> std::io::Result<Vec<ProcEntry>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(root)?.flatten() {
        let p = entry.path();
        let name = match p.file_name().and_then(|s| s.to_str()) {
            Some(v) => v,
            None => continue,
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let pid: u32 = match name.parse() {
            Ok(v) if v > 0 => v,
            _ => continue,
        };
        out.push(ProcEntry { pid, proc_path: p });
    }
    // read_dir order is arbitrary; sort before capping so the kept set is stable
    out.sort_by_key(|e| e.pid);
    if let Some(maxp) = max {
        out.truncate(maxp);
    }
    Ok(out)
}

/// Reads process name from comm file or extracts from cmdline.
pub fn read_process_name(proc_path: &Path) -> Option<String> {
    let comm = proc_path.join("comm");
    if let Ok(s) = fs::read_to_string(&comm) {
        let t = s.trim();
        if !t.is_empty() {
            return Some(t.into());
        }
    }

    let cmd = proc_path.join("cmdline");
    if let Ok(content) = fs::read(&cmd) {
        if !content.is_empty() {
            let parts: Vec<&str> = content
                .split(|&b| b == 0u8)
                .filter_map(|s| std::str::from_utf8(s).ok())
                .collect();
            if !parts.is_empty() {
                if let Some(name) = Path::new(parts[0]).file_name() {
                    return name.to_str().map(|s| s.to_string());
                }
            }
        }
    }
    None
}

/// Builds a record for one proc entry, or `None` if the process vanished or
/// its `stat` is unreadable.
pub fn read_process_record(entry: &ProcEntry) -> Option<ProcessRecord> {
    let stat = match read_proc_stat(&entry.proc_path) {
        Ok(stat) => stat,
        Err(e) => {
            debug!("Skipping pid {}: {}", entry.pid, e);
            return None;
        }
    };

    let name = read_process_name(&entry.proc_path).unwrap_or(stat.comm);

    Some(ProcessRecord {
        pid: entry.pid,
        parent_pid: stat.parent_pid,
        name,
        resident_bytes: stat.resident_bytes,
        virtual_bytes: stat.virtual_bytes,
    })
}
