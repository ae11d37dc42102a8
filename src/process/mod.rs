//! Process-related modules for enumeration, parsing and name matching.
//!
//! This module provides:
//! - `record`: The raw process record and `ps` output parsing
//! - `memory`: Parent pid and memory parsing from /proc/<pid>/stat
//! - `scanner`: Process discovery in a proc filesystem
//! - `source`: Process sources (procfs, ps, snapshot files)
//! - `matcher`: Fuzzy process name matching

pub mod matcher;
pub mod memory;
pub mod record;
pub mod scanner;
pub mod source;

// Re-export commonly used types
pub use matcher::matches;
pub use memory::{parse_stat, read_proc_stat, StatFields, PAGE_SIZE};
pub use record::{extract_process_name, parse_ps_line, parse_ps_output, NameColumn, ProcessRecord};
pub use scanner::{collect_proc_entries, read_process_name, read_process_record, ProcEntry};
pub use source::{
    load_snapshot, open_source, ProcessSource, ProcfsSource, PsSource, Snapshot, SnapshotSource,
    SourceError, SourceKind, SourceSettings, DEFAULT_PROC_ROOT,
};
