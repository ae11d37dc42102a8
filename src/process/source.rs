//! Process record sources.
//!
//! A source enumerates the process table once per call. Three sources exist:
//! - `ProcfsSource`: reads a Linux proc filesystem directly
//! - `PsSource`: runs the `ps` utility and parses its text output
//! - `SnapshotSource`: replays a JSON snapshot captured earlier

use chrono::Utc;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use crate::process::record::{parse_ps_output, NameColumn, ProcessRecord};
use crate::process::scanner::{collect_proc_entries, read_process_record};

/// Default proc filesystem root.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Current snapshot file format version.
pub const SNAPSHOT_VERSION: &str = "1";

/// Errors raised while enumerating the process table.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}")]
    CommandFailed { program: String, status: String },

    #[error("Snapshot file not found: {0}")]
    SnapshotNotFound(PathBuf),

    #[error("Failed to parse snapshot {path}: {source}")]
    SnapshotParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Snapshot source selected but no snapshot file configured")]
    MissingSnapshotFile,
}

/// Something that can enumerate the process table.
pub trait ProcessSource: Send + Sync {
    /// Short name used in logs and messages.
    fn name(&self) -> &'static str;

    /// Returns one record per visible process.
    fn snapshot(&self) -> Result<Vec<ProcessRecord>, SourceError>;
}

/// Which source to read processes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// procfs when available, otherwise ps
    #[default]
    Auto,
    Procfs,
    Ps,
    Snapshot,
}

/// Settings needed to open any source.
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub proc_root: PathBuf,
    pub max_processes: Option<usize>,
    pub snapshot_file: Option<PathBuf>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            max_processes: None,
            snapshot_file: None,
        }
    }
}

impl SourceKind {
    /// Resolves `Auto` to a concrete source for this host.
    pub fn resolve(self, proc_root: &Path) -> SourceKind {
        match self {
            SourceKind::Auto => {
                if proc_root.join("self").join("stat").exists() {
                    SourceKind::Procfs
                } else {
                    SourceKind::Ps
                }
            }
            other => other,
        }
    }
}

/// Opens the source selected by `kind`.
pub fn open_source(
    kind: SourceKind,
    settings: &SourceSettings,
) -> Result<Box<dyn ProcessSource>, SourceError> {
    let resolved = kind.resolve(&settings.proc_root);
    debug!("Process source {:?} resolved to {:?}", kind, resolved);

    Ok(match resolved {
        SourceKind::Procfs | SourceKind::Auto => Box::new(ProcfsSource {
            root: settings.proc_root.clone(),
            max_processes: settings.max_processes,
        }),
        SourceKind::Ps => Box::new(PsSource::default()),
        SourceKind::Snapshot => {
            let path = settings
                .snapshot_file
                .clone()
                .ok_or(SourceError::MissingSnapshotFile)?;
            Box::new(SnapshotSource { path })
        }
    })
}

// -----------------------------------------------------------------------------
// procfs
// -----------------------------------------------------------------------------

/// Reads `/proc/<pid>/stat` and `/proc/<pid>/comm` for every process.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    pub root: PathBuf,
    pub max_processes: Option<usize>,
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_PROC_ROOT),
            max_processes: None,
        }
    }
}

impl ProcessSource for ProcfsSource {
    fn name(&self) -> &'static str {
        "procfs"
    }

    fn snapshot(&self) -> Result<Vec<ProcessRecord>, SourceError> {
        let entries =
            collect_proc_entries(&self.root, self.max_processes).map_err(|source| {
                SourceError::Io {
                    path: self.root.clone(),
                    source,
                }
            })?;

        let total = entries.len();
        let records: Vec<ProcessRecord> = entries.iter().filter_map(read_process_record).collect();
        debug!(
            "procfs scan of {}: {} entries, {} readable",
            self.root.display(),
            total,
            records.len()
        );
        Ok(records)
    }
}

// -----------------------------------------------------------------------------
// ps
// -----------------------------------------------------------------------------

/// Runs `ps` and parses its output.
#[derive(Debug, Clone)]
pub struct PsSource {
    pub program: String,
    pub args: Vec<String>,
    pub column: NameColumn,
}

impl Default for PsSource {
    fn default() -> Self {
        // macOS `comm` is already a bare (possibly truncated) name
        let (args, column) = if cfg!(target_os = "macos") {
            (vec!["-c", "-eo", "pid,ppid,comm,rss,vsz"], NameColumn::Comm)
        } else {
            (vec!["-eo", "pid,ppid,command,rss,vsz"], NameColumn::Command)
        };
        Self {
            program: "ps".to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            column,
        }
    }
}

impl ProcessSource for PsSource {
    fn name(&self) -> &'static str {
        "ps"
    }

    fn snapshot(&self) -> Result<Vec<ProcessRecord>, SourceError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|source| SourceError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SourceError::CommandFailed {
                program: self.program.clone(),
                status: output.status.to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let records = parse_ps_output(&stdout, self.column);
        debug!("ps returned {} records", records.len());
        Ok(records)
    }
}

// -----------------------------------------------------------------------------
// snapshot files
// -----------------------------------------------------------------------------

/// Root structure of a snapshot JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    pub generated_at: String,
    pub processes: Vec<ProcessRecord>,
}

impl Snapshot {
    /// Wraps records captured now.
    pub fn capture(processes: Vec<ProcessRecord>) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            processes,
        }
    }
}

/// Snapshot as read from disk; records are checked one by one.
#[derive(Debug, Deserialize)]
struct RawSnapshot {
    version: String,
    generated_at: String,
    processes: Vec<serde_json::Value>,
}

/// Load a snapshot from a JSON file.
///
/// Records that do not parse are skipped; only an unreadable file or a
/// broken envelope is an error.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, SourceError> {
    debug!("Loading snapshot from: {}", path.display());

    if !path.exists() {
        return Err(SourceError::SnapshotNotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawSnapshot =
        serde_json::from_str(&content).map_err(|source| SourceError::SnapshotParse {
            path: path.to_path_buf(),
            source,
        })?;

    let total = raw.processes.len();
    let processes: Vec<ProcessRecord> = raw
        .processes
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<ProcessRecord>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!("Skipping malformed snapshot record: {}", e);
                None
            }
        })
        .collect();
    if processes.len() < total {
        debug!(
            "Skipped {} of {} snapshot records",
            total - processes.len(),
            total
        );
    }

    let snapshot = Snapshot {
        version: raw.version,
        generated_at: raw.generated_at,
        processes,
    };

    info!(
        "Loaded snapshot version {} from {} ({} processes)",
        snapshot.version,
        snapshot.generated_at,
        snapshot.processes.len()
    );

    Ok(snapshot)
}

/// Replays the processes stored in a snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    pub path: PathBuf,
}

impl ProcessSource for SnapshotSource {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn snapshot(&self) -> Result<Vec<ProcessRecord>, SourceError> {
        load_snapshot(&self.path).map(|s| s.processes)
    }
}
