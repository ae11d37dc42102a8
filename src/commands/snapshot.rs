//! Snapshot command implementation.
//!
//! Captures the configured process source into a JSON file that can be
//! analyzed later with `--source snapshot --snapshot-file FILE`.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use memon::process::{open_source, Snapshot};

use crate::config::Config;

/// Writes a snapshot of the process table to `output` (`-` for stdout).
pub fn command_snapshot(output: &Path, config: &Config) -> Result<()> {
    let source = open_source(config.source_kind(), &config.source_settings())?;
    let records = source
        .snapshot()
        .with_context(|| format!("Failed to read processes from {}", source.name()))?;

    let snapshot = Snapshot::capture(records);
    let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize snapshot")?;

    if output.to_string_lossy() == "-" {
        println!("{json}");
    } else {
        fs::write(output, format!("{json}\n"))
            .with_context(|| format!("Failed to write {}", output.display()))?;
        info!("Snapshot from {} written", source.name());
        println!(
            "✅ Snapshot of {} processes written to: {}",
            snapshot.processes.len(),
            output.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use memon::process::{load_snapshot, SourceKind};

    #[test]
    fn test_snapshot_of_snapshot_is_identical() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("in.json");
        fs::write(
            &input,
            r#"{"version":"1","generated_at":"2024-01-01T00:00:00Z","processes":[
                {"pid":1,"parent_pid":0,"name":"init","resident_bytes":4096,"virtual_bytes":8192},
                {"pid":2,"parent_pid":1,"name":"sh","resident_bytes":1024,"virtual_bytes":2048}
            ]}"#,
        )
        .unwrap();

        let config = Config {
            source: Some(SourceKind::Snapshot),
            snapshot_file: Some(input.clone()),
            ..Config::default()
        };
        let output = tmp.path().join("out.json");
        command_snapshot(&output, &config).unwrap();

        let before = load_snapshot(&input).unwrap();
        let after = load_snapshot(&output).unwrap();
        assert_eq!(before.processes, after.processes);
    }
}
