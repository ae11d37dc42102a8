//! Config command implementation.
//!
//! Generates configuration files in various formats.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(output: Option<PathBuf>, format: ConfigFormat, commented: bool) -> Result<()> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from(match format {
            ConfigFormat::Yaml => "memon.yaml",
            ConfigFormat::Json => "memon.json",
            ConfigFormat::Toml => "memon.toml",
        }),
    };

    let mut content = render_config(&config, format)?;
    if commented {
        if let ConfigFormat::Yaml | ConfigFormat::Toml = format {
            content = add_config_comments(content);
        }
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Prepends a commented reference of every option. Both YAML and TOML use `#`.
fn add_config_comments(body: String) -> String {
    let comments = r#"# memon Configuration
# ====================
#
# Output
# ------
# no_color: false              # Disable ANSI colors (NO_COLOR env also works)
# name_width: 40               # Name column width, longer names end in "..."
# top_n: 3                     # Top consumers listed per tree
#
# Logging
# -------
# log_level: "warn"            # off, error, warn, info, debug, trace (stderr)
#
# Process Source
# --------------
# source: "auto"               # auto, procfs, ps, snapshot
# proc_root: "/proc"           # Root of the proc filesystem
# snapshot_file: null          # JSON file read when source is snapshot
# max_processes: null          # Stop scanning after N processes
#
# Analysis
# --------
# init_pid: 1                  # Children of this pid always start a tree
# watch_interval: null         # Re-run every N seconds (null = run once)
"#;

    format!("{comments}\n{body}")
}
