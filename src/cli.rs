//! CLI arguments and subcommands for memon.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use memon::process::SourceKind;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parses a level name as written in a config file.
    pub fn parse(name: &str) -> Option<LogLevel> {
        <LogLevel as ValueEnum>::from_str(name, true).ok()
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "memon",
    about = "Analyze memory usage of process trees by process name",
    long_about = "Analyze memory usage of process trees by process name.\n\n\
                  Finds every process whose name matches PROCESS_NAME, rebuilds the process \
                  tree under each match and shows per-process resident memory, the share of \
                  the tree total and the three largest consumers.",
    version,
    propagate_version = true,
    subcommand_negates_reqs = true,
    after_help = "Examples:\n  memon firefox\n  memon --no-color postgres\n  memon -t 5 chrome\n  memon snapshot -o procs.json"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Process name to search for
    #[arg(
        value_parser = NonEmptyStringValueParser::new(),
        required_unless_present_any = ["show_config", "check_config"]
    )]
    pub process_name: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose logging (at least debug level)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Watch mode: re-run the analysis every N seconds
    #[arg(short = 't', long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub watch: Option<i64>,

    /// Log level
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Process table source
    #[arg(long, value_enum)]
    pub source: Option<SourceKind>,

    /// Root of the proc filesystem
    #[arg(long, value_name = "DIR")]
    pub proc_root: Option<PathBuf>,

    /// Snapshot file read by --source snapshot
    #[arg(long, value_name = "FILE")]
    pub snapshot_file: Option<PathBuf>,

    /// Maximum number of processes to scan
    #[arg(long)]
    pub max_processes: Option<usize>,

    /// Pid whose children always start a tree
    #[arg(long)]
    pub init_pid: Option<u32>,

    /// Width of the name column; longer names are truncated
    #[arg(long)]
    pub name_width: Option<usize>,

    /// Number of top consumers listed per tree
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture the process table into a snapshot file
    Snapshot {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long, default_value = "memon-snapshot.json")]
        output: PathBuf,
    },

    /// Check process sources, permissions and configuration
    Check,

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Tests for argument parsing
    // -------------------------------------------------------------------------

    #[test]
    fn test_positional_query_and_flags() {
        let args = Args::try_parse_from(["memon", "--no-color", "-v", "-t", "5", "firefox"]).unwrap();
        assert_eq!(args.process_name.as_deref(), Some("firefox"));
        assert!(args.no_color);
        assert!(args.verbose);
        assert_eq!(args.watch, Some(5));
        assert!(args.command.is_none());
    }

    #[test]
    fn test_negative_watch_is_parsed_for_validation() {
        let args = Args::try_parse_from(["memon", "-t", "-3", "firefox"]).unwrap();
        assert_eq!(args.watch, Some(-3));
    }

    #[test]
    fn test_query_required() {
        assert!(Args::try_parse_from(["memon"]).is_err());
        assert!(Args::try_parse_from(["memon", ""]).is_err());
    }

    #[test]
    fn test_show_config_without_query() {
        let args = Args::try_parse_from(["memon", "--show-config"]).unwrap();
        assert!(args.show_config);
        assert!(args.process_name.is_none());
    }

    #[test]
    fn test_subcommands() {
        let args = Args::try_parse_from(["memon", "snapshot", "-o", "-"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Snapshot { .. })));

        let args = Args::try_parse_from(["memon", "check"]).unwrap();
        assert!(matches!(args.command, Some(Commands::Check)));
    }

    #[test]
    fn test_source_selection() {
        let args = Args::try_parse_from([
            "memon",
            "--source",
            "snapshot",
            "--snapshot-file",
            "procs.json",
            "nginx",
        ])
        .unwrap();
        assert_eq!(args.source, Some(SourceKind::Snapshot));
        assert_eq!(args.snapshot_file, Some(PathBuf::from("procs.json")));
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogLevel::Warn.as_str(), "warn");
    }
}
