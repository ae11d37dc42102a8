//! memon - process tree memory analyzer
//!
//! Finds processes whose name matches a query, rebuilds the process tree
//! under each match and ranks every tree member by resident memory.
//!
//! # Usage
//!
//! ```rust
//! use memon::analysis::{analyze, AnalysisOptions, AnalysisOutcome};
//! use memon::process::ProcessRecord;
//!
//! let records = vec![
//!     ProcessRecord::new(1, 0, "root", 10 * 1024 * 1024, 0),
//!     ProcessRecord::new(2, 1, "root", 50 * 1024 * 1024, 0),
//!     ProcessRecord::new(3, 1, "root", 5 * 1024 * 1024, 0),
//! ];
//!
//! let outcome = analyze(records, "root", &AnalysisOptions::default());
//! if let AnalysisOutcome::Trees { trees, .. } = &outcome {
//!     assert_eq!(trees.len(), 1);
//!     assert_eq!(trees[0].summary.process_count, 3);
//!     assert_eq!(trees[0].summary.top[0].pid, 2);
//! }
//! assert!(outcome.is_success());
//! ```

pub mod analysis;
pub mod format;
pub mod process;
pub mod tree;

pub use analysis::{analyze, AnalysisOptions, AnalysisOutcome, ReportRow, TreeReport, TreeSummary};
pub use format::format_memory;
pub use process::{ProcessRecord, ProcessSource, SourceError, SourceKind};
