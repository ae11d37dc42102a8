//! One analysis pass: records in, per-tree reports out.
//!
//! `analyze` builds the registry from a full process snapshot, selects the
//! processes whose name matches the query, finds the roots among them and
//! produces a `TreeReport` for each root. Nothing here touches the terminal;
//! rendering consumes the outcome.

use serde::Serialize;
use tracing::{debug, warn};

use crate::process::{matches, ProcessRecord};
use crate::tree::{
    mark_ranks, percentage, top3_with_percentage, top_with_percentage, total_memory, ProcessRegistry,
    ProcessTree, Rank, TopEntry,
};

/// Pid of the init process; its children are always tree roots.
pub const DEFAULT_INIT_PID: u32 = 1;

/// Number of top consumers listed per tree.
pub const DEFAULT_TOP_N: usize = 3;

/// Tunables for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub init_pid: u32,
    pub top_n: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            init_pid: DEFAULT_INIT_PID,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// One line of a rendered tree, in depth-first order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub pid: u32,
    pub name: String,
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
    pub depth: usize,
    /// Whether each ancestor level (and the row itself, last) closes its
    /// sibling list. Drives the tree guides.
    pub last_path: Vec<bool>,
    pub rank: Option<Rank>,
    /// Share of the tree total.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeSummary {
    pub process_count: usize,
    pub total_memory: u64,
    pub average_memory: u64,
    /// The `top_n` largest consumers.
    pub top: Vec<TopEntry>,
    /// Combined memory of the three largest consumers.
    pub top3_memory: u64,
    pub top3_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeReport {
    pub root_pid: u32,
    pub root_name: String,
    pub rows: Vec<ReportRow>,
    pub summary: TreeSummary,
}

/// Result of one pass.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// No process name matched the query.
    NoMatch,
    /// Processes matched but none qualified as a root.
    NoRoot { matched: usize },
    Trees {
        matched: usize,
        trees: Vec<TreeReport>,
        /// Roots whose tree could not be built.
        unbuilt: Vec<u32>,
    },
}

impl AnalysisOutcome {
    /// True when at least one tree was analyzed.
    pub fn is_success(&self) -> bool {
        matches!(self, AnalysisOutcome::Trees { trees, .. } if !trees.is_empty())
    }
}

/// Pids in `registry` whose name matches `query`, in discovery order.
pub fn matching_pids(registry: &ProcessRegistry, query: &str) -> Vec<u32> {
    registry
        .iter()
        .filter(|node| matches(&node.name, query))
        .map(|node| node.pid)
        .collect()
}

/// Runs a full pass over `records`.
pub fn analyze<I>(records: I, query: &str, options: &AnalysisOptions) -> AnalysisOutcome
where
    I: IntoIterator<Item = ProcessRecord>,
{
    let mut registry = ProcessRegistry::from_records(records);
    debug!("Registry holds {} processes", registry.len());

    let matching = matching_pids(&registry, query);
    if matching.is_empty() {
        debug!("No process matched '{}'", query);
        return AnalysisOutcome::NoMatch;
    }

    let roots = registry.find_roots(&matching, options.init_pid);
    debug!(
        "{} matching processes, {} roots: {:?}",
        matching.len(),
        roots.len(),
        roots
    );
    if roots.is_empty() {
        return AnalysisOutcome::NoRoot {
            matched: matching.len(),
        };
    }

    let mut trees = Vec::with_capacity(roots.len());
    let mut unbuilt = Vec::new();
    for root in roots {
        match registry.build_tree(root) {
            Some(tree) => trees.push(analyze_tree(&tree, options.top_n)),
            None => {
                warn!("Could not build process tree for PID {}", root);
                unbuilt.push(root);
            }
        }
    }

    AnalysisOutcome::Trees {
        matched: matching.len(),
        trees,
        unbuilt,
    }
}

/// Aggregates and ranks one built tree.
pub fn analyze_tree(tree: &ProcessTree<'_>, top_n: usize) -> TreeReport {
    let ranks = mark_ranks(tree);
    let total = total_memory(tree);

    let rows: Vec<ReportRow> = tree
        .walk()
        .into_iter()
        .map(|entry| ReportRow {
            pid: entry.node.pid,
            name: entry.node.name.clone(),
            resident_bytes: entry.node.resident_bytes,
            virtual_bytes: entry.node.virtual_bytes,
            depth: entry.depth,
            last_path: entry.last_path,
            rank: ranks.get(&entry.node.pid).copied(),
            percentage: percentage(entry.node.resident_bytes, total),
        })
        .collect();

    let process_count = rows.len();
    let top3 = top3_with_percentage(tree, total);
    let top3_memory = top3.iter().map(|t| t.resident_bytes).sum();

    let summary = TreeSummary {
        process_count,
        total_memory: total,
        average_memory: if process_count == 0 {
            0
        } else {
            total / process_count as u64
        },
        top: top_with_percentage(tree, total, top_n),
        top3_memory,
        top3_percentage: percentage(top3_memory, total),
    };

    let root = tree.root();
    TreeReport {
        root_pid: root.pid,
        root_name: root.name.clone(),
        rows,
        summary,
    }
}
