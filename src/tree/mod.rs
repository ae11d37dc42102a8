//! Process tree reconstruction and memory ranking.
//!
//! - `registry`: pid-keyed arena, tree building and root selection
//! - `aggregate`: counts, totals, top consumers and rank marking

pub mod aggregate;
pub mod registry;

pub use aggregate::{
    collect_rss, count, mark_ranks, percentage, top3_with_percentage, top_with_percentage,
    total_memory, Rank, RankMap, RankThresholds, TopEntry,
};
pub use registry::{ProcessNode, ProcessRegistry, ProcessTree, TreeEntry};
