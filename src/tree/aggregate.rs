//! Tree-wide memory aggregates and rank marking.

use ahash::AHashMap as HashMap;
use serde::Serialize;

use super::registry::ProcessTree;

/// Number of processes in the tree, root included.
pub fn count(tree: &ProcessTree<'_>) -> usize {
    tree.walk().len()
}

/// Sum of resident memory over the whole tree.
pub fn total_memory(tree: &ProcessTree<'_>) -> u64 {
    tree.walk()
        .iter()
        .fold(0u64, |acc, e| acc.saturating_add(e.node.resident_bytes))
}

/// Resident memory of every node, in walk order. Duplicates are kept.
pub fn collect_rss(tree: &ProcessTree<'_>) -> Vec<u64> {
    tree.walk().iter().map(|e| e.node.resident_bytes).collect()
}

/// Share of `total` taken by `value`, in percent. Zero when `total` is zero.
pub fn percentage(value: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        value as f64 * 100.0 / total as f64
    }
}

/// One of the largest memory consumers in a tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopEntry {
    pub pid: u32,
    pub name: String,
    pub resident_bytes: u64,
    pub percentage: f64,
}

/// The `n` largest consumers by resident memory.
///
/// Ties keep walk order.
pub fn top_with_percentage(tree: &ProcessTree<'_>, total: u64, n: usize) -> Vec<TopEntry> {
    let mut nodes = tree.nodes();
    nodes.sort_by(|a, b| b.resident_bytes.cmp(&a.resident_bytes));
    nodes
        .into_iter()
        .take(n)
        .map(|node| TopEntry {
            pid: node.pid,
            name: node.name.clone(),
            resident_bytes: node.resident_bytes,
            percentage: percentage(node.resident_bytes, total),
        })
        .collect()
}

pub fn top3_with_percentage(tree: &ProcessTree<'_>, total: u64) -> Vec<TopEntry> {
    top_with_percentage(tree, total, 3)
}

/// Memory rank of a node within its tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    First,
    Second,
    Third,
}

impl Rank {
    pub fn glyph(self) -> &'static str {
        match self {
            Rank::First => "🥇",
            Rank::Second => "🥈",
            Rank::Third => "🥉",
        }
    }
}

/// The three distinct memory levels of a tree. A level that does not exist
/// is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankThresholds {
    pub first: u64,
    pub second: u64,
    pub third: u64,
}

impl RankThresholds {
    pub fn from_values(values: &[u64]) -> Self {
        let first = match values.iter().max() {
            Some(&v) => v,
            None => return Self::default(),
        };

        let rest: Vec<u64> = values.iter().copied().filter(|&v| v != first).collect();
        let second = rest.iter().copied().max().unwrap_or(0);

        let third = if rest.is_empty() {
            0
        } else {
            rest.iter().copied().filter(|&v| v != second).max().unwrap_or(0)
        };

        Self {
            first,
            second,
            third,
        }
    }

    /// Rank of a node holding `value`. Every tie at a level gets that rank;
    /// levels two and three need a non-zero threshold.
    pub fn rank_of(&self, value: u64) -> Option<Rank> {
        if value == self.first {
            Some(Rank::First)
        } else if value == self.second && self.second > 0 {
            Some(Rank::Second)
        } else if value == self.third && self.third > 0 {
            Some(Rank::Third)
        } else {
            None
        }
    }
}

/// Ranks by pid for one tree.
pub type RankMap = HashMap<u32, Rank>;

/// Computes the rank of every node in the tree.
pub fn mark_ranks(tree: &ProcessTree<'_>) -> RankMap {
    let thresholds = RankThresholds::from_values(&collect_rss(tree));
    tree.walk()
        .iter()
        .filter_map(|e| {
            thresholds
                .rank_of(e.node.resident_bytes)
                .map(|rank| (e.node.pid, rank))
        })
        .collect()
}
