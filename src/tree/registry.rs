//! Process registry and tree reconstruction.
//!
//! The registry is an arena: nodes live in a vector in discovery order, a pid
//! index maps into it, and child lists hold arena indices. Trees are borrowed
//! views rooted at one arena slot, walked iteratively with a visited guard so
//! corrupt parent links cannot loop forever.

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use tracing::debug;

use crate::process::ProcessRecord;

/// One process in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessNode {
    pub pid: u32,
    pub parent_pid: u32,
    pub name: String,
    pub resident_bytes: u64,
    pub virtual_bytes: u64,
    children: Vec<usize>,
}

impl ProcessNode {
    fn from_record(record: ProcessRecord) -> Self {
        Self {
            pid: record.pid,
            parent_pid: record.parent_pid,
            name: record.name,
            resident_bytes: record.resident_bytes,
            virtual_bytes: record.virtual_bytes,
            children: Vec::new(),
        }
    }

    /// Number of directly linked children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

/// All processes discovered in one analysis pass, keyed by pid.
#[derive(Debug, Default, Clone)]
pub struct ProcessRegistry {
    nodes: Vec<ProcessNode>,
    index: HashMap<u32, usize>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from raw records.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ProcessRecord>,
    {
        let mut registry = Self::new();
        for record in records {
            registry.insert(record);
        }
        registry
    }

    /// Inserts a record. A repeated pid replaces the earlier node in place,
    /// keeping its discovery position; returns false in that case.
    pub fn insert(&mut self, record: ProcessRecord) -> bool {
        let node = ProcessNode::from_record(record);
        match self.index.get(&node.pid) {
            Some(&slot) => {
                debug!("Duplicate pid {} in snapshot, keeping the later record", node.pid);
                self.nodes[slot] = node;
                false
            }
            None => {
                self.index.insert(node.pid, self.nodes.len());
                self.nodes.push(node);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.index.contains_key(&pid)
    }

    pub fn get(&self, pid: u32) -> Option<&ProcessNode> {
        self.index.get(&pid).map(|&slot| &self.nodes[slot])
    }

    /// Nodes in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &ProcessNode> {
        self.nodes.iter()
    }

    /// Clears every child list and relinks each node under its parent.
    ///
    /// Idempotent; children keep discovery order. A node naming itself as
    /// parent is left unlinked.
    pub fn link_children(&mut self) {
        for node in &mut self.nodes {
            node.children.clear();
        }

        for slot in 0..self.nodes.len() {
            let (pid, parent_pid) = (self.nodes[slot].pid, self.nodes[slot].parent_pid);
            if pid == parent_pid {
                continue;
            }
            if let Some(&parent_slot) = self.index.get(&parent_pid) {
                self.nodes[parent_slot].children.push(slot);
            }
        }
    }

    /// Relinks the whole registry and returns the tree rooted at `root_pid`.
    pub fn build_tree(&mut self, root_pid: u32) -> Option<ProcessTree<'_>> {
        if !self.contains(root_pid) {
            return None;
        }
        self.link_children();
        self.tree(root_pid)
    }

    /// Tree rooted at `root_pid` using the current child links.
    pub fn tree(&self, root_pid: u32) -> Option<ProcessTree<'_>> {
        self.index.get(&root_pid).map(|&root| ProcessTree {
            registry: self,
            root,
        })
    }

    /// Selects the roots among `matching_pids`.
    ///
    /// A matching pid is a root if its parent is not itself matching, is the
    /// init sentinel, or is missing from the registry. The sentinel rule only
    /// applies while the sentinel pid is not matching itself; otherwise its
    /// children belong to its tree. Pids absent from the registry are
    /// ignored; order follows `matching_pids`.
    pub fn find_roots(&self, matching_pids: &[u32], init_pid: u32) -> Vec<u32> {
        let matching: HashSet<u32> = matching_pids.iter().copied().collect();
        let sentinel_is_root = !matching.contains(&init_pid);

        matching_pids
            .iter()
            .copied()
            .filter(|pid| match self.get(*pid) {
                Some(node) => {
                    !matching.contains(&node.parent_pid)
                        || (sentinel_is_root && node.parent_pid == init_pid)
                        || !self.contains(node.parent_pid)
                }
                None => false,
            })
            .collect()
    }
}

/// A process and everything reachable from it through child links.
#[derive(Debug, Clone, Copy)]
pub struct ProcessTree<'a> {
    registry: &'a ProcessRegistry,
    root: usize,
}

/// One node of a depth-first walk.
#[derive(Debug, Clone)]
pub struct TreeEntry<'a> {
    pub node: &'a ProcessNode,
    pub depth: usize,
    /// For each level from 1 to `depth`: whether the ancestor (or the node
    /// itself, last element) is the last child of its parent.
    pub last_path: Vec<bool>,
}

impl<'a> ProcessTree<'a> {
    pub fn root(&self) -> &'a ProcessNode {
        &self.registry.nodes[self.root]
    }

    /// Direct children as trees of their own.
    pub fn children(&self) -> impl Iterator<Item = ProcessTree<'a>> + 'a {
        let registry = self.registry;
        registry.nodes[self.root]
            .children
            .iter()
            .map(move |&slot| ProcessTree { registry, root: slot })
    }

    /// Depth-first pre-order walk; every reachable node is visited once.
    pub fn walk(&self) -> Vec<TreeEntry<'a>> {
        let nodes = &self.registry.nodes;
        let mut visited = vec![false; nodes.len()];
        let mut out = Vec::new();
        let mut stack: Vec<(usize, Vec<bool>)> = vec![(self.root, Vec::new())];

        while let Some((slot, last_path)) = stack.pop() {
            if visited[slot] {
                debug!("Cycle detected at pid {}, not descending again", nodes[slot].pid);
                continue;
            }
            visited[slot] = true;

            let node = &nodes[slot];
            let child_count = node.children.len();
            for (i, &child) in node.children.iter().enumerate().rev() {
                let mut child_path = last_path.clone();
                child_path.push(i + 1 == child_count);
                stack.push((child, child_path));
            }

            out.push(TreeEntry {
                node,
                depth: last_path.len(),
                last_path,
            });
        }

        out
    }

    /// Nodes of the tree in pre-order.
    pub fn nodes(&self) -> Vec<&'a ProcessNode> {
        self.walk().into_iter().map(|e| e.node).collect()
    }
}
