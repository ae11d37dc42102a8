//! Integration tests for the analysis pipeline.
//!
//! These tests drive `analyze` with hand-built process tables and check
//! root selection, tree aggregates and ranking end to end.

use memon::analysis::{analyze, AnalysisOptions, AnalysisOutcome, TreeReport};
use memon::format::format_memory;
use memon::process::ProcessRecord;
use memon::tree::{count, total_memory, ProcessRegistry, Rank};

const MB: u64 = 1024 * 1024;

/// Helper to build a record with zero virtual memory.
fn rec(pid: u32, ppid: u32, name: &str, rss: u64) -> ProcessRecord {
    ProcessRecord::new(pid, ppid, name, rss, 0)
}

/// Helper to unwrap the tree list of a successful outcome.
fn trees(outcome: AnalysisOutcome) -> Vec<TreeReport> {
    match outcome {
        AnalysisOutcome::Trees { trees, .. } => trees,
        other => panic!("expected trees, got {other:?}"),
    }
}

#[test]
fn test_end_to_end_single_tree() {
    let outcome = analyze(
        vec![
            rec(1, 0, "root", 10 * MB),
            rec(2, 1, "root", 50 * MB),
            rec(3, 1, "root", 5 * MB),
        ],
        "root",
        &AnalysisOptions::default(),
    );
    assert!(outcome.is_success());

    let trees = trees(outcome);
    assert_eq!(trees.len(), 1);

    let tree = &trees[0];
    assert_eq!(tree.root_pid, 1);
    assert_eq!(tree.summary.process_count, 3);
    assert_eq!(tree.summary.total_memory, 65 * MB);
    assert_eq!(format_memory(tree.summary.total_memory), "65.0MB");

    let top = &tree.summary.top[0];
    assert_eq!(top.pid, 2);
    assert!((top.percentage - 76.923).abs() < 0.01);
}

#[test]
fn test_roots_exclude_matching_descendants() {
    let outcome = analyze(
        vec![
            rec(1, 0, "init", MB),
            rec(10, 1, "worker", MB),
            rec(20, 10, "worker", MB),
            rec(30, 1, "worker", MB),
        ],
        "worker",
        &AnalysisOptions::default(),
    );

    let roots: Vec<u32> = trees(outcome).iter().map(|t| t.root_pid).collect();
    assert_eq!(roots, vec![10, 30]);
}

#[test]
fn test_tree_includes_non_matching_children() {
    let outcome = analyze(
        vec![
            rec(1, 0, "init", MB),
            rec(100, 1, "postgres", 20 * MB),
            rec(101, 100, "checkpointer", 3 * MB),
            rec(102, 100, "walwriter", 2 * MB),
            rec(200, 1, "nginx", 9 * MB),
        ],
        "postgres",
        &AnalysisOptions::default(),
    );

    let trees = trees(outcome);
    assert_eq!(trees.len(), 1);
    let names: Vec<&str> = trees[0].rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["postgres", "checkpointer", "walwriter"]);
    assert_eq!(trees[0].summary.total_memory, 25 * MB);
}

#[test]
fn test_ranking_with_ties() {
    let outcome = analyze(
        vec![
            rec(1, 0, "app", 100),
            rec(2, 1, "app", 100),
            rec(3, 1, "app", 50),
            rec(4, 1, "app", 10),
        ],
        "app",
        &AnalysisOptions::default(),
    );

    let trees = trees(outcome);
    assert_eq!(trees.len(), 1);
    let ranks: Vec<Option<Rank>> = trees[0].rows.iter().map(|r| r.rank).collect();
    assert_eq!(
        ranks,
        vec![
            Some(Rank::First),
            Some(Rank::First),
            Some(Rank::Second),
            Some(Rank::Third)
        ]
    );
}

#[test]
fn test_single_process_has_only_first_rank() {
    let trees = trees(analyze(
        vec![rec(7, 1, "solo", 100)],
        "solo",
        &AnalysisOptions::default(),
    ));
    assert_eq!(trees[0].rows.len(), 1);
    assert_eq!(trees[0].rows[0].rank, Some(Rank::First));
    assert_eq!(trees[0].summary.top.len(), 1);
}

#[test]
fn test_count_and_total_induction() {
    let mut registry = ProcessRegistry::from_records(vec![
        rec(1, 0, "a", 1),
        rec(2, 1, "b", 2),
        rec(3, 2, "c", 4),
        rec(4, 2, "d", 8),
        rec(5, 1, "e", 16),
    ]);
    let tree = registry.build_tree(1).unwrap();

    let child_counts: usize = tree.children().map(|c| count(&c)).sum();
    let child_totals: u64 = tree.children().map(|c| total_memory(&c)).sum();

    assert_eq!(count(&tree), 1 + child_counts);
    assert_eq!(total_memory(&tree), tree.root().resident_bytes + child_totals);
    assert_eq!(total_memory(&tree), 31);
}

#[test]
fn test_fuzzy_query_finds_truncated_name() {
    let outcome = analyze(
        vec![rec(50, 1, "firefoxdevelope", 30 * MB)],
        "firefoxdeveloper-edition",
        &AnalysisOptions::default(),
    );
    assert!(outcome.is_success());
}

#[test]
fn test_corrupt_cycle_outside_matches_is_harmless() {
    let outcome = analyze(
        vec![
            rec(10, 1, "svc", MB),
            rec(11, 12, "loop", MB),
            rec(12, 11, "loop", MB),
        ],
        "svc",
        &AnalysisOptions::default(),
    );
    let trees = trees(outcome);
    assert_eq!(trees[0].summary.process_count, 1);
}

#[test]
fn test_no_match_and_no_root_are_failures() {
    let no_match = analyze(vec![rec(1, 0, "init", MB)], "nope", &AnalysisOptions::default());
    assert_eq!(no_match, AnalysisOutcome::NoMatch);
    assert!(!no_match.is_success());

    let no_root = analyze(
        vec![rec(2, 3, "spin", MB), rec(3, 2, "spin", MB)],
        "spin",
        &AnalysisOptions::default(),
    );
    assert_eq!(no_root, AnalysisOutcome::NoRoot { matched: 2 });
}
