//! Whole-pipeline properties: order independence, symmetry, idempotence

use std::collections::BTreeSet;

use itertools::Itertools;
use rstest::{fixture, rstest};

use hiergraph::application::HierarchyDocument;
use hiergraph::domain::{
    BuildOptions, DependencyGraph, HierarchyBuilder, NodeKind, Record, ReferenceLinker,
};
use hiergraph::util::testing;

fn record(name: &str, imports: &[&str]) -> Record {
    Record::new(name, imports.iter().copied())
}

fn pipeline(records: &[Record], options: BuildOptions) -> DependencyGraph {
    let built = HierarchyBuilder::with_options(options).build(records).unwrap();
    ReferenceLinker::new().link(built.tree).unwrap()
}

/// `(child path, parent path)` for every non-root node.
fn structure(graph: &DependencyGraph) -> BTreeSet<(String, String)> {
    let tree = graph.tree();
    tree.iter()
        .filter_map(|(idx, node)| {
            let parent = node.parent?;
            Some((tree.qualified_path(idx)?, tree.qualified_path(parent)?))
        })
        .collect()
}

fn leaf_paths(graph: &DependencyGraph) -> Vec<String> {
    graph
        .leaves()
        .iter()
        .filter_map(|&leaf| graph.qualified_path(leaf))
        .collect()
}

#[fixture]
fn batch() -> Vec<Record> {
    vec![
        record("lib.net.http", &["lib.core.io", "lib.net.tcp"]),
        record("lib.net.tcp", &["lib.core.io"]),
        record("lib.core.io", &[]),
        record("lib.app", &["lib.net.http", "lib.core.io", "lib.missing"]),
    ]
}

#[rstest]
fn given_any_record_order_when_building_then_result_is_identical(batch: Vec<Record>) {
    testing::init_test_setup();
    let reference = pipeline(&batch, BuildOptions::default());

    for permutation in batch.iter().cloned().permutations(batch.len()) {
        let graph = pipeline(&permutation, BuildOptions::default());
        assert_eq!(structure(&graph), structure(&reference));
        assert_eq!(leaf_paths(&graph), leaf_paths(&reference));
        assert_eq!(
            graph.edge_paths().into_iter().sorted().collect_vec(),
            reference.edge_paths().into_iter().sorted().collect_vec()
        );
        assert_eq!(graph.dangling().len(), reference.dangling().len());
    }
}

#[rstest]
fn given_unsorted_build_when_permuting_then_structure_still_matches(batch: Vec<Record>) {
    let options = BuildOptions {
        sort_children: false,
        ..BuildOptions::default()
    };
    let reference = pipeline(&batch, options.clone());

    for permutation in batch.iter().cloned().permutations(batch.len()) {
        let graph = pipeline(&permutation, options.clone());
        assert_eq!(structure(&graph), structure(&reference));
    }
}

#[rstest]
fn given_linked_graph_when_counting_then_every_resolvable_import_is_an_edge(batch: Vec<Record>) {
    let graph = pipeline(&batch, BuildOptions::default());

    for rec in &batch {
        let leaf = graph.find_leaf(&rec.name).unwrap();
        let resolvable = rec
            .imports
            .iter()
            .filter(|import| graph.find_leaf(import).is_some())
            .count();
        assert_eq!(graph.outgoing(leaf).count(), resolvable, "{}", rec.name);
    }
    assert_eq!(graph.edges().len(), 5);
    assert_eq!(graph.dangling().len(), 1);
}

#[rstest]
fn given_linked_graph_when_walking_lists_then_every_edge_appears_at_both_ends(batch: Vec<Record>) {
    let graph = pipeline(&batch, BuildOptions::default());

    for &leaf in graph.leaves() {
        let node = graph.node(leaf).unwrap();
        for &id in node.outgoing() {
            let edge = graph.edge(id).unwrap();
            assert_eq!(edge.source, leaf);
            assert!(graph.node(edge.target).unwrap().incoming().contains(&id));
        }
        for &id in node.incoming() {
            let edge = graph.edge(id).unwrap();
            assert_eq!(edge.target, leaf);
            assert!(graph.node(edge.source).unwrap().outgoing().contains(&id));
        }
    }
}

#[rstest]
fn given_same_batch_when_building_twice_then_outputs_are_equal(batch: Vec<Record>) {
    let first = pipeline(&batch, BuildOptions::default());
    let second = pipeline(&batch, BuildOptions::default());

    assert_eq!(
        HierarchyDocument::from_tree(first.tree()),
        HierarchyDocument::from_tree(second.tree())
    );
    assert_eq!(first.edge_paths(), second.edge_paths());
    assert_eq!(first.dangling(), second.dangling());
}

#[rstest]
#[case(".", vec!["a.b.c", "a.b.d", "a.e", "f"])]
#[case("/", vec!["a/b/c", "a/b/d", "a/e", "f"])]
#[case("::", vec!["a::b::c", "a::b", "a::e"])]
fn given_records_when_building_then_record_nodes_keep_their_names(
    #[case] delimiter: &str,
    #[case] names: Vec<&str>,
) {
    let options = BuildOptions {
        delimiter: delimiter.to_string(),
        ..BuildOptions::default()
    };
    let records: Vec<Record> = names.iter().map(|name| record(name, &[])).collect();

    let graph = pipeline(&records, options);

    let tree = graph.tree();
    let rebuilt: BTreeSet<String> = tree
        .iter()
        .filter(|(_, node)| node.data.kind == NodeKind::Record)
        .filter_map(|(idx, _)| tree.qualified_path(idx))
        .collect();
    let expected: BTreeSet<String> = names.iter().map(|name| name.to_string()).collect();
    assert_eq!(rebuilt, expected);
    for (_, node) in tree.iter() {
        if node.data.kind != NodeKind::Umbrella {
            assert!(!node.data.segment.contains(delimiter));
        }
    }
}

#[rstest]
fn given_linked_graph_when_counting_parents_then_every_node_has_exactly_one(batch: Vec<Record>) {
    let mut records = batch;
    records.push(record("other.tool", &["lib.core.io"]));
    let graph = pipeline(&records, BuildOptions::default());

    let tree = graph.tree();
    let root = tree.root().unwrap();
    let mut seen = 0;
    for (idx, node) in tree.iter() {
        seen += 1;
        let holders = tree
            .iter()
            .filter(|(_, other)| other.children.contains(&idx))
            .map(|(holder, _)| holder)
            .collect_vec();
        if idx == root {
            assert!(holders.is_empty());
            assert!(node.parent.is_none());
        } else {
            assert_eq!(holders.len(), 1, "{:?}", tree.qualified_path(idx));
            assert_eq!(node.parent, Some(holders[0]));
        }
    }
    assert_eq!(seen, tree.len());
}
