//! Property-based checks of spec.md §8's invariants over the
//! shared-memory path (`P = 1`), where they can run without `mpirun`.
//! The distributed-phase counterparts of these same invariants (table
//! rows 4-5, process-crossing scenarios) are exercised by the
//! `distributed_tests` binary crate instead.

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use ball_tree::generator::generate_points;
use ball_tree::node::{Node, NodeSink, NONE};
use ball_tree::order::lexicographic_cmp;
use ball_tree::select::PivotStrategy;
use ball_tree::shared_tree::{build, TaskBudget};
use ball_tree::vector::distance;

fn build_tree(dims: usize, n: usize, seed: u64) -> Vec<Node> {
    let shard = generate_points(dims, n, seed);
    let coords = shard.coords().to_vec();
    let mut index: Vec<usize> = (0..n).collect();
    let sink = NodeSink::new();
    let budget = TaskBudget::for_pool(1);
    build(&coords, dims, &mut index, 0, 0, budget, PivotStrategy::MedianOfThree, &sink);
    sink.into_vec()
}

fn descendant_leaves<'a>(node: &'a Node, by_id: &HashMap<i64, &'a Node>, out: &mut Vec<&'a Node>) {
    if node.is_leaf() {
        out.push(node);
    } else {
        descendant_leaves(by_id[&node.left_id], by_id, out);
        descendant_leaves(by_id[&node.right_id], by_id, out);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn node_count_and_id_uniqueness_hold(dims in 1usize..5, n in 1usize..60, seed in any::<u64>()) {
        let nodes = build_tree(dims, n, seed);
        prop_assert_eq!(nodes.len(), 2 * n - 1);

        let ids: HashSet<i64> = nodes.iter().map(|node| node.id).collect();
        prop_assert_eq!(ids.len(), nodes.len());
        for expected in 0..(2 * n as i64 - 1) {
            prop_assert!(ids.contains(&expected));
        }
    }

    #[test]
    fn containment_holds_for_every_internal_node(dims in 1usize..5, n in 2usize..60, seed in any::<u64>()) {
        let nodes = build_tree(dims, n, seed);
        let by_id: HashMap<i64, &Node> = nodes.iter().map(|node| (node.id, node)).collect();

        for node in nodes.iter().filter(|node| !node.is_leaf()) {
            let mut leaves = Vec::new();
            descendant_leaves(node, &by_id, &mut leaves);
            let mut max_dist = 0.0f64;
            for leaf in &leaves {
                let d = distance(&node.center, &leaf.center);
                prop_assert!(d <= node.radius + 1e-9);
                max_dist = max_dist.max(d);
            }
            prop_assert!((max_dist - node.radius).abs() < 1e-9);
        }
    }

    #[test]
    fn leaf_multiset_equals_input_points(dims in 1usize..5, n in 1usize..60, seed in any::<u64>()) {
        let shard = generate_points(dims, n, seed);
        let mut expected: Vec<Vec<f64>> = (0..shard.len()).map(|i| shard.point(i).to_vec()).collect();

        let coords = shard.coords().to_vec();
        let mut index: Vec<usize> = (0..n).collect();
        let sink = NodeSink::new();
        let budget = TaskBudget::for_pool(1);
        build(&coords, dims, &mut index, 0, 0, budget, PivotStrategy::MedianOfThree, &sink);
        let nodes = sink.into_vec();

        let mut got: Vec<Vec<f64>> = nodes.iter().filter(|node| node.left_id == NONE && node.right_id == NONE)
            .map(|node| node.center.clone())
            .collect();

        got.sort_by(|a, b| lexicographic_cmp(a, b));
        expected.sort_by(|a, b| lexicographic_cmp(a, b));
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn identical_seeds_are_deterministic(dims in 1usize..5, n in 1usize..60, seed in any::<u64>()) {
        let a = build_tree(dims, n, seed);
        let b = build_tree(dims, n, seed);
        prop_assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            prop_assert_eq!(x.id, y.id);
            prop_assert_eq!(x.left_id, y.left_id);
            prop_assert_eq!(x.right_id, y.right_id);
            prop_assert_eq!(&x.center, &y.center);
            prop_assert!((x.radius - y.radius).abs() < 1e-12);
        }
    }
}
