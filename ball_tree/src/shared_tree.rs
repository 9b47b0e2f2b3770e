//! Shared-memory tree builder (spec §4.9).
//!
//! Invoked once a process is alone in its communicator team. Builds the
//! local subtree with `rayon::join` fork/join task parallelism, the direct
//! analogue of `ballAlg-mpi.c::finish_tree`'s `#pragma omp task` pair inside
//! a `taskgroup` — `rayon::join`'s implicit join after both closures return
//! is the task-group suspension point described in spec §5.
//!
//! Node ids are assigned positionally, never from a shared counter: the
//! only lock in this module protects the append to [`NodeSink`].

use rand::SeedableRng;

use crate::furthest::local_furthest_pair;
use crate::node::{Node, NodeSink};
use crate::point::point_at;
use crate::select::{median, PivotStrategy};
use crate::vector::{distance, ProjectionBasis};

/// Precomputed task-parallelism budget, the analogue of OpenMP's
/// `max_depth = floor(log2(max_threads))` plus a slack `diff` so that when
/// the thread count isn't a power of two, a few threads get to fork one
/// level deeper than the rest (spec §4.9).
#[derive(Debug, Clone, Copy)]
pub struct TaskBudget {
    pub max_depth: u32,
    pub diff: usize,
}

impl TaskBudget {
    pub fn for_pool(num_threads: usize) -> Self {
        let num_threads = num_threads.max(1);
        let max_depth = (num_threads as f64).log2().floor() as u32;
        let diff = num_threads - (1usize << max_depth);
        TaskBudget { max_depth, diff }
    }

    fn should_fork(&self, depth: u32) -> bool {
        if depth < self.max_depth {
            return true;
        }
        if depth == self.max_depth {
            // One extra level of forking for `diff` of the threads, mirroring
            // `omp_get_thread_num() < diff` — rayon has no stable thread-id
            // API as direct as OpenMP's, so the current worker index from
            // the global pool is used, which is the closest available
            // analogue and is still deterministic per run.
            if let Some(idx) = rayon::current_thread_index() {
                return idx < self.diff;
            }
        }
        false
    }
}

/// Builds the local subtree over `coords`/`index[l..=r]`, rooted at
/// `node_id`, pushing every node it creates into `sink`.
pub fn build(
    coords: &[f64],
    dims: usize,
    index: &mut [usize],
    node_id: i64,
    depth: u32,
    budget: TaskBudget,
    strategy: PivotStrategy,
    sink: &NodeSink,
) {
    if index.len() == 1 {
        let center = point_at(coords, dims, index, 0).to_vec();
        sink.push(Node::leaf(node_id, center));
        return;
    }

    let (a, b) = local_furthest_pair(coords, dims, index);
    let basis = ProjectionBasis::new(&a, &b);

    let mut projections: Vec<Vec<f64>> = (0..index.len())
        .map(|pos| {
            let p = point_at(coords, dims, index, pos);
            let mut out = vec![0.0; dims];
            basis.project_into(p, &a, &mut out);
            out
        })
        .collect();

    let mut rng = rand::rngs::StdRng::seed_from_u64(node_id as u64);
    let mut center = vec![0.0; dims];
    let split_index = median(
        index,
        &mut projections,
        0,
        index.len() - 1,
        strategy,
        &mut rng,
        &mut center,
    );
    drop(projections);

    let mut radius = 0.0f64;
    for pos in 0..index.len() {
        let p = point_at(coords, dims, index, pos);
        let dist = distance(&center, p);
        if dist > radius {
            radius = dist;
        }
    }

    let left_id = node_id + 1;
    let right_id = node_id + 2 * (split_index as i64 + 1);
    sink.push(Node::internal(node_id, left_id, right_id, center, radius));

    let (left_index, right_index) = index.split_at_mut(split_index + 1);

    if budget.should_fork(depth) {
        rayon::join(
            || build(coords, dims, left_index, left_id, depth + 1, budget, strategy, sink),
            || build(coords, dims, right_index, right_id, depth + 1, budget, strategy, sink),
        );
    } else {
        build(coords, dims, left_index, left_id, depth + 1, budget, strategy, sink);
        build(coords, dims, right_index, right_id, depth + 1, budget, strategy, sink);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(dims: usize, coords: &[f64]) -> Vec<Node> {
        let n = coords.len() / dims;
        let mut index: Vec<usize> = (0..n).collect();
        let sink = NodeSink::new();
        let budget = TaskBudget::for_pool(1);
        build(coords, dims, &mut index, 0, 0, budget, PivotStrategy::MedianOfThree, &sink);
        sink.into_vec()
    }

    #[test]
    fn single_point_is_one_leaf() {
        let nodes = collect(2, &[3.0, 4.0]);
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_leaf());
        assert_eq!(nodes[0].id, 0);
        assert_eq!(nodes[0].center, vec![3.0, 4.0]);
    }

    #[test]
    fn two_points_build_root_plus_two_leaves() {
        let nodes = collect(2, &[0.0, 0.0, 2.0, 0.0]);
        assert_eq!(nodes.len(), 3);
        let root = nodes.iter().find(|n| n.id == 0).unwrap();
        assert!(!root.is_leaf());
        assert_eq!(root.center, vec![1.0, 0.0]);
        assert!((root.radius - 1.0).abs() < 1e-9);
    }

    #[test]
    fn node_count_is_2n_minus_1() {
        let n = 17;
        let coords: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let nodes = collect(1, &coords);
        assert_eq!(nodes.len(), 2 * n - 1);
    }

    #[test]
    fn ids_are_unique_and_form_expected_range() {
        let n = 9;
        let coords: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let nodes = collect(1, &coords);
        let mut ids: Vec<i64> = nodes.iter().map(|n| n.id).collect();
        ids.sort_unstable();
        let expected: Vec<i64> = (0..(2 * n as i64 - 1)).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn containment_holds_for_every_internal_node() {
        use std::collections::HashMap;

        let n = 33;
        let coords: Vec<f64> = (0..n).map(|i| (i as f64 * 1.7) % 5.0).collect();
        let nodes = collect(1, &coords);
        let by_id: HashMap<i64, &Node> = nodes.iter().map(|n| (n.id, n)).collect();

        fn descendant_leaves<'a>(node: &'a Node, by_id: &HashMap<i64, &'a Node>, out: &mut Vec<&'a Node>) {
            if node.is_leaf() {
                out.push(node);
            } else {
                descendant_leaves(by_id[&node.left_id], by_id, out);
                descendant_leaves(by_id[&node.right_id], by_id, out);
            }
        }

        for node in nodes.iter().filter(|n| !n.is_leaf()) {
            let mut leaves = Vec::new();
            descendant_leaves(node, &by_id, &mut leaves);
            let mut max_dist = 0.0f64;
            for leaf in &leaves {
                let d = distance(&node.center, &leaf.center);
                assert!(d <= node.radius + 1e-9);
                max_dist = max_dist.max(d);
            }
            assert!((max_dist - node.radius).abs() < 1e-9);
        }
    }
}
