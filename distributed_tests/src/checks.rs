//! Distributed invariant checks, run under `mpirun`.
//!
//! Same shape as a sample-sort correctness check (generate input, run the
//! distributed algorithm, gather results at rank 0, assert), but
//! exercising the ball-tree invariants of spec.md §8 across whatever
//! process count the job is launched with. Rank 0 owns every assertion;
//! other ranks only participate in the collectives.

use std::collections::{HashMap, HashSet};

use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::{Color, SystemCommunicator};
use mpi::traits::*;
use mpi::Count;

use ball_tree::generator::generate_points;
use ball_tree::node::{Node, NodeSink, NONE};
use ball_tree::order::lexicographic_cmp;
use ball_tree::point::Shard;
use ball_tree::vector::distance;
use ball_tree::distributed_tree;

fn flatten(nodes: &[Node], dims: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(nodes.len() * (4 + dims));
    for n in nodes {
        out.push(n.id as f64);
        out.push(n.left_id as f64);
        out.push(n.right_id as f64);
        out.push(n.radius);
        out.extend_from_slice(&n.center);
    }
    out
}

fn unflatten(flat: &[f64], dims: usize) -> Vec<Node> {
    flat.chunks(4 + dims)
        .map(|chunk| Node {
            id: chunk[0] as i64,
            left_id: chunk[1] as i64,
            right_id: chunk[2] as i64,
            radius: chunk[3],
            center: chunk[4..].to_vec(),
        })
        .collect()
}

/// Splits `n_points` contiguously and deterministically across the first
/// `n_points.min(size)` ranks of `world`, builds the tree over the reduced
/// team, and gathers the union of per-rank node sinks at rank 0. Returns
/// `Some(nodes)` at rank 0, `None` everywhere else.
fn build_and_gather(world: &SystemCommunicator, n_dims: usize, n_points: usize, seed: u64) -> Option<Vec<Node>> {
    let rank = world.rank();
    let size = world.size();
    let active_ranks = n_points.min(size as usize);
    let active = (rank as usize) < active_ranks;

    let all_points = generate_points(n_dims, n_points, seed);
    let base = n_points / active_ranks;
    let remainder = n_points % active_ranks;
    let counts: Vec<usize> = (0..size as usize)
        .map(|r| if r < active_ranks { base + if r < remainder { 1 } else { 0 } } else { 0 })
        .collect();
    let offset: usize = counts[..rank as usize].iter().sum();
    let count = counts[rank as usize];

    let shard = if count == 0 {
        Shard::empty(n_dims)
    } else {
        let coords: Vec<f64> = (offset..offset + count).flat_map(|i| all_points.point(i).to_vec()).collect();
        Shard::from_coords(n_dims, coords)
    };

    let reduced = world.split_by_color(if active { Color::with_value(0) } else { Color::undefined() });

    let sink = NodeSink::new();
    if let Some(team) = reduced {
        distributed_tree::build(team, shard, n_points, 0, &sink);
    }
    let local_nodes = sink.into_vec();
    let local_flat = flatten(&local_nodes, n_dims);
    let send_count = local_flat.len() as Count;

    let mut counts = vec![0 as Count; size as usize];
    let root = world.process_at_rank(0);
    if rank == 0 {
        root.gather_into_root(&send_count, &mut counts[..]);
    } else {
        root.gather_into(&send_count);
    }

    if rank == 0 {
        let total: Count = counts.iter().sum();
        let mut displs = vec![0 as Count; size as usize];
        let mut sum = 0 as Count;
        for i in 0..size as usize {
            displs[i] = sum;
            sum += counts[i];
        }
        let mut buf = vec![0.0f64; total as usize];
        {
            let mut recv_partition = PartitionMut::new(&mut buf[..], counts.clone(), &displs[..]);
            root.gather_varcount_into_root(&local_flat[..], &mut recv_partition);
        }
        Some(unflatten(&buf, n_dims))
    } else {
        root.gather_varcount_into(&local_flat[..]);
        None
    }
}

fn assert_invariants(nodes: &[Node], n_points: usize, all_points: &Shard) {
    assert_eq!(nodes.len(), 2 * n_points - 1, "node count must be 2N-1");

    let ids: HashSet<i64> = nodes.iter().map(|n| n.id).collect();
    assert_eq!(ids.len(), nodes.len(), "ids must be unique");
    for expected in 0..(2 * n_points as i64 - 1) {
        assert!(ids.contains(&expected), "missing id {}", expected);
    }

    let by_id: HashMap<i64, &Node> = nodes.iter().map(|n| (n.id, n)).collect();
    fn descendant_leaves<'a>(node: &'a Node, by_id: &HashMap<i64, &'a Node>, out: &mut Vec<&'a Node>) {
        if node.left_id == NONE && node.right_id == NONE {
            out.push(node);
        } else {
            descendant_leaves(by_id[&node.left_id], by_id, out);
            descendant_leaves(by_id[&node.right_id], by_id, out);
        }
    }
    for node in nodes.iter().filter(|n| n.left_id != NONE || n.right_id != NONE) {
        let mut leaves = Vec::new();
        descendant_leaves(node, &by_id, &mut leaves);
        let mut max_dist = 0.0f64;
        for leaf in &leaves {
            let d = distance(&node.center, &leaf.center);
            assert!(d <= node.radius + 1e-6, "containment violated at node {}", node.id);
            max_dist = max_dist.max(d);
        }
        assert!((max_dist - node.radius).abs() < 1e-6, "no leaf achieves equality at node {}", node.id);
    }

    let mut got: Vec<Vec<f64>> = nodes
        .iter()
        .filter(|n| n.left_id == NONE && n.right_id == NONE)
        .map(|n| n.center.clone())
        .collect();
    let mut expected: Vec<Vec<f64>> = (0..all_points.len()).map(|i| all_points.point(i).to_vec()).collect();
    got.sort_by(|a, b| lexicographic_cmp(a, b));
    expected.sort_by(|a, b| lexicographic_cmp(a, b));
    assert_eq!(got, expected, "leaf centers must equal the input multiset");
}

/// Scenario covering spec.md §8 table rows 4-5: a point count well above
/// the process count, exercising several distributed-phase recursion
/// levels before handoff to the shared-memory builder.
pub fn check_scenario(world: &SystemCommunicator, n_dims: usize, n_points: usize, seed: u64) {
    let rank = world.rank();
    let all_points = generate_points(n_dims, n_points, seed);
    if let Some(nodes) = build_and_gather(world, n_dims, n_points, seed) {
        assert_invariants(&nodes, n_points, &all_points);
        println!(
            "rank {}: scenario d={} N={} seed={} OK ({} nodes)",
            rank,
            n_dims,
            n_points,
            seed,
            nodes.len()
        );
    }
    world.barrier();
}

/// Invariant 6 (determinism): two distributed runs with identical
/// `(n_dims, n_points, seed, P)` must produce byte-identical output.
pub fn check_determinism(world: &SystemCommunicator, n_dims: usize, n_points: usize, seed: u64) {
    let rank = world.rank();
    let first = build_and_gather(world, n_dims, n_points, seed);
    let second = build_and_gather(world, n_dims, n_points, seed);

    if rank == 0 {
        let first = first.unwrap();
        let second = second.unwrap();
        let flat_a = flatten(&first, n_dims);
        let flat_b = flatten(&second, n_dims);
        assert_eq!(flat_a, flat_b, "two identically-seeded runs must match exactly");
        println!("rank 0: determinism check d={} N={} seed={} OK", n_dims, n_points, seed);
    }
    world.barrier();
}
