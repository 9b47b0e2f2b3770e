//! Distributed tree builder (spec §4.10).
//!
//! Orchestrates the distributed phase: runs while a process's communicator
//! team has more than one member, recursing on progressively smaller
//! sub-teams until a process finds itself alone, at which point it hands
//! off to [`crate::shared_tree`]. Adapted from `ballAlg-mpi.c::build_tree`,
//! generalized from raw pointer arrays to [`crate::point::Shard`] and from
//! OpenMP tasks to `rayon`.

use log::{debug, info};
use mpi::topology::SystemCommunicator;
use mpi::traits::*;

use crate::furthest::distributed::distributed_furthest_pair;
use crate::median::locate_median;
use crate::node::{Node, NodeSink};
use crate::partition::{local_partition, redistribute};
use crate::point::Shard;
use crate::psrs::{psrs_sort, Projected};
use crate::select::PivotStrategy;
use crate::shared_tree::{self, TaskBudget};
use crate::vector::{distance, ProjectionBasis};

/// Recurses into `team` with the given `shard`, emitting exactly one node
/// per recursion level into `sink`, until `team` shrinks to a single
/// process, at which point the local shared-memory builder finishes the
/// subtree.
pub fn build(team: SystemCommunicator, shard: Shard, team_set: usize, node_id: i64, sink: &NodeSink) {
    let nprocs = team.size();
    let rank = team.rank();
    let dims = shard.dims();

    if nprocs == 1 {
        debug!("rank {} alone in team, handing off to shared-memory builder with {} points", rank, shard.len());
        let coords = shard.coords().to_vec();
        let mut index: Vec<usize> = (0..shard.len()).collect();
        let budget = TaskBudget::for_pool(rayon::current_num_threads());
        shared_tree::build(&coords, dims, &mut index, node_id, 0, budget, PivotStrategy::MedianOfThree, sink);
        return;
    }

    debug!("rank {}/{} building node {} over team_set={}", rank, nprocs, node_id, team_set);

    let (a, b) = distributed_furthest_pair(&shard, dims, &team);
    let basis = ProjectionBasis::new(&a, &b);

    let mut projected = Vec::with_capacity(shard.len());
    let mut first_coords = vec![0.0; shard.len()];
    for i in 0..shard.len() {
        let mut point = vec![0.0; dims];
        basis.project_into(shard.point(i), &a, &mut point);
        first_coords[i] = point[0];
        projected.push(Projected {
            first_coord: point[0],
            point,
        });
    }

    let sorted = psrs_sort(projected, dims, &team);
    let center = locate_median(&sorted, dims, team_set, &team);
    drop(sorted);

    let mut shard = shard;
    let split = local_partition(&mut shard, &mut first_coords, &center);

    let mut local_max = 0.0f64;
    for i in 0..shard.len() {
        let d = distance(&center, shard.point(i));
        if d > local_max {
            local_max = d;
        }
    }
    let mut radius = 0.0f64;
    let root_process = team.process_at_rank(0);
    if rank == 0 {
        root_process.reduce_into_root(&local_max, &mut radius, mpi::collective::SystemOperation::max());
    } else {
        root_process.reduce_into(&local_max, mpi::collective::SystemOperation::max());
    }

    let left_id = node_id + 1;
    let right_id = node_id + 2 * ((team_set as i64 + 1) / 2);
    let new_node_id = if rank < nprocs / 2 { left_id } else { right_id };

    if rank == 0 {
        info!("node {} center settled, splitting team of {} into two halves", node_id, nprocs);
        sink.push(Node::internal(node_id, left_id, right_id, center, radius));
    }

    let (new_team, new_shard) = redistribute(&team, shard, split, team_set);
    // Must agree with `right_id` above: the left half holds ceil(team_set/2)
    // points, the right half floor(team_set/2) — not the other way around.
    let new_team_set = if rank < nprocs / 2 {
        team_set / 2 + (team_set % 2)
    } else {
        team_set / 2
    };

    build(new_team, new_shard, new_team_set, new_node_id, sink);
}
