//! Distributed partition and redistribute (spec §4.8).
//!
//! Each process splits its local shard into a left prefix (projection first
//! coordinate strictly less than the center's) and a right suffix. Every
//! rank in `team` then takes part in two full-team gathers — its left
//! prefix into a buffer rooted at rank 0, its right suffix into a buffer
//! rooted at rank `team.size()/2` — and each leader scatters its buffer
//! back out evenly within its half. Adapted from `ballAlg-mpi.c::build_tree`'s
//! tail (the `distr_partition` double gather-scatter block, which gathers
//! both halves from every rank before either leader scatters), generalized
//! from raw pointer swaps to index-array swaps on [`Shard`].

use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::SystemCommunicator;
use mpi::traits::*;
use mpi::Count;

use crate::point::Shard;

/// Partitions `shard` in place around `center`'s first coordinate,
/// returning the split index: the count of points that went left.
pub fn local_partition(shard: &mut Shard, first_coords: &mut [f64], center: &[f64]) -> usize {
    let mut store_index = 0;
    let n = shard.len();
    for i in 0..n {
        if first_coords[i] < center[0] {
            first_coords.swap(store_index, i);
            shard.swap(store_index, i);
            store_index += 1;
        }
    }
    store_index
}

/// Splits `team` into a left half (ranks `< team.size()/2`) and right half,
/// gathers each half's partitioned points at its new leader, and scatters
/// them out evenly. Returns the new sub-communicator and this process's new
/// shard.
pub fn redistribute(
    team: &SystemCommunicator,
    shard: Shard,
    split: usize,
    team_set: usize,
) -> (mpi::topology::SystemCommunicator, Shard) {
    let dims = shard.dims();
    let nprocs = team.size();
    let rank = team.rank();
    let half = nprocs / 2;
    let goes_left = rank < half;

    let new_team = team
        .split_by_color(mpi::topology::Color::with_value(if goes_left { 0 } else { 1 }))
        .expect("communicator split must succeed for a non-empty team");
    let new_rank = new_team.rank();
    let new_procs = new_team.size();

    // The median locator guarantees exactly ceil(team_set/2) points fall
    // left of the center and floor(team_set/2) fall right — this must
    // match the id arithmetic in `distributed_tree::build`, which gives
    // the left child `ceil(team_set/2)` points (`right_id = node_id +
    // 2*ceil(team_set/2)`).
    let new_team_set = if goes_left {
        team_set / 2 + (team_set % 2)
    } else {
        team_set / 2
    };
    let remainder = new_team_set % (new_procs as usize);
    let new_set = new_team_set / (new_procs as usize) + if (new_rank as usize) < remainder { 1 } else { 0 };

    let local_len = shard.len();
    let (left_count, right_count) = (split, local_len - split);
    let left_buf: Vec<f64> = if left_count == 0 {
        Vec::new()
    } else {
        shard.sub_range(0, left_count - 1).to_contiguous()
    };
    let right_buf: Vec<f64> = if right_count == 0 {
        Vec::new()
    } else {
        shard.sub_range(split, local_len - 1).to_contiguous()
    };
    let left_send_count = (left_count * dims) as Count;
    let right_send_count = (right_count * dims) as Count;

    // Every rank contributes to both full-team gathers: its left prefix to
    // the gather rooted at rank 0, its right suffix to the gather rooted
    // at rank `half` — exactly the original's two unconditional gathers,
    // not one gather per rank's own half (which would both mismatch
    // roots across the team and drop the other half's contribution).
    let left_leader = team.process_at_rank(0);
    let mut left_counts = vec![0 as Count; nprocs as usize];
    if rank == 0 {
        left_leader.gather_into_root(&left_send_count, &mut left_counts[..]);
    } else {
        left_leader.gather_into(&left_send_count);
    }
    let left_gathered = if rank == 0 {
        let total: Count = left_counts.iter().sum();
        let mut displs = vec![0 as Count; nprocs as usize];
        let mut sum = 0 as Count;
        for i in 0..nprocs as usize {
            displs[i] = sum;
            sum += left_counts[i];
        }
        let mut buf = vec![0.0f64; total as usize];
        {
            let mut recv_partition = PartitionMut::new(&mut buf[..], left_counts.clone(), &displs[..]);
            left_leader.gather_varcount_into_root(&left_buf[..], &mut recv_partition);
        }
        buf
    } else {
        left_leader.gather_varcount_into(&left_buf[..]);
        Vec::new()
    };

    let right_leader = team.process_at_rank(half);
    let mut right_counts = vec![0 as Count; nprocs as usize];
    if rank == half {
        right_leader.gather_into_root(&right_send_count, &mut right_counts[..]);
    } else {
        right_leader.gather_into(&right_send_count);
    }
    let right_gathered = if rank == half {
        let total: Count = right_counts.iter().sum();
        let mut displs = vec![0 as Count; nprocs as usize];
        let mut sum = 0 as Count;
        for i in 0..nprocs as usize {
            displs[i] = sum;
            sum += right_counts[i];
        }
        let mut buf = vec![0.0f64; total as usize];
        {
            let mut recv_partition = PartitionMut::new(&mut buf[..], right_counts.clone(), &displs[..]);
            right_leader.gather_varcount_into_root(&right_buf[..], &mut recv_partition);
        }
        buf
    } else {
        right_leader.gather_varcount_into(&right_buf[..]);
        Vec::new()
    };

    let mut gathered = if goes_left { left_gathered } else { right_gathered };

    // New leader scatters evenly across the sub-team.
    let mut recv_buf = vec![0.0f64; new_set * dims];
    if new_rank == 0 {
        let send_counts: Vec<Count> = (0..new_procs)
            .map(|r| {
                let count = new_team_set / (new_procs as usize) + if (r as usize) < remainder { 1 } else { 0 };
                (count * dims) as Count
            })
            .collect();
        let mut send_displs = vec![0 as Count; new_procs as usize];
        let mut sum = 0 as Count;
        for i in 0..new_procs as usize {
            send_displs[i] = sum;
            sum += send_counts[i];
        }
        let send_partition = Partition::new(&gathered[..], send_counts, &send_displs[..]);
        new_team.this_process().scatter_varcount_into_root(&send_partition, &mut recv_buf[..]);
    } else {
        new_team.this_process().scatter_varcount_into(&mut recv_buf[..]);
    }
    gathered.clear();

    let new_shard = Shard::from_contiguous(dims, recv_buf);
    (new_team, new_shard)
}
