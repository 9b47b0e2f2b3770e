//! Furthest-pair heuristics (spec §4.4, §4.5).
//!
//! `get_furthest_points` is a two-pass diameter approximation, not the true
//! diameter: the first pass fixes a candidate `b` and finds the point `a`
//! farthest from it; the second pass fixes `a` and finds `b` farthest from
//! that. It is deterministic given a deterministic initial `b`, which is
//! what makes tree construction reproducible (spec §8 invariant 6).
//!
//! The initial-`b` convention is one of spec.md §9's two open questions:
//! this crate follows the distributed reference source's convention
//! (`b = shard[l]`, no lexicographic-minimum reduction) uniformly, for both
//! the per-rank distributed step and the shared-memory builder that takes
//! over once a rank is alone in its team — see DESIGN.md.

use crate::point::{point_at, Shard};
use crate::vector::quick_distance;

/// Local two-pass furthest-pair over the window `index[0..]`, read against
/// the shard's shared coordinate buffer.
pub fn local_furthest_pair(coords: &[f64], dims: usize, index: &[usize]) -> (Vec<f64>, Vec<f64>) {
    let mut b = point_at(coords, dims, index, 0).to_vec();
    let mut max_distance = 0.0;
    let mut a = b.clone();

    for pos in 0..index.len() {
        let p = point_at(coords, dims, index, pos);
        let dist = quick_distance(&b, p);
        if dist > max_distance {
            a = p.to_vec();
            max_distance = dist;
        }
    }

    max_distance = 0.0;
    for pos in 0..index.len() {
        let p = point_at(coords, dims, index, pos);
        let dist = quick_distance(&a, p);
        if dist > max_distance {
            b = p.to_vec();
            max_distance = dist;
        }
    }

    (a, b)
}

/// Communicator-wide furthest-pair (spec §4.5): broadcast an initial `b`,
/// gather local candidates for `a` at the leader and broadcast the winner,
/// then repeat to settle `b`. Ties break with `>=` so the gather order
/// (stable per spec §9) determines the winner deterministically.
pub mod distributed {
    use super::*;
    use mpi::topology::SystemCommunicator;
    use mpi::traits::*;

    pub fn distributed_furthest_pair(shard: &Shard, dims: usize, comm: &SystemCommunicator) -> (Vec<f64>, Vec<f64>) {
        let root_process = comm.process_at_rank(0);
        let rank = comm.rank();

        let mut b = if rank == 0 {
            shard.point_owned(0)
        } else {
            vec![0.0; dims]
        };
        root_process.broadcast_into(&mut b[..]);

        let mut a = local_farthest_from(shard, &b);
        let mut gathered = vec![0.0; dims * comm.size() as usize];
        if rank == 0 {
            root_process.gather_into_root(&a[..], &mut gathered[..]);
            a = pick_farthest(&b, &gathered, dims);
        } else {
            root_process.gather_into(&a[..]);
        }
        root_process.broadcast_into(&mut a[..]);

        let mut new_b = local_farthest_from(shard, &a);
        if rank == 0 {
            root_process.gather_into_root(&new_b[..], &mut gathered[..]);
            new_b = pick_farthest(&a, &gathered, dims);
        } else {
            root_process.gather_into(&new_b[..]);
        }
        root_process.broadcast_into(&mut new_b[..]);

        (a, new_b)
    }

    fn local_farthest_from(shard: &Shard, from: &[f64]) -> Vec<f64> {
        let mut best = shard.point_owned(0);
        let mut max_distance = 0.0;
        for i in 0..shard.len() {
            let dist = quick_distance(from, shard.point(i));
            if dist >= max_distance {
                best = shard.point_owned(i);
                max_distance = dist;
            }
        }
        best
    }

    fn pick_farthest(from: &[f64], candidates: &[f64], dims: usize) -> Vec<f64> {
        let mut best = candidates[0..dims].to_vec();
        let mut max_distance = 0.0;
        for chunk in candidates.chunks(dims) {
            let dist = quick_distance(from, chunk);
            if dist >= max_distance {
                best = chunk.to_vec();
                max_distance = dist;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_point_returns_itself_twice() {
        let coords = vec![1.0, 2.0];
        let index = vec![0];
        let (a, b) = local_furthest_pair(&coords, 2, &index);
        assert_eq!(a, vec![1.0, 2.0]);
        assert_eq!(b, vec![1.0, 2.0]);
    }

    #[test]
    fn finds_extreme_points_on_a_line() {
        let coords = vec![0.0, 5.0, -3.0, 2.0];
        let index = vec![0, 1, 2, 3];
        let (a, b) = local_furthest_pair(&coords, 1, &index);
        let mut extremes = vec![a[0], b[0]];
        extremes.sort_by(|x, y| x.partial_cmp(y).unwrap());
        assert_eq!(extremes, vec![-3.0, 5.0]);
    }
}
