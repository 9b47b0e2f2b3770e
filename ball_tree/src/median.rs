//! Distributed median locator (spec §4.7).
//!
//! Given the PSRS-sorted projections (spec §4.6) and the team's total point
//! count `total`, the center's projection sits at sorted index `total / 2`
//! (odd `total`) or is the mean of indices `total/2 - 1` and `total/2`
//! (even `total`). Each process's global base offset into the sorted
//! sequence is reconstructed with a left-to-right chain of point-to-point
//! messages, exactly as `ballAlg-mpi.c::distr_find_center`, rather than a
//! collective reduction — spec.md §4.7 specifies the chain explicitly, and
//! it is what lets a process recognize it owns one of the (at most two)
//! indices the median needs without a separate collective to publish sizes.

use mpi::topology::SystemCommunicator;
use mpi::traits::*;

use crate::psrs::Projected;
use crate::vector::mean_into;

const BASE_TAG: i32 = 100;
const CENTER_CANDIDATE_TAG_0: i32 = 101;
const CENTER_CANDIDATE_TAG_1: i32 = 102;

/// Locates and broadcasts the median-split center point across `comm`.
pub fn locate_median(sorted: &[Projected], dims: usize, total: usize, comm: &SystemCommunicator) -> Vec<f64> {
    let rank = comm.rank();
    let nprocs = comm.size();
    let root_process = comm.process_at_rank(0);

    let n_centers = if total % 2 == 1 { 1 } else { 2 };
    let center_indexes: Vec<usize> = if n_centers == 1 {
        vec![total / 2]
    } else {
        vec![total / 2 - 1, total / 2]
    };

    let mut center = vec![0.0; dims];

    if rank == 0 {
        let mut have = vec![None; n_centers];
        for (j, &idx) in center_indexes.iter().enumerate() {
            if idx < sorted.len() {
                have[j] = Some(sorted[idx].point.clone());
            }
        }

        // Tell rank 1 where our local slice ends, so the chain can resolve
        // which rank owns each needed global index.
        if nprocs > 1 {
            let base_end = sorted.len() as i64;
            comm.process_at_rank(1).send_with_tag(&base_end, BASE_TAG);
        }

        for (j, slot) in have.iter_mut().enumerate() {
            if slot.is_none() {
                let tag = if j == 0 { CENTER_CANDIDATE_TAG_0 } else { CENTER_CANDIDATE_TAG_1 };
                let (buf, _status) = comm.any_process().receive_vec_with_tag::<f64>(tag);
                *slot = Some(buf);
            }
        }

        if n_centers == 1 {
            center.copy_from_slice(have[0].as_ref().unwrap());
        } else {
            mean_into(have[0].as_ref().unwrap(), have[1].as_ref().unwrap(), &mut center);
        }
    } else {
        let (base, _status) = comm.process_at_rank(rank - 1).receive_with_tag::<i64>(BASE_TAG);
        let base = base as usize;
        let upper = base + sorted.len();

        for (j, &idx) in center_indexes.iter().enumerate() {
            if idx >= base && idx < upper {
                let tag = if j == 0 { CENTER_CANDIDATE_TAG_0 } else { CENTER_CANDIDATE_TAG_1 };
                let point = &sorted[idx - base].point;
                root_process.send_with_tag(&point[..], tag);
            }
        }

        if rank < nprocs - 1 {
            let upper = upper as i64;
            comm.process_at_rank(rank + 1).send_with_tag(&upper, BASE_TAG);
        }
    }

    root_process.broadcast_into(&mut center[..]);
    center
}
