//! Parallel sort by regular sampling (spec §4.6).
//!
//! Sorts a distributed array of projection scalars — the first coordinate
//! of each process's projected points, per spec.md §9's documented
//! degenerate-input caveat — across a communicator, returning each
//! process's contiguous slice of the globally sorted order with the points
//! they were computed from still attached. Generalized from a
//! regular-sampling sort over a fixed oversampling density to one sample
//! per process, matching `ballAlg-mpi.c::distr_sorting`'s exact pivot
//! count (`n_procs - 1` splitters).

use mpi::datatype::{Partition, PartitionMut};
use mpi::topology::SystemCommunicator;
use mpi::traits::*;
use mpi::Count;

use crate::order::lexicographic_cmp;

/// One entry of the distributed projection array: the first coordinate
/// used for ordering, plus the full projected point it was derived from.
#[derive(Debug, Clone)]
pub struct Projected {
    pub first_coord: f64,
    pub point: Vec<f64>,
}

/// Runs PSRS over `local`, returning this process's contiguous slice of the
/// globally sorted sequence (by first coordinate, full points attached).
pub fn psrs_sort(local: Vec<Projected>, dims: usize, comm: &SystemCommunicator) -> Vec<Projected> {
    let nprocs = comm.size() as usize;
    let rank = comm.rank();

    let mut local = local;
    local.sort_by(|a, b| a.first_coord.partial_cmp(&b.first_coord).unwrap());

    if nprocs == 1 {
        return local;
    }

    // 1 sample per process, at evenly spaced offsets into the locally
    // sorted array.
    let size = local.len();
    let my_samples: Vec<f64> = (0..nprocs)
        .map(|i| local[i * (size / nprocs)].first_coord)
        .collect();

    let mut all_samples = vec![0.0f64; nprocs * nprocs];
    comm.all_gather_into(&my_samples[..], &mut all_samples[..]);

    // Leader picks nprocs-1 splitters from the sorted sample set.
    let mut pivots = vec![0.0f64; nprocs.saturating_sub(1)];
    if rank == 0 {
        all_samples.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for i in 1..nprocs {
            pivots[i - 1] = all_samples[i * nprocs];
        }
    }
    let root_process = comm.process_at_rank(0);
    root_process.broadcast_into(&mut pivots[..]);

    // Bucket the locally sorted array by pivot band.
    let mut counts = vec![0 as Count; nprocs];
    let mut current = 0usize;
    for (band, &pivot) in pivots.iter().enumerate() {
        let mut count = 0;
        while current < size && local[current].first_coord < pivot {
            count += 1;
            current += 1;
        }
        counts[band] = count as Count;
    }
    counts[nprocs - 1] = (size - current) as Count;

    let mut displs = vec![0 as Count; nprocs];
    let mut sum = 0 as Count;
    for i in 0..nprocs {
        displs[i] = sum;
        sum += counts[i];
    }

    let mut recv_counts = vec![0 as Count; nprocs];
    comm.all_to_all_into(&counts[..], &mut recv_counts[..]);

    let mut recv_displs = vec![0 as Count; nprocs];
    let mut sum = 0 as Count;
    for i in 0..nprocs {
        recv_displs[i] = sum;
        sum += recv_counts[i];
    }
    let total_recv = sum as usize;

    // Flatten to first-coordinate + point buffers for the all-to-all-v
    // exchange; `dims` doubles travel per entry's point payload, plus one
    // double for its sort key.
    let send_flat: Vec<f64> = local
        .iter()
        .flat_map(|p| std::iter::once(p.first_coord).chain(p.point.iter().copied()))
        .collect();
    let stride = (dims + 1) as Count;
    let send_counts: Vec<Count> = counts.iter().map(|c| c * stride).collect();
    let send_displs: Vec<Count> = displs.iter().map(|d| d * stride).collect();
    let recv_counts_flat: Vec<Count> = recv_counts.iter().map(|c| c * stride).collect();
    let recv_displs_flat: Vec<Count> = recv_displs.iter().map(|d| d * stride).collect();

    let mut recv_flat = vec![0.0f64; total_recv * (dims + 1)];
    let send_partition = Partition::new(&send_flat[..], send_counts, &send_displs[..]);
    let mut recv_partition = PartitionMut::new(&mut recv_flat[..], recv_counts_flat, &recv_displs_flat[..]);
    comm.all_to_all_varcount_into(&send_partition, &mut recv_partition);

    let mut received: Vec<Projected> = recv_flat
        .chunks(dims + 1)
        .map(|chunk| Projected {
            first_coord: chunk[0],
            point: chunk[1..].to_vec(),
        })
        .collect();

    received.sort_by(|a, b| lexicographic_cmp(&a.point, &b.point));
    received.sort_by(|a, b| a.first_coord.partial_cmp(&b.first_coord).unwrap());
    received
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_key_reads_first_coordinate() {
        let dims = 2;
        let flat = [3.0, 9.0, 1.0, 2.0];
        assert_eq!(flat[0 * dims], 3.0);
        assert_eq!(flat[1 * dims], 1.0);
    }
}
