//! Local quickselect and median (spec §4.3).
//!
//! Selects the k-th element of a per-shard projection array under
//! [`crate::order::less_than`], permuting a point-index window in lock step
//! so the two arrays stay consistent. The loop is iterative (not
//! recursive) to bound stack depth. Operates on raw `&mut [usize]` /
//! `&mut [Vec<f64>]` windows rather than an owned [`crate::point::Shard`]
//! so the shared-memory builder can split a window with `split_at_mut` and
//! recurse into each half as an independent `rayon::join` task, the same
//! way the original splits a pointer array for its OpenMP task pair.

use crate::order::less_than;

/// Which pivot rule [`quickselect`] uses. The two reference implementations
/// this crate is built from disagree: the MPI program's own shared-memory
/// completion (`finish_tree`) uses median-of-three, while the standalone
/// OpenMP program uses a random pivot. Both are kept since spec.md §4.3
/// calls out both by name; [`crate::shared_tree`] is standardized on
/// [`PivotStrategy::MedianOfThree`] (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotStrategy {
    MedianOfThree,
    Random,
}

fn median_of_three_index(projs: &[Vec<f64>], l: usize, r: usize) -> usize {
    let m = l + (r - l) / 2;
    let mut idxs = [l, m, r];
    idxs.sort_by(|&i, &j| {
        if less_than(&projs[i], &projs[j]) {
            std::cmp::Ordering::Less
        } else if less_than(&projs[j], &projs[i]) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });
    idxs[1]
}

/// Partitions `projs[l..=r]` (and `index` in lock step) around the value at
/// `pivot_index`, returning the pivot's final resting place.
fn partition(index: &mut [usize], projs: &mut [Vec<f64>], l: usize, r: usize, pivot_index: usize) -> usize {
    projs.swap(pivot_index, r);
    index.swap(pivot_index, r);
    let pivot_value = projs[r].clone();

    let mut store_index = l;
    for i in l..r {
        if less_than(&projs[i], &pivot_value) {
            projs.swap(store_index, i);
            index.swap(store_index, i);
            store_index += 1;
        }
    }
    projs.swap(r, store_index);
    index.swap(r, store_index);
    store_index
}

/// Returns the k-th smallest projection (under lexicographic order) in
/// `projs[l..=r]`, leaving lesser elements to its left and greater elements
/// to its right. `index` is permuted identically.
pub fn quickselect(
    index: &mut [usize],
    projs: &mut [Vec<f64>],
    mut l: usize,
    mut r: usize,
    k: usize,
    strategy: PivotStrategy,
    rng: &mut impl rand::Rng,
) -> Vec<f64> {
    loop {
        if l == r {
            return projs[l].clone();
        }
        let pivot_index = match strategy {
            PivotStrategy::MedianOfThree => median_of_three_index(projs, l, r),
            PivotStrategy::Random => l + rng.gen_range(0..=(r - l)),
        };
        let pivot_index = partition(index, projs, l, r, pivot_index);
        if k == pivot_index {
            return projs[k].clone();
        } else if k < pivot_index {
            r = pivot_index - 1;
        } else {
            l = pivot_index + 1;
        }
    }
}

/// Computes the median projected point over `projs[l..=r]`, writing it into
/// `center_out`, and returns the zero-based split index (within `[l, r]`):
/// the last local position, after selection, that belongs to the left
/// subtree.
pub fn median(
    index: &mut [usize],
    projs: &mut [Vec<f64>],
    l: usize,
    r: usize,
    strategy: PivotStrategy,
    rng: &mut impl rand::Rng,
    center_out: &mut [f64],
) -> usize {
    let count = r - l + 1;
    let k = count / 2;

    if count % 2 != 0 {
        let center = quickselect(index, projs, l, r, k + l, strategy, rng);
        center_out.copy_from_slice(&center);
    } else {
        quickselect(index, projs, l, r, k + l, strategy, rng);
        // projs[l..l+k] is now entirely "less than" projs[k + l]; scan it
        // for the lexicographically greatest element, i.e. the predecessor
        // of the k-th point.
        let mut current = projs[l].clone();
        for proj in projs.iter().take(l + k).skip(l + 1) {
            if less_than(&current, proj) {
                current = proj.clone();
            }
        }
        crate::vector::mean_into(&current, &projs[k + l], center_out);
    }
    k - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn make(points: &[[f64; 2]]) -> (Vec<usize>, Vec<Vec<f64>>) {
        let index: Vec<usize> = (0..points.len()).collect();
        let projs = points.iter().map(|p| p.to_vec()).collect();
        (index, projs)
    }

    #[test]
    fn odd_count_returns_exact_middle_element() {
        let (mut index, mut projs) = make(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut center = [0.0; 2];
        let split = median(
            &mut index,
            &mut projs,
            0,
            2,
            PivotStrategy::MedianOfThree,
            &mut rng,
            &mut center,
        );
        assert_eq!(center, [1.0, 0.0]);
        assert_eq!(split, 0);
    }

    #[test]
    fn even_count_averages_two_central_points() {
        let (mut index, mut projs) = make(&[[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [3.0, 0.0]]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        let mut center = [0.0; 2];
        median(
            &mut index,
            &mut projs,
            0,
            3,
            PivotStrategy::Random,
            &mut rng,
            &mut center,
        );
        assert_eq!(center, [1.5, 0.0]);
    }

    #[test]
    fn partitions_around_pivot() {
        let (mut index, mut projs) = make(&[[5.0, 0.0], [1.0, 0.0], [3.0, 0.0], [2.0, 0.0], [4.0, 0.0]]);
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let k = 2;
        let result = quickselect(&mut index, &mut projs, 0, 4, k, PivotStrategy::MedianOfThree, &mut rng);
        assert_eq!(result, vec![3.0, 0.0]);
        for i in 0..k {
            assert!(less_than(&projs[i], &projs[k]));
        }
        for i in (k + 1)..5 {
            assert!(less_than(&projs[k], &projs[i]));
        }
    }
}
