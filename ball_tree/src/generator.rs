//! Deterministic point generator (spec §6).
//!
//! Draws points uniformly from `[0, 1)` per coordinate with a seeded RNG,
//! generalized to `d` dimensions with an explicit seed, matching
//! `ballAlg-mpi.c`'s `srandom(seed)` contract: the same
//! `(n_dims, n_points, seed)` triple must always produce the same shard,
//! since rank 0 calls this function once per rank to materialize every
//! other rank's shard before shipping it over (spec §6's spread-to-ranks
//! protocol).

use rand::distributions::Uniform;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::point::Shard;

/// Generates `n_points` points in `n_dims` dimensions, uniform over
/// `[0, 1)` per coordinate, seeded deterministically from `seed`.
pub fn generate_points(n_dims: usize, n_points: usize, seed: u64) -> Shard {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Uniform::new(0.0f64, 1.0);
    let coords: Vec<f64> = (0..n_points * n_dims).map(|_| rng.sample(dist)).collect();
    Shard::from_coords(n_dims, coords)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_identical_shards() {
        let a = generate_points(3, 50, 42);
        let b = generate_points(3, 50, 42);
        for i in 0..50 {
            assert_eq!(a.point(i), b.point(i));
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let a = generate_points(3, 50, 1);
        let b = generate_points(3, 50, 2);
        assert_ne!(a.to_contiguous(), b.to_contiguous());
    }

    #[test]
    fn coordinates_land_in_unit_range() {
        let s = generate_points(4, 200, 7);
        for i in 0..s.len() {
            for &c in s.point(i) {
                assert!((0.0..1.0).contains(&c));
            }
        }
    }
}
