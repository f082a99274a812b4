//! Deterministic per-step random stream.
//!
//! Every stochastic choice of one cluster update is drawn from a single
//! stream seeded by (global seed, timestep), so runs reproduce exactly
//! for a fixed seed regardless of how particles are partitioned across
//! workers.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::geom::Vec3;

const STREAM_SALT: u64 = 0x09365bf5;

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e3779b97f4a7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d049bb133111eb);
    x ^ (x >> 31)
}

pub struct StepRng {
    inner: Xoshiro256StarStar,
}

impl StepRng {
    pub fn new(seed: u64, timestep: u64) -> Self {
        let mixed = splitmix64(splitmix64(seed ^ STREAM_SALT).wrapping_add(timestep));
        Self {
            inner: Xoshiro256StarStar::seed_from_u64(mixed),
        }
    }

    /// Uniform variate in [0, 1).
    pub fn uniform(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    pub fn uniform_range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.uniform()
    }

    /// Uniformly distributed unit vector: full sphere in 3D, +z in 2D
    /// (the only line-reflection axis with out-of-plane symmetry).
    pub fn unit_vector(&mut self, ndim: u32) -> Vec3 {
        if ndim == 2 {
            return Vec3::new(0.0, 0.0, 1.0);
        }
        let theta = self.uniform_range(0.0, 2.0 * std::f64::consts::PI);
        let z = self.uniform_range(-1.0, 1.0);
        let r = (1.0 - z * z).sqrt();
        Vec3::new(r * theta.cos(), r * theta.sin(), z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = StepRng::new(7, 42);
        let mut b = StepRng::new(7, 42);
        for _ in 0..16 {
            assert_eq!(a.uniform().to_bits(), b.uniform().to_bits());
        }
    }

    #[test]
    fn different_timestep_different_stream() {
        let mut a = StepRng::new(7, 42);
        let mut b = StepRng::new(7, 43);
        let draws_a: Vec<u64> = (0..8).map(|_| a.uniform().to_bits()).collect();
        let draws_b: Vec<u64> = (0..8).map(|_| b.uniform().to_bits()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn unit_vectors_are_normalized() {
        let mut rng = StepRng::new(1, 1);
        for _ in 0..32 {
            let v = rng.unit_vector(3);
            assert!((v.norm() - 1.0).abs() < 1e-12);
        }
        assert_eq!(rng.unit_vector(2), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn uniforms_stay_in_range() {
        let mut rng = StepRng::new(3, 9);
        for _ in 0..64 {
            let u = rng.uniform();
            assert!((0.0..1.0).contains(&u));
            let r = rng.uniform_range(-2.0, 5.0);
            assert!((-2.0..5.0).contains(&r));
        }
    }
}
