//! Seeded noise used to roughen vertex positions and place decorations.

use ::noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::NoiseSettings;
use super::geometry::EdgeVertices;
use crate::math;

/// Height/noise collaborator of the triangulation pass.
///
/// Every method is a pure function of its input position and the seed, so
/// two cells perturbing the same shared point get the same result.
#[derive(Clone, Debug)]
pub struct HexNoise {
    channels: [Fbm<Perlin>; 4],
    scale: f64,
    strength: f32,
    hash_seed: u64,
}

impl HexNoise {
    /// Builds four independent fBm channels from one seed.
    pub fn from_settings(n: &NoiseSettings) -> Self {
        let channel = |offset: u32| -> Fbm<Perlin> {
            Fbm::new(n.seed.wrapping_add(offset)).set_octaves(n.octaves)
        };
        Self {
            channels: [channel(0), channel(1), channel(2), channel(3)],
            scale: n.scale,
            strength: n.perturb_strength,
            hash_seed: u64::from(n.seed),
        }
    }

    /// Four-channel field value at `position`, each component in `[0, 1]`.
    ///
    /// Only `x` and `z` are sampled, so points stacked vertically share a value.
    pub fn sample(&self, position: Vec3) -> Vec4 {
        let p = [
            position.x as f64 / self.scale,
            position.z as f64 / self.scale,
        ];
        let [a, b, c, d] = self
            .channels
            .each_ref()
            .map(|fbm| math::map_noise_to_range(fbm.get(p), 0.0, 1.0).clamp(0.0, 1.0));
        Vec4::new(a, b, c, d)
    }

    /// Jitters `position` horizontally by at most `perturb_strength`.
    pub fn perturb(&self, position: Vec3) -> Vec3 {
        let s = self.sample(position);
        Vec3::new(
            position.x + (s.x * 2.0 - 1.0) * self.strength,
            position.y,
            position.z + (s.z * 2.0 - 1.0) * self.strength,
        )
    }

    /// Applies [`perturb`](Self::perturb) to all four points of an edge.
    pub fn perturb_edge(&self, edge: &EdgeVertices) -> EdgeVertices {
        edge.map(|p| self.perturb(p))
    }

    /// Two deterministic pseudo-random values in `[0, 1)` for `position`.
    ///
    /// Positions are quantized first, so tiny float differences do not
    /// change the result.
    pub fn stable_hash(&self, position: Vec3) -> (f32, f32) {
        let qx = (position.x * 16.0).round() as i32;
        let qz = (position.z * 16.0).round() as i32;
        let key = (u64::from(qx as u32) << 32) | u64::from(qz as u32);
        let mut rng =
            ChaCha8Rng::seed_from_u64(self.hash_seed ^ key.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        (rng.gen_range(0.0..1.0), rng.gen_range(0.0..1.0))
    }

    /// Maximum horizontal displacement of [`perturb`](Self::perturb).
    pub fn strength(&self) -> f32 {
        self.strength
    }
}
