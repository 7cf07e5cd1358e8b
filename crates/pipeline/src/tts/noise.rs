//! Seeded initial noise
//!
//! Each chunk draws its starting noise from `seed + chunk_index`, so a given
//! request reproduces the same audio regardless of which thread runs it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed for one chunk of a request
pub fn chunk_seed(base: u64, chunk_index: usize) -> u64 {
    base.wrapping_add(chunk_index as u64)
}

/// Standard normal samples via Box-Muller
pub fn gaussian_noise(seed: u64, len: usize) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(len + 1);
    while out.len() < len {
        // (0, 1] keeps ln finite
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = rng.gen::<f64>();
        let radius = (-2.0 * u1.ln()).sqrt();
        let angle = std::f64::consts::TAU * u2;
        out.push((radius * angle.cos()) as f32);
        out.push((radius * angle.sin()) as f32);
    }
    out.truncate(len);
    out
}
