//! Per-thread random sampling.
//!
//! Every worker owns its generator. The tile scheduler reseeds it at the
//! start of each tile from the render seed and the tile index, so a tile
//! produces the same samples no matter which worker runs it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::f32::consts::PI;

use crate::Vec3;

thread_local! {
    static RNG: RefCell<StdRng> = RefCell::new(StdRng::from_entropy());
}

/// Reseed the calling thread's generator.
pub fn seed_thread(seed: u64) {
    RNG.with(|rng| *rng.borrow_mut() = StdRng::seed_from_u64(seed));
}

/// Derive a per-tile seed from the render seed.
pub fn tile_seed(render_seed: u64, tile_index: usize) -> u64 {
    // splitmix64 finaliser, keeps neighbouring tiles decorrelated
    let mut z = render_seed ^ (tile_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Uniform f32 in `[0, 1)`.
pub fn random_f32() -> f32 {
    RNG.with(|rng| rng.borrow_mut().gen())
}

/// Uniform f32 in `[min, max)`.
pub fn random_f32_range(min: f32, max: f32) -> f32 {
    min + (max - min) * random_f32()
}

/// Vector with components uniform in `[min, max)`.
pub fn random_vec3_range(min: f32, max: f32) -> Vec3 {
    Vec3::new(
        random_f32_range(min, max),
        random_f32_range(min, max),
        random_f32_range(min, max),
    )
}

/// Uniformly distributed direction on the unit sphere.
pub fn random_unit_vector() -> Vec3 {
    let theta = 2.0 * PI * random_f32();
    let cos_phi = 2.0 * random_f32() - 1.0;
    let sin_phi = (1.0 - cos_phi * cos_phi).max(0.0).sqrt();
    Vec3::new(sin_phi * theta.cos(), sin_phi * theta.sin(), cos_phi)
}

/// Point inside the unit disk on the z = 0 plane (rejection sampling).
pub fn random_in_unit_disk() -> Vec3 {
    loop {
        let p = Vec3::new(random_f32_range(-1.0, 1.0), random_f32_range(-1.0, 1.0), 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}
