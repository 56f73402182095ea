//! Ember math - the small geometric vocabulary shared by the renderer.
//!
//! Vectors come from `glam`; this crate adds the closed-range [`Interval`],
//! the axis-aligned bounding box [`Aabb`] used by the BVH, and [`Ray`].

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;

pub use aabb::{Aabb, Axis};
pub use interval::Interval;
pub use ray::Ray;
