//! Ember - offline CPU path tracer
//!
//! A Monte Carlo path tracer over spheres, quads and participating media,
//! accelerated by a BVH and rendered tile-parallel on a rayon pool.

mod bvh;
mod camera;
mod constant_medium;
mod error;
mod framebuffer;
mod hittable;
mod integrator;
mod material;
mod quad;
pub mod random;
mod renderer;
mod sphere;
mod texture;
mod tile;
mod transform;

pub use bvh::BvhNode;
pub use camera::{Background, Camera, CameraSettings};
pub use constant_medium::ConstantMedium;
pub use error::{RenderError, RenderResult};
pub use framebuffer::{color_to_rgba, linear_to_gamma, Framebuffer, ImageBuffer};
pub use hittable::{HitRecord, Hittable, HittableList};
pub use integrator::ray_color;
pub use material::{
    Color, Dielectric, DiffuseLight, Isotropic, Lambertian, Material, Metal, ScatterResult,
};
pub use quad::{make_box, Quad};
pub use renderer::{
    render, render_with_cancel, CancelToken, RenderOptions, RenderOutput, RESERVED_THREADS,
};
pub use sphere::Sphere;
pub use texture::{CheckerTexture, SolidColor, Texture};
pub use tile::{generate_tiles, render_tile, Tile, TileResult, DEFAULT_TILE_SIZE};
pub use transform::{RotateY, Translate};

/// Re-export the math types from ember_math
pub use ember_math::{Aabb, Axis, Interval, Ray, Vec3};
