//! Constant-density participating medium (fog, smoke).

use std::sync::Arc;

use crate::random::random_f32;
use crate::texture::Texture;
use crate::{Aabb, Color, HitRecord, Hittable, Interval, Isotropic, Material, Ray, Vec3};

/// Offset past the entry point when searching for the exit point.
const EXIT_EPSILON: f32 = 0.0001;

/// A volume of uniform density filling a boundary shape.
///
/// The boundary must be convex: once a ray leaves it, it is assumed never to
/// re-enter. A torus or any other non-convex boundary renders incorrectly.
pub struct ConstantMedium {
    boundary: Arc<dyn Hittable>,
    neg_inv_density: f32,
    phase_function: Arc<dyn Material>,
}

impl ConstantMedium {
    pub fn new(boundary: Arc<dyn Hittable>, density: f32, texture: Arc<dyn Texture>) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function: Arc::new(Isotropic::new(texture)),
        }
    }

    pub fn from_color(boundary: Arc<dyn Hittable>, density: f32, albedo: Color) -> Self {
        Self {
            boundary,
            neg_inv_density: -1.0 / density,
            phase_function: Arc::new(Isotropic::from_color(albedo)),
        }
    }
}

impl Hittable for ConstantMedium {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let entry = self.boundary.hit(ray, Interval::UNIVERSE)?;
        let exit = self
            .boundary
            .hit(ray, Interval::new(entry.t + EXIT_EPSILON, f32::INFINITY))?;

        let mut t_enter = entry.t.max(ray_t.min);
        let t_exit = exit.t.min(ray_t.max);
        if t_enter >= t_exit {
            return None;
        }
        // Ray starts inside the volume
        t_enter = t_enter.max(0.0);

        let ray_length = ray.direction().length();
        let distance_inside_boundary = (t_exit - t_enter) * ray_length;
        let hit_distance = self.neg_inv_density * random_f32().ln();

        if hit_distance > distance_inside_boundary {
            return None;
        }

        let t = t_enter + hit_distance / ray_length;
        // Normal and face are arbitrary: direction is meaningless inside an
        // isotropic medium.
        Some(HitRecord {
            p: ray.at(t),
            normal: Vec3::X,
            material: self.phase_function.as_ref(),
            t,
            u: 0.0,
            v: 0.0,
            front_face: true,
        })
    }

    fn bounding_box(&self) -> Aabb {
        self.boundary.bounding_box()
    }
}
