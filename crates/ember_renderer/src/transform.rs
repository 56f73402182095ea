//! Instancing wrappers that move a shared child without copying it.
//!
//! Both wrappers transform the incoming ray into the child's object space,
//! delegate, and transform the hit back to world space.

use std::sync::Arc;

use crate::{Aabb, HitRecord, Hittable, Interval, Ray, Vec3};

/// Child offset by a fixed vector.
pub struct Translate {
    object: Arc<dyn Hittable>,
    offset: Vec3,
    bbox: Aabb,
}

impl Translate {
    pub fn new(object: Arc<dyn Hittable>, offset: Vec3) -> Self {
        let bbox = object.bounding_box().translate(offset);
        Self {
            object,
            offset,
            bbox,
        }
    }
}

impl Hittable for Translate {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let offset_ray = Ray::new(ray.origin() - self.offset, ray.direction(), ray.time());

        let mut rec = self.object.hit(&offset_ray, ray_t)?;
        rec.p += self.offset;
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

/// Child rotated about the Y axis by a fixed angle.
pub struct RotateY {
    object: Arc<dyn Hittable>,
    sin_theta: f32,
    cos_theta: f32,
    bbox: Aabb,
}

impl RotateY {
    /// Rotate `object` counter-clockwise (seen from +Y) by `angle` degrees.
    pub fn new(object: Arc<dyn Hittable>, angle: f32) -> Self {
        let radians = angle.to_radians();
        let (sin_theta, cos_theta) = radians.sin_cos();

        let mut rotated = Self {
            object,
            sin_theta,
            cos_theta,
            bbox: Aabb::EMPTY,
        };
        rotated.bbox = rotated.world_bbox();
        rotated
    }

    /// Object space to world space.
    #[inline]
    fn to_world(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            self.cos_theta * p.x + self.sin_theta * p.z,
            p.y,
            -self.sin_theta * p.x + self.cos_theta * p.z,
        )
    }

    /// World space to object space, the inverse of [`Self::to_world`].
    #[inline]
    fn to_object(&self, p: Vec3) -> Vec3 {
        Vec3::new(
            self.cos_theta * p.x - self.sin_theta * p.z,
            p.y,
            self.sin_theta * p.x + self.cos_theta * p.z,
        )
    }

    /// Bounds of the eight rotated corners of the child box.
    fn world_bbox(&self) -> Aabb {
        let local = self.object.bounding_box();
        let lo = local.min_corner();
        let hi = local.max_corner();

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for i in 0..2 {
            for j in 0..2 {
                for k in 0..2 {
                    let corner = Vec3::new(
                        if i == 0 { lo.x } else { hi.x },
                        if j == 0 { lo.y } else { hi.y },
                        if k == 0 { lo.z } else { hi.z },
                    );
                    let rotated = self.to_world(corner);
                    min = min.min(rotated);
                    max = max.max(rotated);
                }
            }
        }

        Aabb::from_points(min, max)
    }
}

impl Hittable for RotateY {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        let object_ray = Ray::new(
            self.to_object(ray.origin()),
            self.to_object(ray.direction()),
            ray.time(),
        );

        let mut rec = self.object.hit(&object_ray, ray_t)?;
        rec.p = self.to_world(rec.p);
        rec.normal = self.to_world(rec.normal);
        Some(rec)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}
