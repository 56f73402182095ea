//! Radiance estimate along a single camera path.

use crate::{Background, Color, Hittable, Interval, Ray};

/// Smallest accepted hit distance; keeps a scattered ray from re-hitting the
/// surface it just left.
pub const SHADOW_EPSILON: f32 = 0.001;

/// Estimate the colour carried back along `ray`.
///
/// Walks the path for at most `depth` bounces, adding each surface's emission
/// weighted by the product of attenuations so far. A miss adds the background,
/// an absorbed ray ends the walk, and running out of depth contributes black.
/// This is the loop form of
/// `emitted + attenuation * ray_color(scattered, depth - 1)`.
pub fn ray_color(ray: &Ray, depth: u32, world: &dyn Hittable, background: &Background) -> Color {
    let mut radiance = Color::ZERO;
    let mut throughput = Color::ONE;
    let mut ray = *ray;

    for _ in 0..depth {
        let Some(rec) = world.hit(&ray, Interval::new(SHADOW_EPSILON, f32::INFINITY)) else {
            return radiance + throughput * background.color(&ray);
        };

        radiance += throughput * rec.material.emitted(rec.u, rec.v, rec.p);

        match rec.material.scatter(&ray, &rec) {
            Some(scatter) => {
                throughput *= scatter.attenuation;
                ray = scatter.scattered;
            }
            None => return radiance,
        }
    }

    radiance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seed_thread;
    use crate::{
        make_box, DiffuseLight, HitRecord, HittableList, Lambertian, Material, Metal, Quad,
        ScatterResult, Sphere, Vec3,
    };
    use std::sync::Arc;

    /// Recursive form of the estimator, kept to check the loop against.
    fn ray_color_recursive(
        ray: &Ray,
        depth: u32,
        world: &dyn Hittable,
        background: &Background,
    ) -> Color {
        if depth == 0 {
            return Color::ZERO;
        }
        let Some(rec) = world.hit(ray, Interval::new(SHADOW_EPSILON, f32::INFINITY)) else {
            return background.color(ray);
        };
        let emission = rec.material.emitted(rec.u, rec.v, rec.p);
        match rec.material.scatter(ray, &rec) {
            Some(s) => {
                emission
                    + s.attenuation * ray_color_recursive(&s.scattered, depth - 1, world, background)
            }
            None => emission,
        }
    }

    /// Reflects straight back along the normal; no randomness at all.
    struct Retroreflector {
        albedo: Color,
        glow: Color,
    }

    impl Material for Retroreflector {
        fn scatter(&self, ray_in: &Ray, rec: &HitRecord) -> Option<ScatterResult> {
            Some(ScatterResult {
                attenuation: self.albedo,
                scattered: Ray::new(rec.p, rec.normal, ray_in.time()),
            })
        }

        fn emitted(&self, _u: f32, _v: f32, _p: Vec3) -> Color {
            self.glow
        }
    }

    fn mirror_corridor() -> HittableList {
        // Two facing walls that bounce a ray back and forth forever.
        let material: Arc<dyn Material> = Arc::new(Retroreflector {
            albedo: Color::new(0.9, 0.5, 0.25),
            glow: Color::new(0.1, 0.2, 0.3),
        });
        let mut world = HittableList::new();
        world.add(Arc::new(Quad::new(
            Vec3::new(-5.0, -5.0, -1.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
            material.clone(),
        )));
        world.add(Arc::new(Quad::new(
            Vec3::new(-5.0, -5.0, 1.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
            material,
        )));
        world
    }

    #[test]
    fn test_depth_zero_is_black() {
        let mut world = HittableList::new();
        world.add(Arc::new(Sphere::new(
            Vec3::new(0.0, 0.0, -2.0),
            1.0,
            Arc::new(DiffuseLight::from_color(Color::splat(10.0))),
        )));
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        for background in [Background::Sky, Background::Solid(Color::ONE)] {
            assert_eq!(ray_color(&ray, 0, &world, &background), Color::ZERO);
        }
    }

    #[test]
    fn test_miss_returns_background() {
        let world = HittableList::new();
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::Y);

        let sky = ray_color(&ray, 5, &world, &Background::Sky);
        assert!((sky - Color::new(0.5, 0.7, 1.0)).length() < 1e-6);

        let solid = ray_color(&ray, 5, &world, &Background::Solid(Color::splat(0.25)));
        assert_eq!(solid, Color::splat(0.25));
    }

    #[test]
    fn test_emitter_is_seen_directly() {
        let mut world = HittableList::new();
        world.add(Arc::new(Sphere::new(
            Vec3::new(0.0, 0.0, -2.0),
            1.0,
            Arc::new(DiffuseLight::from_color(Color::new(4.0, 3.0, 2.0))),
        )));
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let color = ray_color(&ray, 1, &world, &Background::Solid(Color::ZERO));
        assert_eq!(color, Color::new(4.0, 3.0, 2.0));
    }

    #[test]
    fn test_mirror_attenuates_background() {
        // Head-on reflection sends the ray straight back out to the background.
        let mut world = HittableList::new();
        world.add(Arc::new(Sphere::new(
            Vec3::new(0.0, 0.0, -2.0),
            1.0,
            Arc::new(Metal::new(Color::splat(0.5), 0.0)),
        )));
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));

        let color = ray_color(&ray, 10, &world, &Background::Solid(Color::ONE));
        assert!((color - Color::splat(0.5)).length() < 1e-5);
    }

    #[test]
    fn test_depth_bounds_the_walk() {
        let world = mirror_corridor();
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let glow = Color::new(0.1, 0.2, 0.3);
        let albedo = Color::new(0.9, 0.5, 0.25);

        // Closed form of sum_{k < depth} albedo^k * glow
        for depth in [1u32, 2, 5, 12] {
            let mut expected = Color::ZERO;
            let mut weight = Color::ONE;
            for _ in 0..depth {
                expected += weight * glow;
                weight *= albedo;
            }

            let color = ray_color(&ray, depth, &world, &Background::Solid(Color::ONE));
            assert!((color - expected).length() < 1e-5, "depth {depth}");
        }
    }

    #[test]
    fn test_loop_matches_recursion() {
        let world = mirror_corridor();
        let ray = Ray::new_simple(Vec3::new(0.3, -0.2, 0.0), Vec3::new(0.0, 0.0, 1.0));

        for depth in 0..20 {
            let looped = ray_color(&ray, depth, &world, &Background::Sky);
            let recursed = ray_color_recursive(&ray, depth, &world, &Background::Sky);
            assert!((looped - recursed).length() < 1e-5, "depth {depth}");
        }
    }

    #[test]
    fn test_loop_matches_recursion_with_random_materials() {
        let mut world = HittableList::new();
        world.add(Arc::new(make_box(
            Vec3::splat(-3.0),
            Vec3::splat(3.0),
            Arc::new(Lambertian::from_color(Color::splat(0.7))),
        )));
        world.add(Arc::new(Sphere::new(
            Vec3::new(0.0, 2.5, 0.0),
            0.4,
            Arc::new(DiffuseLight::from_color(Color::splat(8.0))),
        )));
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::new(0.2, 0.1, -1.0));

        for seed in 0..20 {
            seed_thread(seed);
            let looped = ray_color(&ray, 8, &world, &Background::Solid(Color::ZERO));
            seed_thread(seed);
            let recursed = ray_color_recursive(&ray, 8, &world, &Background::Solid(Color::ZERO));
            assert!((looped - recursed).length() < 1e-4, "seed {seed}");
        }
    }
}
