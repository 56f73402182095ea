//! Built-in demo scenes.

use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Result};
use ember_renderer::{
    make_box, Background, BvhNode, CameraSettings, CheckerTexture, Color, ConstantMedium,
    Dielectric, DiffuseLight, Hittable, HittableList, Lambertian, Material, Metal, Quad,
    RotateY, Sphere, Translate, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A world ready to render and the camera preset that frames it.
pub struct Scene {
    pub world: Arc<dyn Hittable>,
    pub camera: CameraSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    Spheres,
    Checkers,
    Quads,
    Lights,
    Cornell,
    Smoke,
}

impl SceneKind {
    pub const ALL: [SceneKind; 6] = [
        SceneKind::Spheres,
        SceneKind::Checkers,
        SceneKind::Quads,
        SceneKind::Lights,
        SceneKind::Cornell,
        SceneKind::Smoke,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SceneKind::Spheres => "spheres",
            SceneKind::Checkers => "checkers",
            SceneKind::Quads => "quads",
            SceneKind::Lights => "lights",
            SceneKind::Cornell => "cornell",
            SceneKind::Smoke => "smoke",
        }
    }

    /// Build the scene. `seed` drives any random placement.
    pub fn build(self, seed: u64) -> Result<Scene> {
        match self {
            SceneKind::Spheres => bouncing_spheres(seed),
            SceneKind::Checkers => Ok(checkered_spheres()),
            SceneKind::Quads => Ok(quads()),
            SceneKind::Lights => simple_lights(),
            SceneKind::Cornell => cornell_box(),
            SceneKind::Smoke => cornell_smoke(),
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SceneKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let query = s.trim().to_ascii_lowercase();
        let matches: Vec<SceneKind> = Self::ALL
            .into_iter()
            .filter(|kind| kind.name().starts_with(&query))
            .collect();

        match matches.as_slice() {
            [kind] => Ok(*kind),
            [] => bail!("Unknown scene '{}'; expected one of: {}", s, scene_names()),
            _ => match matches.iter().find(|kind| kind.name() == query) {
                Some(kind) => Ok(*kind),
                None => bail!("Scene '{}' is ambiguous; expected one of: {}", s, scene_names()),
            },
        }
    }
}

pub fn scene_names() -> String {
    SceneKind::ALL
        .iter()
        .map(|kind| kind.name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn lambertian(albedo: Color) -> Arc<dyn Material> {
    Arc::new(Lambertian::from_color(albedo))
}

fn random_color(rng: &mut StdRng, min: f32, max: f32) -> Color {
    Color::new(
        rng.gen_range(min..max),
        rng.gen_range(min..max),
        rng.gen_range(min..max),
    )
}

/// Three large spheres on a checkered ground, ringed by small random ones.
/// Diffuse spheres bounce during the shutter interval.
fn bouncing_spheres(seed: u64) -> Result<Scene> {
    const DESIRED_SPHERES: usize = 69;
    const MAX_ATTEMPTS: usize = 1000;
    const SMALL_RADIUS: f32 = 0.2;

    let mut rng = StdRng::seed_from_u64(seed);
    let mut world = HittableList::new();

    let checker = Arc::new(CheckerTexture::from_colors(
        0.32,
        Color::new(0.011, 0.38, 0.392),
        Color::new(0.878, 0.509, 0.615),
    ));
    world.add(Arc::new(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        Arc::new(Lambertian::new(checker)),
    )));

    let big: [(Vec3, Arc<dyn Material>); 3] = [
        (Vec3::new(0.0, 1.0, 0.0), Arc::new(Dielectric::new(1.5))),
        (Vec3::new(-4.0, 1.0, 0.0), lambertian(Color::new(0.4, 0.2, 0.1))),
        (Vec3::new(4.0, 1.0, 0.0), Arc::new(Metal::new(Color::new(0.7, 0.6, 0.5), 0.0))),
    ];

    let mut placed: Vec<(Vec3, f32)> = Vec::new();
    for (center, material) in big {
        world.add(Arc::new(Sphere::new(center, 1.0, material)));
        placed.push((center, 1.0));
    }

    let mut created = 0;
    let mut attempts = 0;
    while created < DESIRED_SPHERES && attempts < MAX_ATTEMPTS {
        attempts += 1;

        // Scatter around one of the big spheres
        let (anchor, _) = placed[rng.gen_range(0..3)];
        let distance = rng.gen_range(1.5..4.0);
        let theta = rng.gen_range(0.0..2.0 * PI);
        let phi = rng.gen_range(0.0..PI);
        let center = Vec3::new(
            anchor.x + distance * phi.sin() * theta.cos(),
            SMALL_RADIUS,
            anchor.z + distance * phi.sin() * theta.sin(),
        );

        let overlaps = placed
            .iter()
            .any(|&(other, radius)| (center - other).length() < radius + SMALL_RADIUS + 0.05);
        if overlaps {
            continue;
        }
        placed.push((center, SMALL_RADIUS));

        let choose_mat: f32 = rng.gen();
        let sphere = if choose_mat < 0.8 {
            let albedo = random_color(&mut rng, 0.0, 1.0) * random_color(&mut rng, 0.0, 1.0);
            let bounce = Vec3::new(0.0, rng.gen_range(0.0..0.05), 0.0);
            Sphere::moving(center, center + bounce, SMALL_RADIUS, lambertian(albedo))
        } else if choose_mat < 0.95 {
            let albedo = random_color(&mut rng, 0.5, 1.0);
            let fuzz = rng.gen_range(0.0..0.5);
            Sphere::new(center, SMALL_RADIUS, Arc::new(Metal::new(albedo, fuzz)))
        } else {
            Sphere::new(center, SMALL_RADIUS, Arc::new(Dielectric::new(1.5)))
        };
        world.add(Arc::new(sphere));
        created += 1;
    }

    log::info!("Placed {created} small spheres in {attempts} attempts");

    let camera = CameraSettings::default()
        .with_image(16.0 / 10.0, 720)
        .with_quality(100, 6)
        .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.6, 10.0)
        .with_background(Background::Sky)
        .with_shutter(1.0);

    Ok(Scene {
        world: Arc::new(BvhNode::from_list(world)?),
        camera,
    })
}

/// Two large spheres sharing one spatial checker texture.
fn checkered_spheres() -> Scene {
    let checker: Arc<dyn Material> = Arc::new(Lambertian::new(Arc::new(
        CheckerTexture::from_colors(0.32, Color::new(0.2, 0.3, 0.1), Color::splat(0.9)),
    )));

    let mut world = HittableList::new();
    world.add(Arc::new(Sphere::new(
        Vec3::new(0.0, -10.0, 0.0),
        10.0,
        checker.clone(),
    )));
    world.add(Arc::new(Sphere::new(Vec3::new(0.0, 10.0, 0.0), 10.0, checker)));

    let camera = CameraSettings::default()
        .with_image(16.0 / 10.0, 400)
        .with_quality(100, 50)
        .with_position(Vec3::new(13.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y)
        .with_lens(20.0, 0.0, 10.0);

    Scene {
        world: Arc::new(world),
        camera,
    }
}

/// Five coloured quads facing the camera from different sides.
fn quads() -> Scene {
    let mut world = HittableList::new();

    let quads = [
        (Vec3::new(-3.0, -2.0, 5.0), Vec3::new(0.0, 0.0, -4.0), Vec3::new(0.0, 4.0, 0.0), Color::new(1.0, 0.2, 0.2)),
        (Vec3::new(-2.0, -2.0, 0.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 4.0, 0.0), Color::new(0.2, 1.0, 0.2)),
        (Vec3::new(3.0, -2.0, 1.0), Vec3::new(0.0, 0.0, 4.0), Vec3::new(0.0, 4.0, 0.0), Color::new(0.2, 0.2, 1.0)),
        (Vec3::new(-2.0, 3.0, 1.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 4.0), Color::new(1.0, 0.5, 0.0)),
        (Vec3::new(-2.0, -3.0, 5.0), Vec3::new(4.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -4.0), Color::new(0.2, 0.8, 0.8)),
    ];
    for (q, u, v, albedo) in quads {
        world.add(Arc::new(Quad::new(q, u, v, lambertian(albedo))));
    }

    let camera = CameraSettings::default()
        .with_image(1.0, 400)
        .with_quality(100, 50)
        .with_position(Vec3::new(0.0, 0.0, 9.0), Vec3::ZERO, Vec3::Y)
        .with_lens(80.0, 0.0, 10.0);

    Scene {
        world: Arc::new(world),
        camera,
    }
}

/// A sphere on a ground sphere, lit only by a glowing panel and a glowing
/// sphere overhead.
fn simple_lights() -> Result<Scene> {
    let mut world = HittableList::new();

    let ground = lambertian(Color::new(0.5, 0.45, 0.4));
    world.add(Arc::new(Sphere::new(
        Vec3::new(0.0, -1000.0, 0.0),
        1000.0,
        ground,
    )));
    world.add(Arc::new(Sphere::new(
        Vec3::new(0.0, 2.0, 0.0),
        2.0,
        lambertian(Color::new(0.6, 0.6, 0.7)),
    )));

    let light: Arc<dyn Material> = Arc::new(DiffuseLight::from_color(Color::splat(4.0)));
    world.add(Arc::new(Sphere::new(Vec3::new(0.0, 7.0, 0.0), 2.0, light.clone())));
    world.add(Arc::new(Quad::new(
        Vec3::new(3.0, 1.0, -2.0),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(0.0, 2.0, 0.0),
        light,
    )));

    let camera = CameraSettings::default()
        .with_image(16.0 / 9.0, 400)
        .with_quality(100, 50)
        .with_position(Vec3::new(26.0, 3.0, 6.0), Vec3::new(0.0, 2.0, 0.0), Vec3::Y)
        .with_lens(20.0, 0.0, 10.0)
        .with_background(Background::Solid(Color::ZERO));

    Ok(Scene {
        world: Arc::new(BvhNode::from_list(world)?),
        camera,
    })
}

/// Walls, floor and ceiling of the Cornell box with a ceiling light.
fn cornell_walls(light: Arc<dyn Material>, light_size: f32) -> HittableList {
    let red = lambertian(Color::new(0.65, 0.05, 0.05));
    let white = lambertian(Color::splat(0.73));
    let green = lambertian(Color::new(0.12, 0.45, 0.15));

    let mut world = HittableList::new();
    world.add(Arc::new(Quad::new(
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        green,
    )));
    world.add(Arc::new(Quad::new(
        Vec3::ZERO,
        Vec3::new(0.0, 555.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        red,
    )));

    let inset = (555.0 - light_size) / 2.0;
    world.add(Arc::new(Quad::new(
        Vec3::new(555.0 - inset, 554.0, 555.0 - inset),
        Vec3::new(-light_size, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -light_size),
        light,
    )));

    world.add(Arc::new(Quad::new(
        Vec3::ZERO,
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 555.0),
        white.clone(),
    )));
    world.add(Arc::new(Quad::new(
        Vec3::splat(555.0),
        Vec3::new(-555.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, -555.0),
        white.clone(),
    )));
    world.add(Arc::new(Quad::new(
        Vec3::new(0.0, 0.0, 555.0),
        Vec3::new(555.0, 0.0, 0.0),
        Vec3::new(0.0, 555.0, 0.0),
        white,
    )));
    world
}

/// A white box turned about Y and moved into place.
fn placed_box(size: Vec3, angle: f32, offset: Vec3) -> Arc<dyn Hittable> {
    let white = lambertian(Color::splat(0.73));
    let shape: Arc<dyn Hittable> = Arc::new(make_box(Vec3::ZERO, size, white));
    let rotated: Arc<dyn Hittable> = Arc::new(RotateY::new(shape, angle));
    Arc::new(Translate::new(rotated, offset))
}

fn cornell_camera() -> CameraSettings {
    CameraSettings::default()
        .with_image(1.0, 600)
        .with_quality(200, 50)
        .with_position(Vec3::new(278.0, 278.0, -800.0), Vec3::new(278.0, 278.0, 0.0), Vec3::Y)
        .with_lens(40.0, 0.0, 10.0)
        .with_background(Background::Solid(Color::ZERO))
}

fn cornell_box() -> Result<Scene> {
    let light: Arc<dyn Material> = Arc::new(DiffuseLight::from_color(Color::splat(15.0)));
    let mut world = cornell_walls(light, 130.0);

    world.add(placed_box(
        Vec3::new(165.0, 330.0, 165.0),
        15.0,
        Vec3::new(265.0, 0.0, 295.0),
    ));
    world.add(placed_box(
        Vec3::splat(165.0),
        -18.0,
        Vec3::new(130.0, 0.0, 65.0),
    ));

    Ok(Scene {
        world: Arc::new(BvhNode::from_list(world)?),
        camera: cornell_camera(),
    })
}

/// The Cornell box with its two blocks replaced by black and white smoke.
fn cornell_smoke() -> Result<Scene> {
    let light: Arc<dyn Material> = Arc::new(DiffuseLight::from_color(Color::splat(7.0)));
    let mut world = cornell_walls(light, 300.0);

    let tall = placed_box(
        Vec3::new(165.0, 330.0, 165.0),
        15.0,
        Vec3::new(265.0, 0.0, 295.0),
    );
    let short = placed_box(Vec3::splat(165.0), -18.0, Vec3::new(130.0, 0.0, 65.0));

    world.add(Arc::new(ConstantMedium::from_color(tall, 0.01, Color::ZERO)));
    world.add(Arc::new(ConstantMedium::from_color(short, 0.01, Color::ONE)));

    Ok(Scene {
        world: Arc::new(BvhNode::from_list(world)?),
        camera: cornell_camera(),
    })
}
