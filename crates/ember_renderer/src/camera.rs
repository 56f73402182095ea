//! Camera for ray generation.

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::random::{random_f32, random_in_unit_disk};
use crate::{Color, Ray, Vec3};

/// What a ray sees when it leaves the scene.
///
/// Scenes either light themselves with emitters against a solid colour or
/// rely on the sky; the two are never combined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    Solid(Color),
    /// Vertical white-to-blue gradient
    #[default]
    Sky,
}

impl Background {
    pub fn color(&self, ray: &Ray) -> Color {
        match self {
            Background::Solid(color) => *color,
            Background::Sky => {
                let unit_direction = ray.direction().normalize();
                let a = 0.5 * (unit_direction.y + 1.0);
                (1.0 - a) * Color::ONE + a * Color::new(0.5, 0.7, 1.0)
            }
        }
    }
}

/// User-facing camera description, loadable from a settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Width over height
    pub aspect_ratio: f32,
    pub image_width: u32,
    pub samples_per_pixel: u32,
    /// Maximum number of bounces per path
    pub max_depth: u32,

    /// Vertical field of view in degrees
    pub vfov: f32,
    pub look_from: Vec3,
    pub look_at: Vec3,
    pub vup: Vec3,

    /// Aperture cone angle in degrees; 0 disables depth of field
    pub defocus_angle: f32,
    /// Distance from the camera to the plane of perfect focus
    pub focus_dist: f32,

    pub background: Background,
    /// Rays sample times in `[0, shutter_speed)`; `None` freezes time at 0
    pub shutter_speed: Option<f32>,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: 1.0,
            image_width: 100,
            samples_per_pixel: 10,
            max_depth: 10,
            vfov: 90.0,
            look_from: Vec3::new(0.0, 0.0, -1.0),
            look_at: Vec3::ZERO,
            vup: Vec3::Y,
            defocus_angle: 0.0,
            focus_dist: 10.0,
            background: Background::Sky,
            shutter_speed: None,
        }
    }
}

impl CameraSettings {
    /// Set the aspect ratio and image width; the height is derived.
    pub fn with_image(mut self, aspect_ratio: f32, image_width: u32) -> Self {
        self.aspect_ratio = aspect_ratio;
        self.image_width = image_width;
        self
    }

    /// Set quality settings.
    pub fn with_quality(mut self, samples_per_pixel: u32, max_depth: u32) -> Self {
        self.samples_per_pixel = samples_per_pixel;
        self.max_depth = max_depth;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, defocus_angle: f32, focus_dist: f32) -> Self {
        self.vfov = vfov;
        self.defocus_angle = defocus_angle;
        self.focus_dist = focus_dist;
        self
    }

    pub fn with_background(mut self, background: Background) -> Self {
        self.background = background;
        self
    }

    pub fn with_shutter(mut self, shutter_speed: f32) -> Self {
        self.shutter_speed = Some(shutter_speed);
        self
    }

    fn validate(&self) -> RenderResult<()> {
        let invalid = |msg: String| Err(RenderError::InvalidCamera(msg));

        if self.image_width == 0 {
            return invalid("image_width must be positive".into());
        }
        if self.samples_per_pixel == 0 {
            return invalid("samples_per_pixel must be positive".into());
        }
        if !self.aspect_ratio.is_finite() || self.aspect_ratio <= 0.0 {
            return invalid(format!("aspect_ratio {} is not a positive number", self.aspect_ratio));
        }
        if self.vfov.is_nan() || self.vfov <= 0.0 || self.vfov >= 180.0 {
            return invalid(format!("vfov {} is outside (0, 180)", self.vfov));
        }
        if self.focus_dist.is_nan() || self.focus_dist <= 0.0 {
            return invalid(format!("focus_dist {} must be positive", self.focus_dist));
        }
        if !(0.0..180.0).contains(&self.defocus_angle) {
            return invalid(format!("defocus_angle {} is outside [0, 180)", self.defocus_angle));
        }
        if let Some(shutter) = self.shutter_speed {
            if !(0.0..=1.0).contains(&shutter) {
                return invalid(format!("shutter_speed {shutter} is outside [0, 1]"));
            }
        }
        let view = self.look_from - self.look_at;
        if view.length_squared() == 0.0 {
            return invalid("look_from and look_at coincide".into());
        }
        if self.vup.cross(view).length_squared() < 1e-12 {
            return invalid("vup is parallel to the view direction".into());
        }
        Ok(())
    }
}

/// Camera with its viewport precomputed from [`CameraSettings`].
#[derive(Debug, Clone)]
pub struct Camera {
    settings: CameraSettings,
    image_height: u32,

    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    defocus_disk_u: Vec3,
    defocus_disk_v: Vec3,
}

impl Camera {
    /// Validate the settings and derive the viewport.
    pub fn new(settings: CameraSettings) -> RenderResult<Self> {
        settings.validate()?;

        let image_width = settings.image_width;
        let image_height = ((image_width as f32 / settings.aspect_ratio) as u32).max(1);
        let center = settings.look_from;

        // Viewport dimensions at the focus plane
        let h = (settings.vfov.to_radians() / 2.0).tan();
        let viewport_height = 2.0 * h * settings.focus_dist;
        let viewport_width = viewport_height * (image_width as f32 / image_height as f32);

        // Orthonormal camera basis
        let w = (settings.look_from - settings.look_at).normalize();
        let u = settings.vup.cross(w).normalize();
        let v = w.cross(u);

        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;

        let pixel_delta_u = viewport_u / image_width as f32;
        let pixel_delta_v = viewport_v / image_height as f32;

        let viewport_upper_left =
            center - settings.focus_dist * w - viewport_u / 2.0 - viewport_v / 2.0;
        let pixel00_loc = viewport_upper_left + 0.5 * (pixel_delta_u + pixel_delta_v);

        let defocus_radius = settings.focus_dist * (settings.defocus_angle / 2.0).to_radians().tan();

        log::debug!(
            "Camera {}x{} @ {} spp, depth {}, vfov {}",
            image_width,
            image_height,
            settings.samples_per_pixel,
            settings.max_depth,
            settings.vfov
        );

        Ok(Self {
            image_height,
            center,
            pixel00_loc,
            pixel_delta_u,
            pixel_delta_v,
            u,
            v,
            w,
            defocus_disk_u: u * defocus_radius,
            defocus_disk_v: v * defocus_radius,
            settings,
        })
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn image_width(&self) -> u32 {
        self.settings.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn samples_per_pixel(&self) -> u32 {
        self.settings.samples_per_pixel
    }

    pub fn max_depth(&self) -> u32 {
        self.settings.max_depth
    }

    pub fn background(&self) -> Background {
        self.settings.background
    }

    /// Orthonormal basis `(u, v, w)`; `w` points away from the view direction.
    pub fn basis(&self) -> (Vec3, Vec3, Vec3) {
        (self.u, self.v, self.w)
    }

    /// Generate a jittered ray through pixel `(i, j)`.
    ///
    /// The sample position is uniform over the pixel square (no
    /// stratification). The origin is on the defocus disk when depth of field
    /// is enabled.
    pub fn get_ray(&self, i: u32, j: u32) -> Ray {
        let offset = sample_square();

        let pixel_sample = self.pixel00_loc
            + ((i as f32) + offset.x) * self.pixel_delta_u
            + ((j as f32) + offset.y) * self.pixel_delta_v;

        let ray_origin = if self.settings.defocus_angle <= 0.0 {
            self.center
        } else {
            self.defocus_disk_sample()
        };

        let ray_time = self
            .settings
            .shutter_speed
            .map_or(0.0, |shutter| random_f32() * shutter);

        Ray::new(ray_origin, pixel_sample - ray_origin, ray_time)
    }

    fn defocus_disk_sample(&self) -> Vec3 {
        let p = random_in_unit_disk();
        self.center + p.x * self.defocus_disk_u + p.y * self.defocus_disk_v
    }
}

/// Random offset in the square [-0.5, 0.5) x [-0.5, 0.5).
fn sample_square() -> Vec3 {
    Vec3::new(random_f32() - 0.5, random_f32() - 0.5, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seed_thread;

    fn looking_down_z() -> CameraSettings {
        CameraSettings::default()
            .with_image(1.0, 100)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_lens(90.0, 0.0, 1.0)
    }

    #[test]
    fn test_camera_basis() {
        let camera = Camera::new(looking_down_z()).expect("valid settings");
        let (u, v, w) = camera.basis();

        assert!((w - Vec3::Z).length() < 1e-6);
        assert!((u - Vec3::X).length() < 1e-6);
        assert!((v - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_image_height_from_aspect() {
        let camera = Camera::new(looking_down_z().with_image(16.0 / 9.0, 400)).expect("valid");
        assert_eq!(camera.image_height(), 225);

        let wide = Camera::new(looking_down_z().with_image(1000.0, 10)).expect("valid");
        assert_eq!(wide.image_height(), 1);
    }

    #[test]
    fn test_rays_stay_inside_their_pixel() {
        seed_thread(1);
        let camera = Camera::new(looking_down_z()).expect("valid settings");

        // At focus distance 1 and 90° the viewport spans [-1, 1]; each pixel is 0.02 wide.
        for _ in 0..200 {
            let ray = camera.get_ray(50, 50);
            assert_eq!(ray.origin(), Vec3::ZERO);
            let p = ray.at(1.0);
            assert!((p.x - 0.01).abs() <= 0.01 + 1e-5, "x = {}", p.x);
            assert!((p.y + 0.01).abs() <= 0.01 + 1e-5, "y = {}", p.y);
            assert!((p.z + 1.0).abs() < 1e-6);
            assert_eq!(ray.time(), 0.0);
        }
    }

    #[test]
    fn test_defocus_disk_origin() {
        seed_thread(2);
        let settings = looking_down_z().with_lens(90.0, 90.0, 1.0);
        let camera = Camera::new(settings).expect("valid settings");

        // Radius = focus_dist * tan(45°) = 1
        let mut moved = false;
        for _ in 0..100 {
            let ray = camera.get_ray(10, 10);
            assert!(ray.origin().length() <= 1.0 + 1e-5);
            assert_eq!(ray.origin().z, 0.0);
            moved |= ray.origin() != Vec3::ZERO;
        }
        assert!(moved);
    }

    #[test]
    fn test_shutter_time() {
        seed_thread(3);
        let camera = Camera::new(looking_down_z().with_shutter(0.5)).expect("valid settings");

        for _ in 0..100 {
            let t = camera.get_ray(0, 0).time();
            assert!((0.0..0.5).contains(&t));
        }
    }

    #[test]
    fn test_invalid_settings() {
        let cases = [
            looking_down_z().with_image(1.0, 0),
            looking_down_z().with_quality(0, 10),
            looking_down_z().with_image(f32::NAN, 100),
            looking_down_z().with_lens(180.0, 0.0, 1.0),
            looking_down_z().with_lens(90.0, -1.0, 1.0),
            looking_down_z().with_lens(90.0, f32::NAN, 1.0),
            looking_down_z().with_lens(90.0, f32::INFINITY, 1.0),
            looking_down_z().with_position(Vec3::ONE, Vec3::ONE, Vec3::Y),
            looking_down_z().with_position(Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0), Vec3::Y),
        ];
        for settings in cases {
            assert!(matches!(Camera::new(settings), Err(RenderError::InvalidCamera(_))));
        }
    }

    #[test]
    fn test_sky_background() {
        let up = Background::Sky.color(&Ray::new_simple(Vec3::ZERO, Vec3::Y));
        let down = Background::Sky.color(&Ray::new_simple(Vec3::ZERO, -Vec3::Y));

        assert!((up - Color::new(0.5, 0.7, 1.0)).length() < 1e-6);
        assert!((down - Color::ONE).length() < 1e-6);
        assert_eq!(
            Background::Solid(Color::splat(0.2)).color(&Ray::default()),
            Color::splat(0.2)
        );
    }

    #[test]
    fn test_settings_from_json() {
        let json = r#"{
            "image_width": 320,
            "samples_per_pixel": 4,
            "look_from": [0.0, 1.0, 5.0],
            "background": { "solid": [0.0, 0.0, 0.0] }
        }"#;
        let settings: CameraSettings = serde_json::from_str(json).expect("parses");

        assert_eq!(settings.image_width, 320);
        assert_eq!(settings.samples_per_pixel, 4);
        assert_eq!(settings.look_from, Vec3::new(0.0, 1.0, 5.0));
        assert_eq!(settings.background, Background::Solid(Color::ZERO));
        assert_eq!(settings.max_depth, CameraSettings::default().max_depth);
    }
}
