//! Tile-based image partitioning.
//!
//! Splits the image into rectangular tiles that are rendered independently
//! and in parallel. Each tile owns its accumulation buffer, so workers never
//! write to shared pixels.

use crate::error::{RenderError, RenderResult};
use crate::integrator::ray_color;
use crate::random::{seed_thread, tile_seed};
use crate::renderer::CancelToken;
use crate::{Camera, Color, Hittable};

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 16;

/// A rectangular region of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Column of the tile's top-left pixel
    pub x: u32,
    /// Row of the tile's top-left pixel
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position in render order; also selects the tile's RNG stream
    pub index: usize,
}

impl Tile {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Cover a `width` x `height` image with tiles of at most `tile_size` pixels
/// per side, ordered from the image centre outward.
///
/// Edge tiles are clipped to the image, so the tiles are disjoint and cover
/// every pixel exactly once. A `tile_size` of zero is treated as one.
pub fn generate_tiles(width: u32, height: u32, tile_size: u32) -> Vec<Tile> {
    let tile_size = tile_size.max(1);
    let mut tiles = Vec::new();

    for y in (0..height).step_by(tile_size as usize) {
        for x in (0..width).step_by(tile_size as usize) {
            let tw = tile_size.min(width - x);
            let th = tile_size.min(height - y);
            tiles.push(Tile::new(x, y, tw, th, tiles.len()));
        }
    }

    sort_spiral(&mut tiles, width, height);

    for (i, tile) in tiles.iter_mut().enumerate() {
        tile.index = i;
    }

    tiles
}

/// Sort tiles by squared distance from the image centre. Ties keep row-major
/// order.
fn sort_spiral(tiles: &mut [Tile], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    let distance = |t: &Tile| {
        let dx = t.x as f32 + t.width as f32 / 2.0 - center_x;
        let dy = t.y as f32 + t.height as f32 / 2.0 - center_y;
        dx * dx + dy * dy
    };

    tiles.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Accumulated radiance for one tile.
#[derive(Debug, Clone)]
pub struct TileResult {
    pub tile: Tile,
    /// Summed samples in row-major order within the tile
    pub accum: Vec<Color>,
    /// Samples taken at every pixel of the tile
    pub samples: u32,
}

/// Render every pixel of `tile`, one full pass over the tile per sample.
///
/// The calling thread's generator is reseeded from `(seed, tile.index)` first,
/// so the result is independent of which worker runs the tile. Returns
/// [`RenderError::Cancelled`] if `cancel` fires between passes.
pub fn render_tile(
    tile: &Tile,
    camera: &Camera,
    world: &dyn Hittable,
    seed: u64,
    cancel: &CancelToken,
) -> RenderResult<TileResult> {
    seed_thread(tile_seed(seed, tile.index));

    let background = camera.background();
    let max_depth = camera.max_depth();
    let mut accum = vec![Color::ZERO; tile.pixel_count()];
    let mut samples = 0;

    for _ in 0..camera.samples_per_pixel() {
        if cancel.is_cancelled() {
            return Err(RenderError::Cancelled);
        }

        for (offset, pixel) in accum.iter_mut().enumerate() {
            let i = tile.x + (offset as u32 % tile.width);
            let j = tile.y + (offset as u32 / tile.width);
            let ray = camera.get_ray(i, j);
            *pixel += ray_color(&ray, max_depth, world, &background);
        }
        samples += 1;
    }

    Ok(TileResult {
        tile: *tile,
        accum,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Background, CameraSettings, DiffuseLight, HittableList, Sphere, Vec3};
    use std::sync::Arc;

    fn assert_exact_cover(tiles: &[Tile], width: u32, height: u32) {
        let mut hits = vec![0u32; (width * height) as usize];
        for tile in tiles {
            assert!(tile.width > 0 && tile.height > 0);
            for y in tile.y..tile.y + tile.height {
                for x in tile.x..tile.x + tile.width {
                    assert!(x < width && y < height, "tile {tile:?} leaves the image");
                    hits[(y * width + x) as usize] += 1;
                }
            }
        }
        assert!(hits.iter().all(|&n| n == 1), "pixels covered more or less than once");
    }

    #[test]
    fn test_generate_tiles_exact_fit() {
        let tiles = generate_tiles(64, 32, 16);
        assert_eq!(tiles.len(), 8);
        assert_exact_cover(&tiles, 64, 32);
    }

    #[test]
    fn test_generate_tiles_partial_fit() {
        // Bottom rows must be clipped against the image height, not the width.
        let tiles = generate_tiles(40, 100, 16);
        assert_eq!(tiles.len(), 3 * 7);
        assert_exact_cover(&tiles, 40, 100);

        let total: usize = tiles.iter().map(Tile::pixel_count).sum();
        assert_eq!(total, 40 * 100);
    }

    #[test]
    fn test_generate_tiles_odd_sizes() {
        for &(w, h, s) in &[(1, 1, 16), (17, 3, 16), (3, 17, 4), (100, 1, 7), (5, 5, 0)] {
            assert_exact_cover(&generate_tiles(w, h, s), w, h);
        }
        assert!(generate_tiles(0, 10, 16).is_empty());
    }

    #[test]
    fn test_spiral_order() {
        let tiles = generate_tiles(48, 48, 16);
        assert_eq!(tiles.len(), 9);
        assert_eq!((tiles[0].x, tiles[0].y), (16, 16));

        // Corners come last.
        for tile in &tiles[5..] {
            assert!(tile.x != 16 && tile.y != 16);
        }
        for (i, tile) in tiles.iter().enumerate() {
            assert_eq!(tile.index, i);
        }
    }

    #[test]
    fn test_tile_contains() {
        let tile = Tile::new(16, 32, 16, 8, 0);
        assert!(tile.contains(16, 32));
        assert!(tile.contains(31, 39));
        assert!(!tile.contains(32, 32));
        assert!(!tile.contains(16, 40));
    }

    fn glowing_scene() -> (Camera, HittableList) {
        let settings = CameraSettings::default()
            .with_image(1.0, 8)
            .with_quality(3, 4)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_background(Background::Solid(Color::ZERO));
        let camera = Camera::new(settings).expect("valid camera");

        // Surrounds the camera, so every ray sees the same emission.
        let mut world = HittableList::new();
        world.add(Arc::new(Sphere::new(
            Vec3::ZERO,
            100.0,
            Arc::new(DiffuseLight::from_color(Color::new(1.0, 2.0, 3.0))),
        )));
        (camera, world)
    }

    #[test]
    fn test_render_tile_accumulates_every_sample() {
        let (camera, world) = glowing_scene();
        let tile = Tile::new(2, 4, 5, 3, 0);

        let result =
            render_tile(&tile, &camera, &world, 1, &CancelToken::new()).expect("not cancelled");

        assert_eq!(result.tile, tile);
        assert_eq!(result.samples, 3);
        assert_eq!(result.accum.len(), 15);
        for pixel in &result.accum {
            assert!((*pixel - Color::new(3.0, 6.0, 9.0)).length() < 1e-4);
        }
    }

    #[test]
    fn test_render_tile_is_reproducible() {
        let settings = CameraSettings::default()
            .with_image(1.0, 8)
            .with_quality(4, 6);
        let camera = Camera::new(settings).expect("valid camera");
        let mut world = HittableList::new();
        world.add(Arc::new(Sphere::new(
            Vec3::new(0.0, 0.0, 2.0),
            1.0,
            Arc::new(crate::Lambertian::from_color(Color::splat(0.5))),
        )));
        let tile = Tile::new(0, 0, 8, 8, 3);
        let cancel = CancelToken::new();

        let a = render_tile(&tile, &camera, &world, 99, &cancel).expect("first");
        let b = render_tile(&tile, &camera, &world, 99, &cancel).expect("second");
        assert_eq!(a.accum, b.accum);
    }

    #[test]
    fn test_render_tile_honours_cancel() {
        let (camera, world) = glowing_scene();
        let cancel = CancelToken::new();
        cancel.cancel();

        let result = render_tile(&Tile::new(0, 0, 4, 4, 0), &camera, &world, 0, &cancel);
        assert!(matches!(result, Err(RenderError::Cancelled)));
    }
}
