//! Parallel tile renderer.
//!
//! Tiles are scheduled on a dedicated rayon pool. Each tile renders into its
//! own buffer and the buffers are merged once the pool drains, so the scene is
//! only ever read concurrently.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::framebuffer::{Framebuffer, ImageBuffer};
use crate::tile::{generate_tiles, render_tile, Tile, TileResult, DEFAULT_TILE_SIZE};
use crate::{Camera, Hittable};

/// Hardware threads left free for the driving thread when the worker count is
/// not set explicitly.
pub const RESERVED_THREADS: usize = 1;

/// Scheduling options, loadable from a settings file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Worker threads; `None` uses the machine's parallelism minus
    /// [`RESERVED_THREADS`]
    pub threads: Option<usize>,
    /// Tile edge length in pixels
    pub tile_size: u32,
    /// Base seed for every tile's random stream
    pub seed: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            threads: None,
            tile_size: DEFAULT_TILE_SIZE,
            seed: 0,
        }
    }
}

impl RenderOptions {
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of workers the pool will be built with. Always at least one.
    pub fn worker_count(&self) -> usize {
        match self.threads {
            Some(n) => n.max(1),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .saturating_sub(RESERVED_THREADS)
                .max(1),
        }
    }
}

/// Shared flag that stops a render in progress.
///
/// Clones share the same flag. Workers check it before each tile and between
/// sample passes, so a cancelled render winds down within one pass.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A finished render.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub framebuffer: Framebuffer,
    /// Tiles that panicked; their pixels hold no samples and resolve to black
    pub failed_tiles: usize,
    pub elapsed: Duration,
}

impl RenderOutput {
    pub fn image(&self) -> ImageBuffer {
        self.framebuffer.resolve()
    }
}

enum TileOutcome {
    Done(TileResult),
    Failed,
    Cancelled,
}

/// Render `world` through `camera`.
pub fn render(
    camera: &Camera,
    world: &dyn Hittable,
    options: &RenderOptions,
) -> RenderResult<RenderOutput> {
    render_with_cancel(camera, world, options, &CancelToken::new())
}

/// Render `world` through `camera`, stopping early if `cancel` fires.
///
/// A tile that panics is logged and left empty; the rest of the image still
/// renders. Returns [`RenderError::Cancelled`] if the token was set before the
/// render finished.
pub fn render_with_cancel(
    camera: &Camera,
    world: &dyn Hittable,
    options: &RenderOptions,
    cancel: &CancelToken,
) -> RenderResult<RenderOutput> {
    let start = Instant::now();
    let width = camera.image_width();
    let height = camera.image_height();
    let workers = options.worker_count();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("ember-worker-{i}"))
        .build()?;

    let tiles = generate_tiles(width, height, options.tile_size);
    let total = tiles.len();
    let completed = AtomicUsize::new(0);

    log::info!(
        "Rendering {}x{} at {} spp, max depth {}: {} tiles on {} threads",
        width,
        height,
        camera.samples_per_pixel(),
        camera.max_depth(),
        total,
        workers
    );

    let outcomes: Vec<TileOutcome> = pool.install(|| {
        tiles
            .par_iter()
            .map(|tile| {
                if cancel.is_cancelled() {
                    return TileOutcome::Cancelled;
                }

                let outcome = run_tile(tile, camera, world, options.seed, cancel);

                if let TileOutcome::Done(_) = outcome {
                    let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                    log_progress(done, total);
                }
                outcome
            })
            .collect()
    });

    if cancel.is_cancelled() {
        log::warn!(
            "Render cancelled after {}/{} tiles",
            completed.load(Ordering::Relaxed),
            total
        );
        return Err(RenderError::Cancelled);
    }

    let mut framebuffer = Framebuffer::new(width, height);
    let mut failed_tiles = 0;
    for outcome in &outcomes {
        match outcome {
            TileOutcome::Done(result) => framebuffer.write_tile(result),
            TileOutcome::Failed => failed_tiles += 1,
            TileOutcome::Cancelled => return Err(RenderError::Cancelled),
        }
    }

    let elapsed = start.elapsed();
    if failed_tiles > 0 {
        log::warn!("{failed_tiles} of {total} tiles failed; image is incomplete");
    }
    log::info!("Render finished in {:.2}s", elapsed.as_secs_f64());

    Ok(RenderOutput {
        framebuffer,
        failed_tiles,
        elapsed,
    })
}

/// Render one tile, converting a panic into [`TileOutcome::Failed`].
fn run_tile(
    tile: &Tile,
    camera: &Camera,
    world: &dyn Hittable,
    seed: u64,
    cancel: &CancelToken,
) -> TileOutcome {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        render_tile(tile, camera, world, seed, cancel)
    }));

    match result {
        Ok(Ok(result)) => TileOutcome::Done(result),
        Ok(Err(_)) => TileOutcome::Cancelled,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::error!(
                "Tile {} at ({}, {}) {}x{} failed: {}",
                tile.index,
                tile.x,
                tile.y,
                tile.width,
                tile.height,
                message
            );
            TileOutcome::Failed
        }
    }
}

/// Log every tile at debug level and every tenth of the image at info.
fn log_progress(done: usize, total: usize) {
    log::debug!("Completed {done}/{total} tiles");

    let step = (total / 10).max(1);
    if done % step == 0 || done == total {
        log::info!("Progress: {}% ({done}/{total} tiles)", done * 100 / total);
    }
}
