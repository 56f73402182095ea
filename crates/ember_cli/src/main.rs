//! Ember command-line renderer.
//!
//! Usage: `ember [--log-level LEVEL] [scene] [output.png] [settings.json]`
//!
//! The settings file may hold a `camera` object overriding fields of the
//! scene's camera preset and a `render` object with scheduling options.
//! Unset fields keep the preset's values.

mod scenes;

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use ember_renderer::{render, Camera, CameraSettings, RenderOptions};
use log::LevelFilter;
use serde::Deserialize;
use serde_json::Value;

use crate::scenes::SceneKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "ember", version, about = "Offline CPU path tracer")]
struct Args {
    /// Scene to render (spheres, checkers, quads, lights, cornell, smoke); a
    /// unique prefix is enough
    #[arg(default_value = "spheres", value_parser = SceneKind::from_str)]
    scene: SceneKind,

    /// PNG file to write
    #[arg(default_value = "output.png")]
    output: PathBuf,

    /// JSON file with `camera` and `render` overrides
    settings: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "info", help = "Set the logging level")]
    log_level: LogLevel,
}

/// Contents of an optional settings file.
///
/// `camera` stays untyped until the scene preset is known so that only the
/// fields present in the file replace the preset's.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Settings {
    camera: Option<Value>,
    render: RenderOptions,
}

impl Settings {
    fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    /// Overlay the file's camera fields onto `preset`.
    fn camera_settings(&self, preset: CameraSettings) -> Result<CameraSettings> {
        let Some(overrides) = &self.camera else {
            return Ok(preset);
        };
        let Value::Object(fields) = overrides else {
            bail!("'camera' in the settings file must be an object");
        };

        let mut merged = serde_json::to_value(preset)?;
        if let Value::Object(target) = &mut merged {
            for (key, value) in fields {
                target.insert(key.clone(), value.clone());
            }
        }
        serde_json::from_value(merged).context("Invalid camera settings")
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    log::info!("Starting Ember");

    run(&args).inspect_err(|err| log::error!("{err:#}"))
}

fn run(args: &Args) -> Result<()> {
    let settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let start = std::time::Instant::now();
    let scene = args
        .scene
        .build(settings.render.seed)
        .with_context(|| format!("Failed to build scene '{}'", args.scene))?;
    log::info!("Scene '{}' built in {:?}", args.scene, start.elapsed());

    let camera_settings = settings.camera_settings(scene.camera)?;
    let camera = Camera::new(camera_settings).context("Failed to set up camera")?;

    let output = render(&camera, scene.world.as_ref(), &settings.render)?;
    if output.failed_tiles > 0 {
        log::warn!("{} tiles failed and were left black", output.failed_tiles);
    }

    let image = output.image();
    save_png(&args.output, image.width, image.height, image.to_rgba8())?;
    log::info!("Saved {}", args.output.display());

    Ok(())
}

fn save_png(path: &Path, width: u32, height: u32, rgba: Vec<u8>) -> Result<()> {
    let buffer = image::RgbaImage::from_raw(width, height, rgba)
        .context("Pixel buffer does not match image dimensions")?;
    buffer
        .save(path)
        .with_context(|| format!("Failed to write image {}", path.display()))
}
