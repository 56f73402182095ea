//! Error types for scene assembly and rendering.

use thiserror::Error;

/// Errors that can occur while building acceleration structures or rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot build a BVH over an empty scene")]
    EmptyScene,

    #[error("Invalid camera settings: {0}")]
    InvalidCamera(String),

    #[error("Failed to start render thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Render was cancelled")]
    Cancelled,
}

pub type RenderResult<T> = Result<T, RenderError>;
