use std::path::PathBuf;

use gpu::BackendError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// An operation was called in a state that does not allow it.
    #[error("lifecycle error: {0}")]
    Lifecycle(&'static str),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("texture {} not readable: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("texture decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("texture {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
