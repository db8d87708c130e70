use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed coordinate string at byte {offset}: {reason}")]
    MalformedInput { offset: usize, reason: String },

    #[error("Invalid bounds: {width}x{height} is not a usable image domain")]
    InvalidBounds { width: i64, height: i64 },

    #[error("Point ({x}, {y}) lies outside the triangulation domain")]
    OutsideDomain { x: i32, y: i32 },

    #[error("Image unavailable at {}: {source}", .path.display())]
    ImageUnavailable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid arguments: {0}")]
    Argument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
