use std::path::PathBuf;

use spx_core::SpxError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Calibration parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Raw calibration of {0} bytes is not a whole number of f32 values")]
    RawLength(usize),

    #[error("Unexpected frame file name: {0}")]
    FrameName(String),

    #[error("Frame {frame} camera {camera} recorded twice: {first} and {second}")]
    DuplicateCamera {
        frame: u64,
        camera: usize,
        first: String,
        second: String,
    },

    #[error("Frame {frame} is missing camera {camera}")]
    MissingCamera { frame: u64, camera: usize },

    #[error(transparent)]
    Core(#[from] SpxError),
}

impl IoError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}

impl From<IoError> for SpxError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Core(inner) => inner,
            other => SpxError::Io(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, IoError>;
