use thiserror::Error;

/// Common errors across the proximity pipeline
#[derive(Error, Debug)]
pub enum SpxError {
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("Invalid calibration: {0}")]
    InvalidCalibration(#[from] CalibrationError),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("I/O error: {0}")]
    Io(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("image has no pixels")]
    EmptyImage,

    #[error("pixel buffer holds {actual} samples, expected {width}x{height} = {expected}")]
    LengthMismatch {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("image dimensions {width}x{height} overflow")]
    DimensionOverflow { width: usize, height: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("degenerate grid {width}x{height} (need at least 2x2 control points)")]
    DegenerateGrid { width: usize, height: usize },

    #[error("row pitch {pitch} is smaller than one row of cells ({required})")]
    PitchTooSmall { pitch: usize, required: usize },

    #[error("calibration buffer holds {len} values, grid addresses {required}")]
    BufferTooShort { len: usize, required: usize },

    #[error("grid cell ({x}, {y}) outside {width}x{height} grid")]
    CellOutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },

    #[error("no calibration map for camera {0}")]
    MissingMap(usize),
}

pub type Result<T> = std::result::Result<T, SpxError>;
