//! Loading calibration, recorded frames and settings into the core types

pub mod calibration;
pub mod error;
pub mod export;
pub mod frames;
pub mod settings;

pub use calibration::{CalibrationFile, load_calibration};
pub use error::{IoError, Result};
pub use export::to_gray_image;
pub use frames::{DirectoryFrameSource, load_raw_image};
pub use settings::load_settings;
