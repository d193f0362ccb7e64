//! Fisheye correction through a sparse calibration grid

mod distortion_map;
mod rectify;

pub use distortion_map::{DistortionMap, SENSOR_GRID_HEIGHT, SENSOR_GRID_WIDTH};
pub use rectify::{RECTIFIED_HEIGHT, RECTIFIED_WIDTH, RectifiedImage, Rectifier, RectifyStats};
