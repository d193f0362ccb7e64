use nalgebra::Vector2;
use ndarray::parallel::prelude::*;
use ndarray::{Array2, ArrayView2, Axis};
use tracing::{debug, warn};

use super::DistortionMap;
use crate::error::{InputError, Result};
use crate::image::RawImage;

/// Width of every rectified image
pub const RECTIFIED_WIDTH: usize = 320;

/// Height of every rectified image
pub const RECTIFIED_HEIGHT: usize = 120;

/// How the output pixels of one rectification were produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RectifyStats {
    /// Pixels copied from the raw image
    pub sampled: usize,
    /// Pixels left at 0 because the grid mapped them outside the raw image
    pub outside: usize,
    /// Sampled pixels whose source coordinate had to be clamped to the edge
    pub clamped: usize,
}

impl RectifyStats {
    fn merge(self, other: Self) -> Self {
        Self {
            sampled: self.sampled + other.sampled,
            outside: self.outside + other.outside,
            clamped: self.clamped + other.clamped,
        }
    }
}

/// Undistorted 320x120 grayscale image.
///
/// Stored row-major with shape `(rows, cols)`; output pixel `(i, j)` is column
/// `i`, row `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct RectifiedImage {
    pixels: Array2<u8>,
    stats: RectifyStats,
}

impl RectifiedImage {
    pub fn width(&self) -> usize {
        self.pixels.ncols()
    }

    pub fn height(&self) -> usize {
        self.pixels.nrows()
    }

    /// Pixel at column `i`, row `j`
    pub fn get(&self, i: usize, j: usize) -> Option<u8> {
        self.pixels.get((j, i)).copied()
    }

    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.pixels.view()
    }

    /// Row-major bytes, `j * width + i`
    pub fn as_raw(&self) -> Vec<u8> {
        self.pixels.iter().copied().collect()
    }

    pub fn into_array(self) -> Array2<u8> {
        self.pixels
    }

    pub fn stats(&self) -> RectifyStats {
        self.stats
    }
}

/// Corrects fisheye distortion by sampling the raw image through a sparse
/// calibration grid with bilinear interpolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rectifier;

impl Rectifier {
    pub fn new() -> Self {
        Self
    }

    pub fn rectify(&self, image: &RawImage, map: &DistortionMap) -> Result<RectifiedImage> {
        if image.is_empty() {
            return Err(InputError::EmptyImage.into());
        }

        let mut pixels = Array2::<u8>::zeros((RECTIFIED_HEIGHT, RECTIFIED_WIDTH));
        let stats = pixels
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .map(|(j, mut row)| {
                let mut stats = RectifyStats::default();
                for (i, out) in row.iter_mut().enumerate() {
                    match sample_source(map, i, j) {
                        Some(d) => {
                            let (value, clamped) = fetch(image, d);
                            *out = value;
                            stats.sampled += 1;
                            stats.clamped += usize::from(clamped);
                        }
                        None => stats.outside += 1,
                    }
                }
                stats
            })
            .reduce(RectifyStats::default, RectifyStats::merge);

        debug!(
            sampled = stats.sampled,
            outside = stats.outside,
            clamped = stats.clamped,
            "rectified frame"
        );
        if stats.sampled == 0 {
            warn!("calibration map covers none of the raw image");
        }

        Ok(RectifiedImage { pixels, stats })
    }
}

/// Normalized source coordinate for output pixel `(i, j)`, or `None` when the
/// grid maps it outside `[0, 1]`.
fn sample_source(map: &DistortionMap, i: usize, j: usize) -> Option<Vector2<f64>> {
    let last_x = map.grid_width() - 1;
    let last_y = map.grid_height() - 1;

    let cal_x = last_x as f64 * i as f64 / RECTIFIED_WIDTH as f64;
    let cal_y = last_y as f64 * (1.0 - j as f64 / RECTIFIED_HEIGHT as f64);

    let fx = cal_x.floor();
    let fy = cal_y.floor();
    let weight_x = cal_x - fx;
    let weight_y = cal_y - fy;

    // cal_y reaches the last grid row at j == 0; its far neighbour then has
    // zero weight, so reusing the last row leaves the blend unchanged.
    let x1 = (fx as usize).min(last_x);
    let y1 = (fy as usize).min(last_y);
    let x2 = (x1 + 1).min(last_x);
    let y2 = (y1 + 1).min(last_y);

    let c1 = map.entry(x1, y1);
    let c2 = map.entry(x2, y1);
    let c3 = map.entry(x1, y2);
    let c4 = map.entry(x2, y2);

    let d = c1 * (1.0 - weight_x) * (1.0 - weight_y)
        + c2 * weight_x * (1.0 - weight_y)
        + c3 * (1.0 - weight_x) * weight_y
        + c4 * weight_x * weight_y;

    let unit = 0.0..=1.0;
    (unit.contains(&d.x) && unit.contains(&d.y)).then_some(d)
}

/// Denormalize `d` into the raw image and read the pixel there. Returns the
/// value and whether the coordinate had to be clamped onto the image.
fn fetch(image: &RawImage, d: Vector2<f64>) -> (u8, bool) {
    let (width, height) = image.size();
    let src_x = (d.x * width as f64).floor() as usize;
    let src_y = (d.y * height as f64).floor() as usize;

    let x = src_x.min(width - 1);
    let y = src_y.min(height - 1);
    let clamped = x != src_x || y != src_y;

    (image.pixels()[x + y * width], clamped)
}
