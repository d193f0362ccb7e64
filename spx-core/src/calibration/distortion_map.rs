use nalgebra::Vector2;
use tracing::debug;

use crate::error::{CalibrationError, Result};

/// Control points along X in the sensor's calibration grid
pub const SENSOR_GRID_WIDTH: usize = 64;

/// Control points along Y in the sensor's calibration grid
pub const SENSOR_GRID_HEIGHT: usize = 63;

/// Values stored per grid cell (normalized X, normalized Y)
const VALUES_PER_CELL: usize = 2;

/// Sparse calibration grid mapping output locations to normalized source
/// coordinates.
///
/// Entries live in a flat `f32` buffer. Cell `(x, y)` keeps its X component at
/// `2 * x + y * row_pitch` and its Y component right after it. The pitch may
/// exceed `2 * grid_width` when the driver pads rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DistortionMap {
    grid_width: usize,
    grid_height: usize,
    row_pitch: usize,
    entries: Vec<f32>,
}

impl DistortionMap {
    pub fn new(
        grid_width: usize,
        grid_height: usize,
        row_pitch: usize,
        entries: Vec<f32>,
    ) -> Result<Self> {
        if grid_width < 2 || grid_height < 2 {
            return Err(CalibrationError::DegenerateGrid {
                width: grid_width,
                height: grid_height,
            }
            .into());
        }

        let row_len = grid_width
            .checked_mul(VALUES_PER_CELL)
            .ok_or(CalibrationError::PitchTooSmall {
                pitch: row_pitch,
                required: usize::MAX,
            })?;
        if row_pitch < row_len {
            return Err(CalibrationError::PitchTooSmall {
                pitch: row_pitch,
                required: row_len,
            }
            .into());
        }

        // Last addressed value is the Y component of cell (w - 1, h - 1).
        let required = (grid_height - 1)
            .checked_mul(row_pitch)
            .and_then(|n| n.checked_add(row_len))
            .ok_or(CalibrationError::BufferTooShort {
                len: entries.len(),
                required: usize::MAX,
            })?;
        if entries.len() < required {
            return Err(CalibrationError::BufferTooShort {
                len: entries.len(),
                required,
            }
            .into());
        }

        debug!(
            grid_width,
            grid_height,
            row_pitch,
            len = entries.len(),
            "loaded distortion map"
        );

        Ok(Self {
            grid_width,
            grid_height,
            row_pitch,
            entries,
        })
    }

    /// Map in the sensor's 64x63 layout with tightly packed rows
    pub fn sensor(entries: Vec<f32>) -> Result<Self> {
        Self::new(
            SENSOR_GRID_WIDTH,
            SENSOR_GRID_HEIGHT,
            SENSOR_GRID_WIDTH * VALUES_PER_CELL,
            entries,
        )
    }

    /// Map whose every cell holds the same normalized coordinate
    pub fn constant(grid_width: usize, grid_height: usize, x: f32, y: f32) -> Result<Self> {
        let len = grid_width.saturating_mul(grid_height);
        let entries = std::iter::repeat_n([x, y], len).flatten().collect();
        Self::new(grid_width, grid_height, grid_width * VALUES_PER_CELL, entries)
    }

    /// Build a tightly packed map by evaluating `f(x, y)` at every cell
    pub fn from_fn<F>(grid_width: usize, grid_height: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> (f32, f32),
    {
        let mut entries = Vec::with_capacity(grid_width.saturating_mul(grid_height) * 2);
        for y in 0..grid_height {
            for x in 0..grid_width {
                let (nx, ny) = f(x, y);
                entries.push(nx);
                entries.push(ny);
            }
        }
        Self::new(grid_width, grid_height, grid_width * VALUES_PER_CELL, entries)
    }

    pub fn grid_width(&self) -> usize {
        self.grid_width
    }

    pub fn grid_height(&self) -> usize {
        self.grid_height
    }

    /// Number of values between the starts of consecutive grid rows
    pub fn row_pitch(&self) -> usize {
        self.row_pitch
    }

    pub fn entries(&self) -> &[f32] {
        &self.entries
    }

    /// Normalized source coordinate stored at grid cell `(x, y)`
    pub fn try_entry(&self, x: usize, y: usize) -> Result<Vector2<f64>> {
        if x >= self.grid_width || y >= self.grid_height {
            return Err(CalibrationError::CellOutOfRange {
                x,
                y,
                width: self.grid_width,
                height: self.grid_height,
            }
            .into());
        }
        Ok(self.entry(x, y))
    }

    /// Unchecked-by-result accessor; callers keep `x < grid_width` and
    /// `y < grid_height`, which construction guarantees to be in the buffer.
    pub(crate) fn entry(&self, x: usize, y: usize) -> Vector2<f64> {
        let base = x * VALUES_PER_CELL + y * self.row_pitch;
        Vector2::new(
            f64::from(self.entries[base]),
            f64::from(self.entries[base + 1]),
        )
    }

    /// Smallest and largest (x, y) components over all grid cells
    pub fn bounds(&self) -> (Vector2<f64>, Vector2<f64>) {
        let mut lo = Vector2::repeat(f64::INFINITY);
        let mut hi = Vector2::repeat(f64::NEG_INFINITY);
        for y in 0..self.grid_height {
            for x in 0..self.grid_width {
                let e = self.entry(x, y);
                lo = lo.inf(&e);
                hi = hi.sup(&e);
            }
        }
        (lo, hi)
    }
}
