//! Raw sensor frames

use crate::error::{InputError, Result};

/// A single camera frame as sampled by the sensor.
///
/// Pixels are 8-bit brightness samples in row-major order. The buffer length
/// always equals `width * height`; this is checked at construction so the
/// consumers never have to re-derive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl RawImage {
    /// Wrap an owned pixel buffer, validating it against the dimensions
    pub fn new(width: usize, height: usize, pixels: Vec<u8>) -> Result<Self> {
        let expected = width
            .checked_mul(height)
            .ok_or(InputError::DimensionOverflow { width, height })?;

        if pixels.len() != expected {
            return Err(InputError::LengthMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            }
            .into());
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image where every pixel has the same brightness
    pub fn uniform(width: usize, height: usize, value: u8) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .ok_or(InputError::DimensionOverflow { width, height })?;
        Self::new(width, height, vec![value; len])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Get image dimensions (width, height)
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Row-major brightness samples
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Pixel at column `x`, row `y`
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(x + y * self.width).copied()
    }

    /// Hand the pixel buffer back to the caller
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// Brightness summary of the frame
    pub fn stats(&self) -> Result<FrameStats> {
        FrameStats::from_pixels(&self.pixels)
    }
}

/// Per-frame brightness summary
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub mean: f64,
    pub min: u8,
    pub max: u8,
}

impl FrameStats {
    fn from_pixels(pixels: &[u8]) -> Result<Self> {
        let mean = mean_brightness(pixels)?;
        let (min, max) = pixels
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));

        Ok(Self { mean, min, max })
    }
}

/// Arithmetic mean of the samples on the 0-255 scale
pub(crate) fn mean_brightness(pixels: &[u8]) -> Result<f64> {
    if pixels.is_empty() {
        return Err(InputError::EmptyImage.into());
    }

    let sum: u64 = pixels.iter().map(|&p| u64::from(p)).sum();
    Ok(sum as f64 / pixels.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpxError;

    #[test]
    fn test_new_validates_length() {
        let err = RawImage::new(2, 2, vec![0; 3]).unwrap_err();
        assert!(matches!(
            err,
            SpxError::InvalidInput(InputError::LengthMismatch {
                expected: 4,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_new_rejects_overflowing_dimensions() {
        let err = RawImage::new(usize::MAX, 2, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            SpxError::InvalidInput(InputError::DimensionOverflow { .. })
        ));
    }

    #[test]
    fn test_empty_image_is_constructible() {
        let img = RawImage::new(0, 0, Vec::new()).unwrap();
        assert!(img.is_empty());
        assert_eq!(img.size(), (0, 0));
    }

    #[test]
    fn test_get_is_row_major() {
        let img = RawImage::new(2, 2, vec![10, 20, 30, 40]).unwrap();
        assert_eq!(img.get(0, 0), Some(10));
        assert_eq!(img.get(1, 0), Some(20));
        assert_eq!(img.get(0, 1), Some(30));
        assert_eq!(img.get(1, 1), Some(40));
        assert_eq!(img.get(2, 0), None);
        assert_eq!(img.get(0, 2), None);
    }

    #[test]
    fn test_stats() {
        let img = RawImage::new(4, 1, vec![0, 50, 100, 250]).unwrap();
        let stats = img.stats().unwrap();
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 250);
        assert!((stats.mean - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_stats_empty_image() {
        let img = RawImage::new(0, 0, Vec::new()).unwrap();
        assert!(matches!(
            img.stats(),
            Err(SpxError::InvalidInput(InputError::EmptyImage))
        ));
    }
}
