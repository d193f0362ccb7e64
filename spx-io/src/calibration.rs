//! Calibration map files
//!
//! Two layouts are understood:
//! * `.json`: a [`CalibrationFile`] with explicit grid geometry
//! * anything else: the driver's raw dump, little-endian `f32` values in the
//!   sensor's 64x63 layout with tightly packed rows

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use spx_core::DistortionMap;
use spx_core::calibration::{SENSOR_GRID_HEIGHT, SENSOR_GRID_WIDTH};
use tracing::info;

use crate::error::{IoError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationFile {
    #[serde(default = "default_grid_width")]
    pub grid_width: usize,
    #[serde(default = "default_grid_height")]
    pub grid_height: usize,
    /// Values per grid row; `2 * grid_width` when absent
    #[serde(default)]
    pub row_pitch: Option<usize>,
    pub entries: Vec<f32>,
}

fn default_grid_width() -> usize {
    SENSOR_GRID_WIDTH
}

fn default_grid_height() -> usize {
    SENSOR_GRID_HEIGHT
}

impl CalibrationFile {
    pub fn into_map(self) -> Result<DistortionMap> {
        let pitch = self.row_pitch.unwrap_or(self.grid_width * 2);
        Ok(DistortionMap::new(
            self.grid_width,
            self.grid_height,
            pitch,
            self.entries,
        )?)
    }

    pub fn from_map(map: &DistortionMap) -> Self {
        Self {
            grid_width: map.grid_width(),
            grid_height: map.grid_height(),
            row_pitch: Some(map.row_pitch()),
            entries: map.entries().to_vec(),
        }
    }
}

/// Load a calibration map, picking the layout from the file extension
pub fn load_calibration<P: AsRef<Path>>(path: P) -> Result<DistortionMap> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| IoError::read(path, e))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let map = if is_json {
        let file: CalibrationFile = serde_json::from_slice(&bytes)?;
        file.into_map()?
    } else {
        DistortionMap::sensor(parse_raw_f32(&bytes)?)?
    };

    let (lo, hi) = map.bounds();
    info!(
        path = %path.display(),
        grid_width = map.grid_width(),
        grid_height = map.grid_height(),
        row_pitch = map.row_pitch(),
        min_x = lo.x,
        min_y = lo.y,
        max_x = hi.x,
        max_y = hi.y,
        "loaded calibration"
    );

    Ok(map)
}

/// Decode a buffer of little-endian `f32` values
pub fn parse_raw_f32(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(IoError::RawLength(bytes.len()));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_raw_f32() {
        let mut bytes = Vec::new();
        for v in [0.0f32, 0.5, 1.0, -2.25] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        assert_eq!(parse_raw_f32(&bytes).unwrap(), vec![0.0, 0.5, 1.0, -2.25]);
    }

    #[test]
    fn test_parse_raw_f32_rejects_partial_value() {
        assert!(matches!(
            parse_raw_f32(&[0, 0, 0, 0, 1]),
            Err(IoError::RawLength(5))
        ));
    }

    #[test]
    fn test_json_defaults_to_sensor_grid() {
        let json = format!(r#"{{"entries": {:?}}}"#, vec![0.5f32; 64 * 63 * 2]);
        let file: CalibrationFile = serde_json::from_str(&json).unwrap();
        assert_eq!(file.grid_width, 64);
        assert_eq!(file.grid_height, 63);

        let map = file.into_map().unwrap();
        assert_eq!(map.row_pitch(), 128);
    }

    #[test]
    fn test_invalid_geometry_is_reported() {
        let file = CalibrationFile {
            grid_width: 4,
            grid_height: 4,
            row_pitch: None,
            entries: vec![0.0; 10],
        };
        assert!(matches!(
            file.into_map(),
            Err(IoError::Core(spx_core::SpxError::InvalidCalibration(_)))
        ));
    }

    #[test]
    fn test_round_trip_keeps_pitch() {
        let map = DistortionMap::new(2, 2, 6, vec![0.0; 12]).unwrap();
        let file = CalibrationFile::from_map(&map);
        assert_eq!(file.row_pitch, Some(6));
        assert_eq!(file.into_map().unwrap(), map);
    }
}
