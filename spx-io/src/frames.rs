//! Recorded frames on disk
//!
//! A recording is a directory of grayscale images named
//! `frame_<id>_cam<k>.<ext>`, one file per camera per frame. Any format the
//! `image` crate decodes works; colour images are reduced to luma.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use spx_core::sensor::{Frame, FrameSource};
use spx_core::{RawImage, SpxError};
use tracing::{debug, warn};

use crate::error::{IoError, Result};

/// Decode an image file into a raw 8-bit frame
pub fn load_raw_image<P: AsRef<Path>>(path: P) -> Result<RawImage> {
    let gray = image::open(path.as_ref())?.to_luma8();
    let (width, height) = gray.dimensions();
    Ok(RawImage::new(
        width as usize,
        height as usize,
        gray.into_raw(),
    )?)
}

/// Split `frame_<id>_cam<k>` into `(id, k)`
fn parse_frame_name(stem: &str) -> Option<(u64, usize)> {
    let rest = stem.strip_prefix("frame_")?;
    let (id, camera) = rest.split_once("_cam")?;
    Some((id.parse().ok()?, camera.parse().ok()?))
}

fn modified_us(path: &Path) -> Option<u64> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    u64::try_from(since_epoch.as_micros()).ok()
}

/// Replays a directory of recorded frames in frame id order
#[derive(Debug, Clone)]
pub struct DirectoryFrameSource {
    frames: VecDeque<(u64, Vec<PathBuf>)>,
}

impl DirectoryFrameSource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut grouped: BTreeMap<u64, BTreeMap<usize, PathBuf>> = BTreeMap::new();

        for entry in fs::read_dir(dir).map_err(|e| IoError::read(dir, e))? {
            let path = entry.map_err(|e| IoError::read(dir, e))?.path();
            if !path.is_file() {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match parse_frame_name(stem) {
                Some((id, camera)) => {
                    let cameras = grouped.entry(id).or_default();
                    if let Some(first) = cameras.get(&camera) {
                        return Err(IoError::DuplicateCamera {
                            frame: id,
                            camera,
                            first: first.display().to_string(),
                            second: path.display().to_string(),
                        });
                    }
                    cameras.insert(camera, path);
                }
                None => warn!(path = %path.display(), "skipping file outside recording layout"),
            }
        }

        let mut frames = VecDeque::with_capacity(grouped.len());
        for (id, cameras) in grouped {
            let mut paths = Vec::with_capacity(cameras.len());
            for (expected, (camera, path)) in cameras.into_iter().enumerate() {
                if camera != expected {
                    return Err(IoError::MissingCamera {
                        frame: id,
                        camera: expected,
                    });
                }
                paths.push(path);
            }
            frames.push_back((id, paths));
        }

        debug!(dir = %dir.display(), frames = frames.len(), "opened recording");
        Ok(Self { frames })
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    fn load(id: u64, paths: &[PathBuf]) -> Result<Frame> {
        let images = paths
            .iter()
            .map(load_raw_image)
            .collect::<Result<Vec<_>>>()?;
        let timestamp_us = paths.first().and_then(|p| modified_us(p)).unwrap_or(0);
        Ok(Frame::new(id, timestamp_us, images))
    }
}

impl FrameSource for DirectoryFrameSource {
    fn next_frame(&mut self) -> std::result::Result<Option<Frame>, SpxError> {
        match self.frames.pop_front() {
            Some((id, paths)) => Ok(Some(Self::load(id, &paths)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_name() {
        assert_eq!(parse_frame_name("frame_12_cam0"), Some((12, 0)));
        assert_eq!(parse_frame_name("frame_0003_cam1"), Some((3, 1)));
        assert_eq!(parse_frame_name("frame_x_cam1"), None);
        assert_eq!(parse_frame_name("image_1_cam0"), None);
        assert_eq!(parse_frame_name("frame_1"), None);
    }
}
