//! Frame sources and per-frame processing

mod processor;

pub use processor::{
    CameraReport, FrameProcessor, FrameReport, ProcessingContext, ProcessingSettings,
};

use std::collections::VecDeque;

use crate::error::Result;
use crate::image::RawImage;

/// One capture from the sensor: an image per physical camera
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub id: u64,
    /// Capture time in microseconds, as reported by the driver
    pub timestamp_us: u64,
    /// Indexed by camera id (0 = left, 1 = right on a stereo device)
    pub images: Vec<RawImage>,
}

impl Frame {
    pub fn new(id: u64, timestamp_us: u64, images: Vec<RawImage>) -> Self {
        Self {
            id,
            timestamp_us,
            images,
        }
    }
}

/// Anything that can hand out sensor frames, one cycle at a time
pub trait FrameSource {
    /// Next frame, or `None` once the source is exhausted
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Replays frames held in memory
#[derive(Debug, Clone, Default)]
pub struct VecFrameSource {
    frames: VecDeque<Frame>,
}

impl VecFrameSource {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for VecFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        Ok(self.frames.pop_front())
    }
}
