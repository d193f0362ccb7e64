use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Frame;
use crate::calibration::{DistortionMap, RectifiedImage, Rectifier};
use crate::error::{CalibrationError, Result};
use crate::image::FrameStats;
use crate::range::{Distance, RangeEstimator, RangePolicy};

/// Tunables for the per-frame processing loop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSettings {
    pub range: RangePolicy,
    /// Cameras to rectify on trigger; every calibrated camera when unset
    pub rectify_cameras: Option<Vec<usize>>,
}

impl ProcessingSettings {
    pub fn validate(&self) -> Result<()> {
        self.range.validate()
    }
}

/// Mutable state carried between frames by the caller
#[derive(Debug, Clone, Default)]
pub struct ProcessingContext {
    frames_processed: u64,
    in_range: Vec<bool>,
}

impl ProcessingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Whether `camera` reported an object in range on the last frame
    pub fn is_in_range(&self, camera: usize) -> bool {
        self.in_range.get(camera).copied().unwrap_or(false)
    }

    /// Record the new state and report whether the camera just entered range
    fn update(&mut self, camera: usize, in_range: bool) -> bool {
        if self.in_range.len() <= camera {
            self.in_range.resize(camera + 1, false);
        }
        let entered = in_range && !self.in_range[camera];
        self.in_range[camera] = in_range;
        entered
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraReport {
    pub camera: usize,
    pub stats: FrameStats,
    pub distance: Distance,
    pub in_range: bool,
    /// In range now but not on the previous frame
    pub entered_range: bool,
    pub rectified: Option<RectifiedImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_id: u64,
    pub timestamp_us: u64,
    pub cameras: Vec<CameraReport>,
}

impl FrameReport {
    /// Closest distance seen by any camera
    pub fn nearest(&self) -> Option<Distance> {
        self.cameras
            .iter()
            .map(|c| c.distance)
            .min_by(|a, b| a.total_cmp(b))
    }
}

/// Runs range estimation on every frame and rectification on trigger
#[derive(Debug, Clone)]
pub struct FrameProcessor {
    maps: BTreeMap<usize, Arc<DistortionMap>>,
    estimator: RangeEstimator,
    rectifier: Rectifier,
    policy: RangePolicy,
    rectify_cameras: Option<Vec<usize>>,
}

impl Default for FrameProcessor {
    fn default() -> Self {
        Self::new(&ProcessingSettings::default())
    }
}

impl FrameProcessor {
    pub fn new(settings: &ProcessingSettings) -> Self {
        Self {
            maps: BTreeMap::new(),
            estimator: settings.range.estimator(),
            rectifier: Rectifier::new(),
            policy: settings.range,
            rectify_cameras: settings.rectify_cameras.clone(),
        }
    }

    /// Attach the calibration map of `camera`
    pub fn with_map(mut self, camera: usize, map: Arc<DistortionMap>) -> Self {
        self.maps.insert(camera, map);
        self
    }

    pub fn map(&self, camera: usize) -> Option<&Arc<DistortionMap>> {
        self.maps.get(&camera)
    }

    pub fn policy(&self) -> &RangePolicy {
        &self.policy
    }

    fn wants_rectified(&self, camera: usize) -> bool {
        match &self.rectify_cameras {
            Some(cameras) => cameras.contains(&camera),
            None => self.maps.contains_key(&camera),
        }
    }

    pub fn process(
        &self,
        ctx: &mut ProcessingContext,
        frame: &Frame,
        trigger: bool,
    ) -> Result<FrameReport> {
        let rectified: Vec<Option<RectifiedImage>> = frame
            .images
            .par_iter()
            .enumerate()
            .map(|(camera, image)| {
                if !trigger || !self.wants_rectified(camera) {
                    return Ok(None);
                }
                let map = self
                    .maps
                    .get(&camera)
                    .ok_or(CalibrationError::MissingMap(camera))?;
                self.rectifier.rectify(image, map).map(Some)
            })
            .collect::<Result<_>>()?;

        let mut cameras = Vec::with_capacity(frame.images.len());
        for ((camera, image), rectified) in frame.images.iter().enumerate().zip(rectified) {
            let stats = image.stats()?;
            let distance = self.estimator.estimate(image)?;
            cameras.push(CameraReport {
                camera,
                stats,
                distance,
                in_range: self.policy.is_in_range(distance),
                entered_range: false,
                rectified,
            });
        }

        // Range state only moves once every camera of the frame succeeded
        for report in &mut cameras {
            report.entered_range = ctx.update(report.camera, report.in_range);
            if report.entered_range {
                info!(
                    frame = frame.id,
                    camera = report.camera,
                    distance = report.distance,
                    "object in range"
                );
            }
        }

        ctx.frames_processed += 1;
        debug!(
            frame = frame.id,
            timestamp_us = frame.timestamp_us,
            cameras = cameras.len(),
            trigger,
            "processed frame"
        );

        Ok(FrameReport {
            frame_id: frame.id,
            timestamp_us: frame.timestamp_us,
            cameras,
        })
    }
}
