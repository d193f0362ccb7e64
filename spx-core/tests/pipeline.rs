use std::sync::Arc;

use spx_core::calibration::{RECTIFIED_HEIGHT, RECTIFIED_WIDTH};
use spx_core::sensor::ProcessingSettings;
use spx_core::{
    DistortionMap, Frame, FrameProcessor, FrameSource, ProcessingContext, RangeEstimator,
    RawImage, Rectifier, VecFrameSource,
};

#[test]
fn identity_grid_reads_image_corners() {
    let image = RawImage::new(2, 2, vec![10, 20, 30, 40]).unwrap();
    let map = DistortionMap::from_fn(2, 2, |x, y| (x as f32, y as f32)).unwrap();

    let out = Rectifier::new().rectify(&image, &map).unwrap();

    assert_eq!((out.width(), out.height()), (RECTIFIED_WIDTH, RECTIFIED_HEIGHT));
    assert_eq!(out.get(0, 119), Some(10));
    assert_eq!(out.get(319, 0), Some(40));
}

#[test]
fn sensor_sized_map_on_sensor_sized_frame() {
    // Shrink the field of view to the central half of the raw image
    let map = DistortionMap::from_fn(64, 63, |x, y| {
        (
            0.25 + 0.5 * x as f32 / 63.0,
            0.25 + 0.5 * y as f32 / 62.0,
        )
    })
    .unwrap();
    let pixels = (0..640 * 240).map(|k| (k % 640 / 3) as u8).collect();
    let image = RawImage::new(640, 240, pixels).unwrap();

    let out = Rectifier::new().rectify(&image, &map).unwrap();
    let stats = out.stats();

    assert_eq!(stats.outside, 0);
    assert_eq!(stats.clamped, 0);
    assert_eq!(stats.sampled, RECTIFIED_WIDTH * RECTIFIED_HEIGHT);
    // Brightness grows with raw column, so it grows along each output row
    let row = out.view().row(60).to_vec();
    assert!(row.windows(2).all(|w| w[0] <= w[1] + 1));
    assert_eq!(row[0], 160 / 3);
    assert!((158..=160).contains(&row[319]));
}

#[test]
fn rectify_from_many_threads_matches() {
    let map = Arc::new(DistortionMap::from_fn(64, 63, |x, y| {
        (x as f32 / 63.0, (y as f32 / 62.0).powi(2))
    })
    .unwrap());
    let image = Arc::new(RawImage::new(64, 48, (0..64 * 48).map(|k| k as u8).collect()).unwrap());
    let reference = Rectifier::new().rectify(&image, &map).unwrap().as_raw();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let map = Arc::clone(&map);
            let image = Arc::clone(&image);
            std::thread::spawn(move || Rectifier::new().rectify(&image, &map).unwrap().as_raw())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), reference);
    }
}

#[test]
fn replay_source_through_processor() {
    let dark = RawImage::uniform(32, 16, 5).unwrap();
    let bright = RawImage::uniform(32, 16, 240).unwrap();
    let mut source = VecFrameSource::new(vec![
        Frame::new(1, 10, vec![dark.clone(), dark.clone()]),
        Frame::new(2, 20, vec![bright.clone(), dark.clone()]),
        Frame::new(3, 30, vec![bright.clone(), bright]),
    ]);

    let map = Arc::new(DistortionMap::constant(64, 63, 0.5, 0.5).unwrap());
    let processor = FrameProcessor::new(&ProcessingSettings::default())
        .with_map(0, Arc::clone(&map))
        .with_map(1, map);
    let mut ctx = ProcessingContext::new();
    let estimator = RangeEstimator::default();

    let mut entered = Vec::new();
    while let Some(frame) = source.next_frame().unwrap() {
        let trigger = frame.id == 3;
        let report = processor.process(&mut ctx, &frame, trigger).unwrap();

        for (cam, image) in report.cameras.iter().zip(&frame.images) {
            assert_eq!(cam.distance, estimator.estimate(image).unwrap());
            assert_eq!(cam.rectified.is_some(), trigger);
            if cam.entered_range {
                entered.push((report.frame_id, cam.camera));
            }
        }
    }

    assert_eq!(entered, vec![(2, 0), (3, 1)]);
    assert_eq!(ctx.frames_processed(), 3);
}
