use image::{GrayImage, Luma};
use spx_core::RectifiedImage;

/// Copy a rectified frame into an `image` buffer for encoding by a sink
pub fn to_gray_image(rectified: &RectifiedImage) -> GrayImage {
    GrayImage::from_fn(
        rectified.width() as u32,
        rectified.height() as u32,
        |x, y| Luma([rectified.get(x as usize, y as usize).unwrap_or(0)]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use spx_core::{DistortionMap, RawImage, Rectifier};

    #[test]
    fn test_layout_matches_rectified_image() {
        let image = RawImage::new(2, 2, vec![10, 20, 30, 40]).unwrap();
        let map = DistortionMap::from_fn(2, 2, |x, y| (x as f32, y as f32)).unwrap();
        let rectified = Rectifier::new().rectify(&image, &map).unwrap();

        let gray = to_gray_image(&rectified);
        assert_eq!(gray.dimensions(), (320, 120));
        assert_eq!(gray.get_pixel(0, 119).0, [10]);
        assert_eq!(gray.get_pixel(319, 0).0, [40]);
        assert_eq!(gray.as_raw(), &rectified.as_raw());
    }
}
