//! Cover-and-center geometry: scale an image uniformly until it covers the
//! target frame, then crop the centered window of exactly the frame size.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::{Result, VideoError};

/// Scale-to-cover followed by a centered crop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverCrop {
    /// Uniform scale factor, `max(target_w / w, target_h / h)`
    pub scale: f64,
    pub scaled_width: u32,
    pub scaled_height: u32,
    /// Top-left corner of the crop window in the scaled image
    pub crop_x: u32,
    pub crop_y: u32,
    pub target_width: u32,
    pub target_height: u32,
}

impl CoverCrop {
    pub fn compute(source: (u32, u32), target: (u32, u32)) -> Result<Self> {
        let (w, h) = source;
        let (target_w, target_h) = target;

        if w == 0 || h == 0 || target_w == 0 || target_h == 0 {
            return Err(VideoError::FrameProcessingFailed {
                reason: format!(
                    "cannot cover {}x{} with a {}x{} image",
                    target_w, target_h, w, h
                ),
            }
            .into());
        }

        let scale = f64::max(target_w as f64 / w as f64, target_h as f64 / h as f64);

        // Rounding may land a pixel short of the target on the covering axis
        let scaled_width = ((w as f64 * scale).round() as u32).max(target_w);
        let scaled_height = ((h as f64 * scale).round() as u32).max(target_h);

        Ok(Self {
            scale,
            scaled_width,
            scaled_height,
            crop_x: (scaled_width - target_w) / 2,
            crop_y: (scaled_height - target_h) / 2,
            target_width: target_w,
            target_height: target_h,
        })
    }

    /// Apply the transform, producing an image of exactly the target size
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        let scaled = if image.dimensions() == (self.scaled_width, self.scaled_height) {
            image.clone()
        } else {
            imageops::resize(image, self.scaled_width, self.scaled_height, FilterType::Lanczos3)
        };

        imageops::crop_imm(
            &scaled,
            self.crop_x,
            self.crop_y,
            self.target_width,
            self.target_height,
        )
        .to_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_landscape_into_portrait() {
        let crop = CoverCrop::compute((800, 600), (1080, 1920)).unwrap();
        assert!((crop.scale - 3.2).abs() < 1e-12);
        assert_eq!((crop.scaled_width, crop.scaled_height), (2560, 1920));
        assert_eq!((crop.crop_x, crop.crop_y), (740, 0));
        assert_eq!(crop.crop_x * 2 + crop.target_width, crop.scaled_width);
    }

    #[test]
    fn test_narrow_and_wide_sources_are_symmetric() {
        // Taller than the target aspect: width drives the scale, crop is vertical
        let tall = CoverCrop::compute((100, 400), (200, 200)).unwrap();
        assert_eq!(tall.scale, 2.0);
        assert_eq!((tall.scaled_width, tall.scaled_height), (200, 800));
        assert_eq!((tall.crop_x, tall.crop_y), (0, 300));

        // Wider than the target aspect: height drives the scale, crop is horizontal
        let wide = CoverCrop::compute((400, 100), (200, 200)).unwrap();
        assert_eq!(wide.scale, 2.0);
        assert_eq!((wide.scaled_width, wide.scaled_height), (800, 200));
        assert_eq!((wide.crop_x, wide.crop_y), (300, 0));
    }

    #[test]
    fn test_downscale_when_source_is_larger() {
        let crop = CoverCrop::compute((4000, 3000), (1080, 1920)).unwrap();
        assert!((crop.scale - 0.64).abs() < 1e-12);
        assert_eq!((crop.scaled_width, crop.scaled_height), (2560, 1920));
    }

    #[test]
    fn test_zero_sized_source_is_rejected() {
        assert!(CoverCrop::compute((0, 600), (1080, 1920)).is_err());
    }

    #[test]
    fn test_apply_keeps_center_and_exact_size() {
        // Left third red, middle third green, right third blue
        let image = RgbImage::from_fn(30, 10, |x, _| match x {
            0..=9 => Rgb([255, 0, 0]),
            10..=19 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        });

        let crop = CoverCrop::compute((30, 10), (10, 10)).unwrap();
        let out = crop.apply(&image);

        assert_eq!(out.dimensions(), (10, 10));
        assert!(out.pixels().all(|p| *p == Rgb([0, 255, 0])));
    }
}
