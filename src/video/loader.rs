use std::path::Path;

use tracing::debug;

use crate::error::{Result, VideoError};
use crate::video::geometry::CoverCrop;
use crate::video::types::Frame;

/// Decodes still images into frame-sized segment sources
pub struct ImageLoader {
    width: u32,
    height: u32,
}

impl ImageLoader {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Load an image and cover-crop it to the target frame size
    pub fn load_frame<P: AsRef<Path>>(&self, path: P) -> Result<Frame> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|e| VideoError::LoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
            .to_rgb8();

        let crop = CoverCrop::compute(image.dimensions(), (self.width, self.height))?;
        debug!(
            "{:?}: {}x{} scaled by {:.3} to {}x{}, crop at ({}, {})",
            path.file_name().unwrap_or_default(),
            image.width(),
            image.height(),
            crop.scale,
            crop.scaled_width,
            crop.scaled_height,
            crop.crop_x,
            crop.crop_y
        );

        Ok(Frame::new(crop.apply(&image)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompositorError;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn test_load_frame_fills_target() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.png");
        RgbImage::from_pixel(80, 60, Rgb([10, 20, 30])).save(&path).unwrap();

        let frame = ImageLoader::new(36, 64).load_frame(&path).unwrap();
        assert_eq!(frame.dimensions(), (36, 64));
        assert_eq!(frame.get_pixel(18, 32), [10, 20, 30]);
    }

    #[test]
    fn test_corrupt_image_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let result = ImageLoader::new(36, 64).load_frame(&path);
        assert!(matches!(
            result,
            Err(CompositorError::Video(VideoError::LoadFailed { .. }))
        ));
    }
}
