use image::{ImageBuffer, Rgb, RgbImage};

/// A single RGB video frame
///
/// Thin wrapper around an RGB image buffer; the raw bytes are laid out exactly
/// as ffmpeg's `rgb24` pixel format expects them.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with black
    pub fn new_black(width: u32, height: u32) -> Self {
        Self { buffer: ImageBuffer::new(width, height) }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self { buffer: ImageBuffer::from_pixel(width, height, Rgb(color)) }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.buffer.dimensions()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Raw interleaved RGB bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Size in bytes of one `rgb24` frame of the given dimensions
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }
}

impl From<RgbImage> for Frame {
    fn from(buffer: RgbImage) -> Self {
        Self::new(buffer)
    }
}
