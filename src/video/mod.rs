//! # Video Processing Module
//!
//! Turns still images into frame-sized segments, lays them out on a fading
//! timeline and streams the composited frames into ffmpeg.

pub mod encoder;
pub mod geometry;
pub mod loader;
pub mod timeline;
pub mod types;

pub use encoder::{EncodedVideo, EncoderSettings, FfmpegEncoder, FFMPEG_PROGRAM};
pub use geometry::CoverCrop;
pub use loader::ImageLoader;
pub use timeline::{Segment, Timeline};
pub use types::Frame;
