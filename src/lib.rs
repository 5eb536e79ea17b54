//! # Reel-Compositor
//!
//! Turn a folder of images into a vertical slideshow video with fades and
//! optional background music.
//!
//! Images are scaled to cover the output frame and center-cropped, shown for a
//! duration that depends on how many there are, and blended in and out of
//! black. A random track from the music directory is looped or trimmed to the
//! exact video length. Encoding is done by the system `ffmpeg`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use reel_compositor::{build_video, CompositionEngine, RenderConfig};
//!
//! # fn main() -> reel_compositor::Result<()> {
//! let config = RenderConfig::default();
//! let engine = CompositionEngine::new();
//!
//! let video = build_video(
//!     Path::new("assets/images/kyoto"),
//!     Path::new("outputs/renders/kyoto.mp4"),
//!     &engine,
//!     &config,
//! )?;
//! println!("Wrote {:?}", video);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`timing`] - per-image duration from the image count
//! - [`video`] - cover-crop geometry, segment timeline and the ffmpeg encoder
//! - [`audio`] - track selection and fitting to the video length
//! - [`composition`] - the render pipeline and the directory workflow
//! - [`fetch`] - web image search, downloads and the random-location service
//! - [`schedule`] - CSV schedule of places to fetch images for
//! - [`config`] - lenient INI configuration

pub mod audio;
pub mod composition;
pub mod config;
pub mod error;
pub mod fetch;
pub mod paths;
pub mod schedule;
pub mod timing;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{build_video, CompositionEngine, RenderRequest, VideoRenderer},
    config::{AppConfig, RenderConfig},
    error::{CompositorError, ErrorKind, Result},
    fetch::{fetch_images, ImageFetchRequest, ImageFetcher, Provider},
    timing::resolve_image_duration,
};
