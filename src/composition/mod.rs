//! # Composition
//!
//! The slideshow pipeline and the workflow that feeds it from an image directory.

pub mod engine;
pub mod workflow;

// Re-exports for convenience
pub use engine::{CompositionEngine, RenderRequest, VideoRenderer};
pub use workflow::build_video;
