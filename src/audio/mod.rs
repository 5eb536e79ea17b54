//! # Audio Module
//!
//! Background music for slideshows: decoding tracks into PCM, choosing a
//! random candidate from a music directory and fitting it to the video length.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use reel_compositor::audio::select_and_fit;
//!
//! // `None` means "render without music", never an error
//! if let Some(track) = select_and_fit("assets/music", 13.0) {
//!     println!("Using {:?} ({:?}s)", track.file_path, track.duration());
//! }
//! ```

pub mod fit;
pub mod loader;
pub mod types;

pub use fit::{find_music_tracks, fit_to_duration, select_and_fit, select_and_fit_with_rng};
pub use loader::{AudioLoader, SUPPORTED_AUDIO_EXTENSIONS};
pub use types::AudioData;
