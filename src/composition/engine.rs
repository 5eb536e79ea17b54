use std::path::PathBuf;

use tempfile::TempPath;
use tracing::{debug, info};

use crate::{
    audio::{self, AudioData, AudioLoader},
    config::RenderConfig,
    error::{CompositorError, Result},
    video::{EncodedVideo, EncoderSettings, FfmpegEncoder, ImageLoader, Timeline, FFMPEG_PROGRAM},
};

/// One render invocation: ordered images, destination and settings
#[derive(Debug, Clone)]
pub struct RenderRequest {
    /// Display order is the order of this list
    pub images: Vec<PathBuf>,
    pub output_path: PathBuf,
    pub config: RenderConfig,
}

impl RenderRequest {
    pub fn new(images: Vec<PathBuf>, output_path: impl Into<PathBuf>, config: RenderConfig) -> Self {
        Self { images, output_path: output_path.into(), config }
    }
}

/// Anything that turns a render request into a single video file
pub trait VideoRenderer: Send + Sync {
    /// Render the request and return the path of the produced video
    fn render(&self, request: &RenderRequest) -> Result<PathBuf>;
}

/// Slideshow composition engine
///
/// The engine follows a fixed pipeline:
/// 1. Segment Loading - decode and cover-crop every image, in order
/// 2. Timeline - lay segments back to back with their fade envelopes
/// 3. Music - optionally pick a track and fit it to the timeline length
/// 4. Encoding - stream composited frames (and the music) into ffmpeg
///
/// `image_duration` is taken from the request as-is; pacing by image count
/// happens before the request is built.
#[derive(Debug, Clone)]
pub struct CompositionEngine {
    encoder_program: PathBuf,
}

impl Default for CompositionEngine {
    fn default() -> Self {
        Self { encoder_program: PathBuf::from(FFMPEG_PROGRAM) }
    }
}

impl CompositionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode with a specific ffmpeg executable instead of the one on `PATH`
    pub fn with_encoder_program(encoder_program: impl Into<PathBuf>) -> Self {
        Self { encoder_program: encoder_program.into() }
    }

    /// Run the whole pipeline
    pub fn compose(&self, request: &RenderRequest) -> Result<EncodedVideo> {
        if request.images.is_empty() {
            return Err(CompositorError::invalid_input("no images provided"));
        }
        let config = &request.config.with_even_dimensions();
        config.validate()?;

        info!("🎬 Rendering {} images to {:?}", request.images.len(), request.output_path);
        info!(
            "   {}x{} @ {} fps, {:.2}s per image, {:.2}s fades",
            config.width, config.height, config.fps, config.image_duration, config.fade_duration
        );

        // Every intermediate resource lives in the session; its teardown runs on
        // every exit path, including the `?` returns below.
        let mut session = RenderSession::new(config.width, config.height);

        // Pipeline Step 1 + 2: segments on the timeline
        self.load_segments(&request.images, config, &mut session)?;
        let total_duration = session.timeline.duration();
        info!("   Timeline: {} segments, {:.2}s", session.timeline.len(), total_duration);

        // Pipeline Step 3: music
        session.music = self.prepare_music(config, total_duration);
        if let Some(music) = &session.music {
            session.audio_file = Some(self.stage_audio(music)?);
        }

        // Pipeline Step 4: encoding
        let settings = EncoderSettings {
            program: self.encoder_program.clone(),
            width: config.width,
            height: config.height,
            fps: config.fps,
            output_path: request.output_path.clone(),
            audio_path: session.audio_file.as_ref().map(|p| p.to_path_buf()),
            duration: total_duration,
        };
        session.encoder = Some(FfmpegEncoder::spawn(settings)?);
        let encoded = session.encode(config.fps)?;

        session.teardown();
        info!("🎉 Render complete: {:?}", encoded.path);
        Ok(encoded)
    }

    fn load_segments(&self, images: &[PathBuf], config: &RenderConfig, session: &mut RenderSession) -> Result<()> {
        let loader = ImageLoader::new(config.width, config.height);

        for (index, path) in images.iter().enumerate() {
            debug!("Loading segment {}: {:?}", index, path);
            let frame = loader.load_frame(path)?;
            session
                .timeline
                .push_sequential(frame, config.image_duration, config.fade_duration);
        }
        Ok(())
    }

    /// Background track fitted to `duration`, or `None` when music is off or unavailable
    pub fn prepare_music(&self, config: &RenderConfig, duration: f64) -> Option<AudioData> {
        if !config.include_music {
            debug!("Music disabled");
            return None;
        }

        let music = audio::select_and_fit(&config.music_dir, duration)?;
        info!(
            "   Music: {:?} ({:.2}s)",
            music.file_path,
            music.duration().unwrap_or_default()
        );
        Some(music)
    }

    /// Write the fitted track to a scratch WAV the encoder can read
    fn stage_audio(&self, music: &AudioData) -> Result<TempPath> {
        let path = tempfile::Builder::new()
            .prefix("reel_compositor_audio_")
            .suffix(".wav")
            .tempfile()?
            .into_temp_path();
        AudioLoader::write_wav(music, &path)?;
        Ok(path)
    }
}

impl VideoRenderer for CompositionEngine {
    fn render(&self, request: &RenderRequest) -> Result<PathBuf> {
        self.compose(request).map(|encoded| encoded.path)
    }
}

/// Intermediate resources of one render, released together
///
/// Holds the decoded segments, the fitted music, its scratch file and the
/// encoder process. `teardown` runs from `Drop`, so an early return at any
/// step still releases whatever had been acquired up to that point.
struct RenderSession {
    timeline: Timeline,
    music: Option<AudioData>,
    audio_file: Option<TempPath>,
    encoder: Option<FfmpegEncoder>,
}

impl RenderSession {
    fn new(width: u32, height: u32) -> Self {
        Self {
            timeline: Timeline::new(width, height),
            music: None,
            audio_file: None,
            encoder: None,
        }
    }

    fn encode(&mut self, fps: u32) -> Result<EncodedVideo> {
        let frame_count = self.timeline.frame_count(fps);
        let mut encoder = self
            .encoder
            .take()
            .ok_or_else(|| CompositorError::generic("encoder was not started"))?;

        let mut buffer = Vec::new();
        for index in 0..frame_count {
            let time = index as f64 / fps as f64;
            self.timeline.render_into(time, &mut buffer);
            encoder.write_frame(&buffer)?;
        }

        encoder.finish()
    }

    /// Release every resource still held
    fn teardown(&mut self) {
        let segments = self.timeline.clear();
        let music = self.music.take().is_some();
        let audio_file = match self.audio_file.take() {
            Some(path) => {
                if let Err(e) = path.close() {
                    debug!("Failed to remove scratch audio: {}", e);
                }
                true
            }
            None => false,
        };
        // An encoder still present here never finished; dropping it kills ffmpeg
        let encoder = self.encoder.take().is_some();

        if segments > 0 || music || audio_file || encoder {
            debug!(
                "Released {} segments, music: {}, scratch audio: {}, unfinished encoder: {}",
                segments, music, audio_file, encoder
            );
        }
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
