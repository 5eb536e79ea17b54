use std::path::{Path, PathBuf};

use ::config::{Config, File, FileFormat};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{CompositorError, Result};

/// Render settings for one slideshow
///
/// Treated as an immutable value: overrides produce a new instance through the
/// `with_*` methods.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Target frame width in pixels
    pub width: u32,

    /// Target frame height in pixels
    pub height: u32,

    /// Output frame rate
    pub fps: u32,

    /// Seconds each image stays on screen
    pub image_duration: f64,

    /// Fade-in/fade-out length at both ends of each image (seconds)
    pub fade_duration: f64,

    /// Attach a random background track from `music_dir`
    pub include_music: bool,

    /// Directory searched (non-recursively) for background tracks
    pub music_dir: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            fps: 30,
            image_duration: 2.0,
            fade_duration: 0.2,
            include_music: true,
            music_dir: PathBuf::from("assets/music"),
        }
    }
}

impl RenderConfig {
    pub fn with_image_duration(&self, image_duration: f64) -> Self {
        Self { image_duration, ..self.clone() }
    }

    pub fn with_fade_duration(&self, fade_duration: f64) -> Self {
        Self { fade_duration, ..self.clone() }
    }

    pub fn with_music_dir(&self, music_dir: PathBuf) -> Self {
        Self { music_dir, ..self.clone() }
    }

    /// Copy with width and height rounded down to even numbers
    ///
    /// The encoder writes yuv420p, which subsamples chroma in 2x2 blocks.
    pub fn with_even_dimensions(&self) -> Self {
        let (width, height) = (self.width & !1, self.height & !1);
        if (width, height) != (self.width, self.height) {
            warn!(
                "Frame size {}x{} is not even, rendering at {}x{}",
                self.width, self.height, width, height
            );
        }
        Self { width, height, ..self.clone() }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(CompositorError::invalid_input(format!(
                "frame size must be positive, got {}x{}",
                self.width, self.height
            )));
        }

        if self.fps == 0 {
            return Err(CompositorError::invalid_input("fps must be positive"));
        }

        if !self.image_duration.is_finite() || self.image_duration <= 0.0 {
            return Err(CompositorError::invalid_input(format!(
                "image_duration must be positive, got {}",
                self.image_duration
            )));
        }

        if !self.fade_duration.is_finite() || self.fade_duration < 0.0 {
            return Err(CompositorError::invalid_input(format!(
                "fade_duration must be non-negative, got {}",
                self.fade_duration
            )));
        }

        Ok(())
    }
}

/// Settings for the optional location server
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerConfig {
    pub base_url: Option<String>,
}

/// Everything read from the configuration file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub render: RenderConfig,

    /// Default output location for `render`
    pub output: Option<PathBuf>,

    pub server: ServerConfig,
}

/// INI file as written, before any value is cast
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    render: RawRender,
    server: RawServer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRender {
    width: Option<String>,
    height: Option<String>,
    fps: Option<String>,
    image_duration: Option<String>,
    fade_duration: Option<String>,
    include_music: Option<String>,
    music_dir: Option<String>,
    output: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawServer {
    base_url: Option<String>,
}

impl AppConfig {
    /// Load configuration from an INI file
    ///
    /// Never fails: a missing file or unparsable content yields the built-in
    /// defaults, and a key whose value cannot be cast falls back on its own.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                debug!("No configuration at {:?}, using defaults", path);
                return Self::default();
            }
        };

        Self::from_ini_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring unparsable configuration {:?}: {}", path, e);
            Self::default()
        })
    }

    /// Parse INI text with `[render]` and `[server]` sections, applying per-key defaults
    pub fn from_ini_str(content: &str) -> std::result::Result<Self, ::config::ConfigError> {
        let raw: RawConfig = Config::builder()
            .add_source(File::from_str(content, FileFormat::Ini))
            .build()?
            .try_deserialize()?;
        let render = raw.render;
        let defaults = RenderConfig::default();

        let config = RenderConfig {
            width: cast(&render.width, "width").unwrap_or(defaults.width),
            height: cast(&render.height, "height").unwrap_or(defaults.height),
            fps: cast(&render.fps, "fps").unwrap_or(defaults.fps),
            image_duration: cast(&render.image_duration, "image_duration")
                .unwrap_or(defaults.image_duration),
            fade_duration: cast(&render.fade_duration, "fade_duration")
                .unwrap_or(defaults.fade_duration),
            include_music: render
                .include_music
                .as_deref()
                .and_then(|value| cast_bool(value, "include_music"))
                .unwrap_or(defaults.include_music),
            music_dir: non_empty(render.music_dir)
                .map(PathBuf::from)
                .unwrap_or(defaults.music_dir),
        };

        Ok(Self {
            render: config,
            output: non_empty(render.output).map(PathBuf::from),
            server: ServerConfig {
                base_url: non_empty(raw.server.base_url),
            },
        })
    }
}

fn cast<T: std::str::FromStr>(value: &Option<String>, key: &str) -> Option<T> {
    let value = value.as_deref()?.trim();
    let parsed = value.parse().ok();
    if parsed.is_none() {
        warn!("Ignoring invalid value for {}: {:?}", key, value);
    }
    parsed
}

fn cast_bool(value: &str, key: &str) -> Option<bool> {
    let parsed = parse_bool_token(value);
    if parsed.is_none() {
        warn!("Ignoring invalid value for {}: {:?}", key, value);
    }
    parsed
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse the boolean tokens accepted in configuration files
pub fn parse_bool_token(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
