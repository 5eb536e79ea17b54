use thiserror::Error;

/// Main error type for the Reel-Compositor library
#[derive(Error, Debug)]
pub enum CompositorError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Resource unavailable: {path}")]
    ResourceUnavailable { path: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Timing table missing duration for {count} images")]
    MissingTimingEntry { count: u32 },

    #[error("Unsupported provider: {name}")]
    UnsupportedProvider { name: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Server base URL is not configured. Set [server].base_url or pass --base-url")]
    MissingServerUrl,
}

/// Video-specific errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Failed to load image file: {path} ({reason})")]
    LoadFailed { path: String, reason: String },

    #[error("Encoder not available: {reason}")]
    EncoderUnavailable { reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Frame processing failed: {reason}")]
    FrameProcessingFailed { reason: String },
}

/// Audio-specific errors
///
/// These never leave the audio module through the render path: music is optional,
/// so callers degrade to "no music" instead.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to load audio file: {path}")]
    LoadFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Invalid audio parameters: {details}")]
    InvalidParameters { details: String },

    #[error("Audio loop failed: {reason}")]
    LoopFailed { reason: String },

    #[error("Failed to write audio file: {path}")]
    WriteFailed { path: String },
}

/// Network fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} failed: {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Unexpected response shape: {reason}")]
    MalformedPayload { reason: String },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("No images were downloaded for '{query}'")]
    NoImagesDownloaded { query: String },
}

/// Schedule CSV errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("No headers found in {path}")]
    NoHeaders { path: String },

    #[error("Missing required column: {candidates}")]
    MissingColumn { candidates: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Coarse classification of failures, used for propagation decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Configuration,
    ResourceUnavailable,
    DegradedFeature,
    ExternalCall,
    Internal,
}

/// Convenience type alias for Results using CompositorError
pub type Result<T> = std::result::Result<T, CompositorError>;

impl CompositorError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Create an invalid-input error with a custom message
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Config(_) => ErrorKind::Configuration,
            Self::ResourceUnavailable { .. } => ErrorKind::ResourceUnavailable,
            Self::Audio(_) => ErrorKind::DegradedFeature,
            Self::Fetch(_) => ErrorKind::ExternalCall,
            Self::Schedule(ScheduleError::MissingColumn { .. }) => ErrorKind::Configuration,
            Self::Video(_) | Self::Schedule(_) | Self::Io(_) | Self::Generic(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Fetch(FetchError::Request { source, .. }) => {
                source.is_timeout() || source.is_connect()
            }
            Self::Fetch(FetchError::HttpStatus { status, .. }) => *status >= 500,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Video(VideoError::LoadFailed { path, .. }) => {
                format!("Could not load image '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Video(VideoError::EncoderUnavailable { .. }) => {
                "ffmpeg was not found on PATH. Please install FFmpeg.".to_string()
            }
            Self::Config(ConfigError::UnsupportedProvider { name }) => {
                format!("Provider '{}' not supported. Available providers: bing, google, baidu", name)
            }
            Self::ResourceUnavailable { path } => {
                format!("'{}' does not exist.", path)
            }
            _ => self.to_string(),
        }
    }
}
