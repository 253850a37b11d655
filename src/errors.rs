/*!
 * Error types for the duosub application.
 *
 * Each stage of the pipeline has its own error enum, defined with the
 * thiserror crate. `PipelineError` wraps all of them and keeps the original
 * error as its source.
 */

use thiserror::Error;

/// Retry classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The provider asked us to slow down; always retryable
    RateLimited,
    /// Temporary failure (network, timeout, server error); retryable
    Transient,
    /// Retrying cannot help (bad request, bad credentials)
    Fatal,
}

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Classify the error for the retry policy
    pub fn class(&self) -> FailureClass {
        match self {
            Self::RateLimitExceeded(_) => FailureClass::RateLimited,
            Self::ConnectionError(_) | Self::RequestFailed(_) => FailureClass::Transient,
            // 529 is Anthropic's "overloaded"
            Self::ApiError { status_code, .. } if *status_code >= 500 => FailureClass::Transient,
            Self::ApiError { status_code: 408, .. } => FailureClass::Transient,
            Self::ApiError { .. } | Self::ParseError(_) | Self::AuthenticationError(_) => FailureClass::Fatal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() != FailureClass::Fatal
    }
}

/// Errors that can occur while reading or writing subtitles
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// A timestamp did not match `H:MM:SS.cc`
    #[error("Invalid ASS time format: {0}")]
    MalformedTimestamp(String),

    /// There is no such thing as a zero-cue subtitle file
    #[error("No segments provided")]
    EmptyInput,

    /// Writing the subtitle file failed
    #[error("Failed to write subtitle file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Every attempt failed with a retryable error
    #[error("Translation failed after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// The provider returned an error that retrying cannot fix
    #[error("Translation provider error: {0}")]
    Fatal(#[source] ProviderError),

    /// Invalid translation settings
    #[error("Invalid translation configuration: {0}")]
    Config(String),
}

/// Errors from the speech recognition collaborator
#[derive(Error, Debug)]
pub enum RecognitionError {
    #[error("Audio file not found: {0}")]
    AudioNotFound(String),

    #[error("Transcription request failed: {0}")]
    Request(String),

    #[error("Transcription failed: {0}")]
    Service(String),

    #[error("Failed to parse transcription response: {0}")]
    Parse(String),
}

/// Errors from the speaker diarization collaborator
#[derive(Error, Debug)]
pub enum DiarizationError {
    #[error("Audio file not found: {0}")]
    AudioNotFound(String),

    #[error("HuggingFace token is required for speaker diarization. Set it via HF_TOKEN environment variable.")]
    MissingCredential,

    #[error("Failed to run diarization command '{command}': {message}")]
    Spawn { command: String, message: String },

    #[error("Speaker diarization failed: {0}")]
    Failed(String),

    #[error("Failed to parse diarization output: {0}")]
    Parse(String),
}

/// Errors from audio extraction
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Video file not found: {0}")]
    VideoNotFound(String),

    #[error("FFmpeg not found. Please install FFmpeg and add it to PATH.")]
    FfmpegMissing,

    #[error("FFmpeg failed with error: {0}")]
    Failed(String),

    #[error("FFmpeg timed out after {0} seconds")]
    Timeout(u64),

    #[error("Audio extraction completed but output file not found: {0}")]
    OutputMissing(String),

    #[error("Failed to get video duration: {0}")]
    Probe(String),

    #[error("I/O error during audio extraction: {0}")]
    Io(#[from] std::io::Error),
}

/// Umbrella error for a whole video-to-subtitle run
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Pipeline failed: video file not found: {0}")]
    VideoNotFound(String),

    #[error("Pipeline failed: {0}")]
    Audio(#[from] AudioError),

    #[error("Pipeline failed: {0}")]
    Recognition(#[from] RecognitionError),

    #[error("Pipeline failed: {0}")]
    Diarization(#[from] DiarizationError),

    #[error("Pipeline failed: {0}")]
    Translation(#[from] TranslationError),

    #[error("Pipeline failed: {0}")]
    Subtitle(#[from] SubtitleError),

    #[error("Pipeline failed: {0}")]
    Io(#[from] std::io::Error),
}
