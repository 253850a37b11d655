/*!
 * Speech recognition.
 *
 * `WhisperApiRecognizer` talks to an OpenAI-compatible
 * `/v1/audio/transcriptions` endpoint and asks for `verbose_json`, which
 * carries per-segment timestamps.
 */

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::app_config::TranscriptionConfig;
use crate::errors::RecognitionError;
use crate::segment::TimedText;

/// Default vocabulary hint for idol-related content
pub const IDOL_VOCABULARY_PROMPT: &str =
    "推しメン、握手会、センター、チェキ、総選挙、ランキング、メンバー、ファン、ライブ、コンサート、MV、楽曲";

/// Language and vocabulary hints for a transcription
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionHint {
    /// ISO 639-1 code of the spoken language
    pub language: String,
    /// Vocabulary the model should expect
    pub prompt: Option<String>,
}

impl Default for RecognitionHint {
    fn default() -> Self {
        Self {
            language: "ja".to_string(),
            prompt: Some(IDOL_VOCABULARY_PROMPT.to_string()),
        }
    }
}

/// Turns audio into timed text
#[async_trait]
pub trait Recognizer: Send + Sync {
    async fn transcribe(&self, audio: &Path, hint: &RecognitionHint) -> Result<Vec<TimedText>, RecognitionError>;
}

#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    #[serde(default)]
    segments: Option<Vec<VerboseSegment>>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Recognizer backed by a Whisper transcription HTTP API
#[derive(Debug)]
pub struct WhisperApiRecognizer {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl WhisperApiRecognizer {
    pub fn new(config: &TranscriptionConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
        }
    }

    fn transcriptions_url(&self) -> Result<Url, RecognitionError> {
        // Trailing slash so a path prefix on the endpoint survives the join
        let base = Url::parse(&format!("{}/", self.endpoint.trim_end_matches('/')))
            .map_err(|e| RecognitionError::Request(format!("invalid endpoint '{}': {}", self.endpoint, e)))?;
        base.join("v1/audio/transcriptions")
            .map_err(|e| RecognitionError::Request(e.to_string()))
    }

    /// Converts a `verbose_json` body into timed text, trimming every segment
    pub fn parse_verbose_json(body: &str) -> Result<Vec<TimedText>, RecognitionError> {
        let transcription: VerboseTranscription =
            serde_json::from_str(body).map_err(|e| RecognitionError::Parse(e.to_string()))?;

        let segments = transcription.segments.ok_or_else(|| {
            RecognitionError::Parse("no segments in response (verbose_json not supported?)".to_string())
        })?;

        Ok(segments
            .into_iter()
            .map(|s| TimedText::new(s.start, s.end, s.text.trim()))
            .collect())
    }
}

#[async_trait]
impl Recognizer for WhisperApiRecognizer {
    async fn transcribe(&self, audio: &Path, hint: &RecognitionHint) -> Result<Vec<TimedText>, RecognitionError> {
        if !audio.exists() {
            return Err(RecognitionError::AudioNotFound(audio.display().to_string()));
        }

        let bytes = tokio::fs::read(audio)
            .await
            .map_err(|e| RecognitionError::Request(format!("failed to read audio: {}", e)))?;
        let file_name = audio
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.wav".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("audio/wav")
            .map_err(|e| RecognitionError::Request(e.to_string()))?;

        let mut form = Form::new()
            .part("file", part)
            .text("model", self.model.clone())
            .text("response_format", "verbose_json")
            .text("language", hint.language.clone())
            .text("timestamp_granularities[]", "segment");
        if let Some(prompt) = hint.prompt.as_ref().filter(|p| !p.is_empty()) {
            form = form.text("prompt", prompt.clone());
        }

        debug!("Sending {:?} to transcription model {}", audio, self.model);
        let response = self
            .client
            .post(self.transcriptions_url()?)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RecognitionError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RecognitionError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(RecognitionError::Service(format!("{} - {}", status.as_u16(), body)));
        }

        let segments = Self::parse_verbose_json(&body)?;
        info!("Transcribed {} segments", segments.len());
        Ok(segments)
    }
}
