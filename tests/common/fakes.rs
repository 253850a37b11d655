/*!
 * Fake audio, recognition and diarization collaborators.
 *
 * They never touch ffmpeg or the network, and count their calls so tests can
 * check which stages ran.
 */

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use duosub::audio::{AudioExtractor, FfmpegExtractor};
use duosub::diarization::{DiarizationRequest, Diarizer};
use duosub::errors::{AudioError, DiarizationError, RecognitionError};
use duosub::recognition::{RecognitionHint, Recognizer};
use duosub::segment::{SpeakerTurn, TimedText};

/// Writes a placeholder wav next to the work directory
#[derive(Debug, Default)]
pub struct FakeExtractor {
    pub calls: AtomicUsize,
    /// Reported video length
    pub duration: Option<f64>,
}

impl FakeExtractor {
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            ..Default::default()
        }
    }
}

#[async_trait]
impl AudioExtractor for FakeExtractor {
    async fn extract(&self, video: &Path, out_dir: &Path) -> Result<PathBuf, AudioError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = FfmpegExtractor::output_path(video, out_dir);
        std::fs::write(&path, b"RIFF")?;
        Ok(path)
    }

    async fn duration(&self, _video: &Path) -> Result<Option<f64>, AudioError> {
        Ok(self.duration)
    }
}

/// Returns a fixed transcript
#[derive(Debug)]
pub struct FakeRecognizer {
    pub texts: Vec<TimedText>,
    pub calls: AtomicUsize,
}

impl FakeRecognizer {
    pub fn new(texts: Vec<TimedText>) -> Self {
        Self {
            texts,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Recognizer for FakeRecognizer {
    async fn transcribe(&self, audio: &Path, _hint: &RecognitionHint) -> Result<Vec<TimedText>, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !audio.exists() {
            return Err(RecognitionError::AudioNotFound(audio.display().to_string()));
        }
        Ok(self.texts.clone())
    }
}

/// Returns fixed speaker turns, or fails when built with `failing`
#[derive(Debug)]
pub struct FakeDiarizer {
    pub turns: Option<Vec<SpeakerTurn>>,
}

impl FakeDiarizer {
    pub fn new(turns: Vec<SpeakerTurn>) -> Self {
        Self { turns: Some(turns) }
    }

    pub fn failing() -> Self {
        Self { turns: None }
    }
}

#[async_trait]
impl Diarizer for FakeDiarizer {
    async fn diarize(&self, _audio: &Path, request: &DiarizationRequest) -> Result<Vec<SpeakerTurn>, DiarizationError> {
        if request.credential.is_empty() {
            return Err(DiarizationError::MissingCredential);
        }
        self.turns
            .clone()
            .ok_or_else(|| DiarizationError::Failed("CUDA out of memory".to_string()))
    }
}
