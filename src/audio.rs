/*!
 * Audio extraction from video files.
 *
 * The audio track is decoded with ffmpeg into 16 kHz mono 16-bit PCM WAV,
 * the input format speech recognition and diarization both expect.
 */

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use tokio::process::Command;

use crate::app_config::AudioConfig;
use crate::errors::AudioError;

/// Sample rate expected by speech recognition models
pub const SPEECH_SAMPLE_RATE: u32 = 16000;

/// Extracts a speech-ready audio track from a video
#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Writes `<out_dir>/<video stem>.wav` and returns its path
    async fn extract(&self, video: &Path, out_dir: &Path) -> Result<PathBuf, AudioError>;

    /// Duration of the video in seconds, when the extractor can tell
    async fn duration(&self, _video: &Path) -> Result<Option<f64>, AudioError> {
        Ok(None)
    }
}

/// Audio extractor backed by the ffmpeg command line tools
#[derive(Debug, Clone, Default)]
pub struct FfmpegExtractor {
    config: AudioConfig,
}

impl FfmpegExtractor {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    /// Output path for the extracted audio of `video`
    pub fn output_path(video: &Path, out_dir: &Path) -> PathBuf {
        let stem = video
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        out_dir.join(format!("{}.wav", stem))
    }

    /// ffmpeg arguments for decoding `video` into `output`
    pub fn ffmpeg_args(&self, video: &Path, output: &Path) -> Vec<String> {
        vec![
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-vn".to_string(),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            "-ar".to_string(),
            self.config.sample_rate.to_string(),
            "-ac".to_string(),
            "1".to_string(),
            "-y".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Duration of a media file in seconds, via ffprobe
    pub async fn probe_duration(&self, video: &Path) -> Result<f64, AudioError> {
        if !video.exists() {
            return Err(AudioError::VideoNotFound(video.display().to_string()));
        }

        let future = Command::new(&self.config.ffprobe_path)
            .args(["-v", "error", "-show_entries", "format=duration", "-of", "default=noprint_wrappers=1:nokey=1"])
            .arg(video)
            .kill_on_drop(true)
            .output();

        let output = self.run_bounded(future).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AudioError::Probe(stderr.trim().to_string()));
        }

        Self::parse_duration_output(&String::from_utf8_lossy(&output.stdout))
    }

    /// Parses the bare duration printed by ffprobe
    pub fn parse_duration_output(stdout: &str) -> Result<f64, AudioError> {
        let value = stdout.trim();
        match value.parse::<f64>() {
            Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
            Ok(_) => Err(AudioError::Probe(format!("invalid duration '{}'", value))),
            Err(e) => Err(AudioError::Probe(format!("unexpected ffprobe output '{}': {}", value, e))),
        }
    }

    async fn run_bounded(
        &self,
        future: impl std::future::Future<Output = std::io::Result<Output>>,
    ) -> Result<Output, AudioError> {
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        tokio::select! {
            result = future => result.map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => AudioError::FfmpegMissing,
                _ => AudioError::Io(e),
            }),
            _ = tokio::time::sleep(timeout_duration) => Err(AudioError::Timeout(self.config.timeout_secs)),
        }
    }
}

#[async_trait]
impl AudioExtractor for FfmpegExtractor {
    async fn extract(&self, video: &Path, out_dir: &Path) -> Result<PathBuf, AudioError> {
        if !video.exists() {
            return Err(AudioError::VideoNotFound(video.display().to_string()));
        }

        tokio::fs::create_dir_all(out_dir).await?;
        let output_path = Self::output_path(video, out_dir);
        debug!("Extracting audio from {:?} to {:?}", video, output_path);

        let future = Command::new(&self.config.ffmpeg_path)
            .args(self.ffmpeg_args(video, &output_path))
            .kill_on_drop(true)
            .output();

        let output = self.run_bounded(future).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("ffmpeg audio extraction failed: {}", filtered);
            return Err(AudioError::Failed(filtered));
        }

        if !output_path.exists() {
            return Err(AudioError::OutputMissing(output_path.display().to_string()));
        }

        Ok(output_path)
    }

    async fn duration(&self, video: &Path) -> Result<Option<f64>, AudioError> {
        self.probe_duration(video).await.map(Some)
    }
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let noise_prefixes = [
        "ffmpeg version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
        "size=",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !noise_prefixes.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown ffmpeg error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
