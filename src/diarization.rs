/*!
 * Speaker diarization.
 *
 * Diarization runs out of process. The configured command is called as
 * `<program> [args...] <audio> [--min-speakers N] [--max-speakers N]` with the
 * HuggingFace token in `HF_TOKEN`, and must print a JSON array of
 * `{"start": f64, "end": f64, "speaker": "SPEAKER_00"}` objects on stdout.
 */

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use tokio::process::Command;

use crate::app_config::DiarizationConfig;
use crate::errors::DiarizationError;
use crate::segment::SpeakerTurn;

/// Parameters for one diarization run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiarizationRequest {
    /// HuggingFace access token for the diarization model
    pub credential: String,
    pub min_speakers: Option<u32>,
    pub max_speakers: Option<u32>,
}

/// Attributes spans of audio to speakers
#[async_trait]
pub trait Diarizer: Send + Sync {
    /// Returns speaker turns sorted by start time
    async fn diarize(&self, audio: &Path, request: &DiarizationRequest) -> Result<Vec<SpeakerTurn>, DiarizationError>;
}

/// Diarizer that shells out to an external program
#[derive(Debug, Clone)]
pub struct CommandDiarizer {
    program: String,
    args: Vec<String>,
    timeout_secs: u64,
}

impl CommandDiarizer {
    pub fn new(config: &DiarizationConfig) -> Self {
        Self {
            program: config.command.clone(),
            args: config.args.clone(),
            timeout_secs: config.timeout_secs,
        }
    }

    /// Command line arguments following the program name
    pub fn command_args(&self, audio: &Path, request: &DiarizationRequest) -> Vec<String> {
        let mut args = self.args.clone();
        args.push(audio.to_string_lossy().to_string());
        if let Some(min) = request.min_speakers {
            args.push("--min-speakers".to_string());
            args.push(min.to_string());
        }
        if let Some(max) = request.max_speakers {
            args.push("--max-speakers".to_string());
            args.push(max.to_string());
        }
        args
    }

    /// Parses the JSON turn list printed by the diarization program
    pub fn parse_turns(stdout: &str) -> Result<Vec<SpeakerTurn>, DiarizationError> {
        let mut turns: Vec<SpeakerTurn> =
            serde_json::from_str(stdout.trim()).map_err(|e| DiarizationError::Parse(e.to_string()))?;
        turns.sort_by(|a, b| a.start.total_cmp(&b.start));
        Ok(turns)
    }
}

#[async_trait]
impl Diarizer for CommandDiarizer {
    async fn diarize(&self, audio: &Path, request: &DiarizationRequest) -> Result<Vec<SpeakerTurn>, DiarizationError> {
        if !audio.exists() {
            return Err(DiarizationError::AudioNotFound(audio.display().to_string()));
        }
        if request.credential.is_empty() {
            return Err(DiarizationError::MissingCredential);
        }

        let args = self.command_args(audio, request);
        debug!("Running diarization: {} {}", self.program, args.join(" "));

        let future = Command::new(&self.program)
            .args(&args)
            .env("HF_TOKEN", &request.credential)
            .kill_on_drop(true)
            .output();

        let timeout_duration = Duration::from_secs(self.timeout_secs);
        let output = tokio::select! {
            result = future => result.map_err(|e| DiarizationError::Spawn {
                command: self.program.clone(),
                message: e.to_string(),
            })?,
            _ = tokio::time::sleep(timeout_duration) => {
                return Err(DiarizationError::Failed(format!("timed out after {} seconds", self.timeout_secs)));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DiarizationError::Failed(format!("{} ({})", stderr.trim(), output.status)));
        }

        let turns = Self::parse_turns(&String::from_utf8_lossy(&output.stdout))?;
        info!("Diarization found {} speaker turns", turns.len());
        Ok(turns)
    }
}
