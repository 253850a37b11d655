use anyhow::{anyhow, Context, Result};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;
use std::time::Duration;

use crate::diarization::DiarizationRequest;
use crate::merger::ConsolidationOptions;
use crate::recognition::{RecognitionHint, IDOL_VOCABULARY_PROMPT};
use crate::subtitle::AssOptions;
use crate::translation::{PromptTemplate, RetryPolicy, TranslationOptions};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Spoken language code (ISO 639-1 or 639-2)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Translation language code (ISO 639-1 or 639-2)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub transcription: TranscriptionConfig,

    #[serde(default)]
    pub diarization: DiarizationConfig,

    #[serde(default)]
    pub translation: TranslationConfig,

    /// Rules for joining adjacent cues of the same speaker
    #[serde(default)]
    pub consolidation: ConsolidationOptions,

    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// ffmpeg settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AudioConfig {
    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe executable
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Upper bound for a single ffmpeg run
    #[serde(default = "default_ffmpeg_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_ffmpeg_timeout_secs(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// Speech recognition service settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptionConfig {
    /// Bearer token for the transcription API
    #[serde(default = "String::new")]
    pub api_key: String,

    /// Base URL of an OpenAI-compatible transcription service
    #[serde(default = "default_whisper_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_whisper_model")]
    pub model: String,

    /// Vocabulary hint sent with every transcription
    #[serde(default = "default_initial_prompt")]
    pub initial_prompt: String,

    #[serde(default = "default_transcription_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_whisper_endpoint(),
            model: default_whisper_model(),
            initial_prompt: default_initial_prompt(),
            timeout_secs: default_transcription_timeout_secs(),
        }
    }
}

impl TranscriptionConfig {
    /// Recognition hint for `language`, sent as its ISO 639-1 code
    pub fn hint(&self, language: &str) -> RecognitionHint {
        let language = crate::language_utils::to_part1(language)
            .unwrap_or_else(|_| language.trim().to_lowercase());
        RecognitionHint {
            language,
            prompt: Some(self.initial_prompt.clone()).filter(|p| !p.is_empty()),
        }
    }
}

/// Speaker diarization settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DiarizationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// HuggingFace token passed to the diarization program
    #[serde(default = "String::new")]
    pub hf_token: String,

    /// Diarization program
    #[serde(default = "default_diarization_command")]
    pub command: String,

    /// Arguments placed before the audio path
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub min_speakers: Option<u32>,

    #[serde(default = "default_max_speakers")]
    pub max_speakers: Option<u32>,

    #[serde(default = "default_diarization_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hf_token: String::new(),
            command: default_diarization_command(),
            args: Vec::new(),
            min_speakers: None,
            max_speakers: default_max_speakers(),
            timeout_secs: default_diarization_timeout_secs(),
        }
    }
}

impl DiarizationConfig {
    pub fn request(&self) -> DiarizationRequest {
        DiarizationRequest {
            credential: self.hf_token.clone(),
            min_speakers: self.min_speakers,
            max_speakers: self.max_speakers,
        }
    }
}

/// Translation service configuration (Anthropic Messages API)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// When false the subtitles carry the original text only
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "String::new")]
    pub api_key: String,

    #[serde(default = "default_anthropic_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_anthropic_model")]
    pub model: String,

    /// Maximum number of tokens generated per batch
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default = "default_anthropic_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of cues per request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Total number of attempts per batch
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Backoff after the first failed attempt, doubled on each retry (in milliseconds)
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Prompt template
    /// Placeholders: {input_text}, {source_language}, {target_language}
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: String::new(),
            endpoint: default_anthropic_endpoint(),
            model: default_anthropic_model(),
            max_tokens: default_max_tokens(),
            temperature: None,
            timeout_secs: default_anthropic_timeout_secs(),
            batch_size: default_batch_size(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            prompt_template: default_prompt_template(),
        }
    }
}

impl TranslationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_count, Duration::from_millis(self.retry_backoff_ms))
    }
}

/// Output settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutputConfig {
    /// Directory receiving `<video stem>.ass`
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Also write `<video stem>.segments.json`
    #[serde(default)]
    pub dump_json: bool,

    #[serde(default)]
    pub ass: AssOptions,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            dump_json: false,
            ass: AssOptions::default(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "ja".to_string()
}

fn default_target_language() -> String {
    "zh".to_string()
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_ffmpeg_timeout_secs() -> u64 {
    600
}

fn default_sample_rate() -> u32 {
    crate::audio::SPEECH_SAMPLE_RATE
}

fn default_whisper_endpoint() -> String {
    "https://api.openai.com".to_string()
}

fn default_whisper_model() -> String {
    "whisper-1".to_string()
}

fn default_initial_prompt() -> String {
    IDOL_VOCABULARY_PROMPT.to_string()
}

fn default_transcription_timeout_secs() -> u64 {
    600
}

fn default_diarization_command() -> String {
    "duosub-diarize".to_string()
}

fn default_max_speakers() -> Option<u32> {
    Some(4)
}

fn default_diarization_timeout_secs() -> u64 {
    1800
}

fn default_anthropic_endpoint() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_anthropic_timeout_secs() -> u64 {
    120
}

fn default_batch_size() -> usize {
    10
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

fn default_prompt_template() -> String {
    PromptTemplate::IDOL_JA_ZH.to_string()
}

fn default_output_dir() -> String {
    "./output".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load the configuration from a JSON file, creating the file with
    /// defaults when it does not exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            return Ok(config);
        }

        log::warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply overrides from process environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a variable lookup.
    ///
    /// Recognized variables: `CLAUDE_API_KEY`, `HF_TOKEN`, `WHISPER_API_KEY`,
    /// `WHISPER_MODEL`, `ENABLE_DIARIZATION`, `TRANSLATION_BATCH_SIZE`, `OUTPUT_DIR`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(key) = get("CLAUDE_API_KEY") {
            self.translation.api_key = key;
        }
        if let Some(token) = get("HF_TOKEN") {
            self.diarization.hf_token = token;
        }
        if let Some(key) = get("WHISPER_API_KEY") {
            self.transcription.api_key = key;
        }
        if let Some(model) = get("WHISPER_MODEL") {
            self.transcription.model = model;
        }
        if let Some(flag) = get("ENABLE_DIARIZATION") {
            self.diarization.enabled = flag.eq_ignore_ascii_case("true");
        }
        if let Some(size) = get("TRANSLATION_BATCH_SIZE") {
            self.translation.batch_size = size
                .trim()
                .parse()
                .with_context(|| format!("Invalid TRANSLATION_BATCH_SIZE: {}", size))?;
        }
        if let Some(dir) = get("OUTPUT_DIR") {
            self.output.dir = dir;
        }

        Ok(())
    }

    /// Every configuration problem, in a stable order
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if crate::language_utils::get_language_name(&self.source_language).is_err() {
            problems.push(format!("Invalid source language code: {}", self.source_language));
        } else if crate::language_utils::to_part1(&self.source_language).is_err() {
            problems.push(format!(
                "Source language {} has no ISO 639-1 code for speech recognition",
                self.source_language
            ));
        }
        if self.translation.enabled {
            if crate::language_utils::get_language_name(&self.target_language).is_err() {
                problems.push(format!("Invalid target language code: {}", self.target_language));
            }
            if self.translation.api_key.is_empty() {
                problems.push("CLAUDE_API_KEY is not set".to_string());
            }
            if self.translation.batch_size == 0 {
                problems.push("Translation batch size must be greater than 0".to_string());
            }
            if self.translation.retry_count == 0 {
                problems.push("Translation retry count must be at least 1".to_string());
            }
            if !PromptTemplate::new(&self.translation.prompt_template).has_input_slot() {
                problems.push("Translation prompt template has no {input_text} placeholder".to_string());
            }
        }
        if self.diarization.enabled && self.diarization.hf_token.is_empty() {
            problems.push("HF_TOKEN is required when diarization is enabled".to_string());
        }
        if let (Some(min), Some(max)) = (self.diarization.min_speakers, self.diarization.max_speakers) {
            if min > max {
                problems.push(format!("min_speakers ({}) is greater than max_speakers ({})", min, max));
            }
        }
        if self.consolidation.max_gap < 0.0 || self.consolidation.max_duration <= 0.0 {
            problems.push("Consolidation limits must be positive".to_string());
        }

        problems
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("Configuration errors:\n  - {}", problems.join("\n  - ")))
        }
    }

    /// Options for the translation service, with language names resolved
    pub fn translation_options(&self) -> TranslationOptions {
        let name_of = |code: &str| {
            crate::language_utils::get_language_name(code).unwrap_or_else(|_| code.to_string())
        };

        TranslationOptions {
            template: PromptTemplate::new(&self.translation.prompt_template),
            source_language: name_of(&self.source_language),
            target_language: name_of(&self.target_language),
            max_tokens: self.translation.max_tokens,
            temperature: self.translation.temperature,
            retry: self.translation.retry_policy(),
        }
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            audio: AudioConfig::default(),
            transcription: TranscriptionConfig::default(),
            diarization: DiarizationConfig::default(),
            translation: TranslationConfig::default(),
            consolidation: ConsolidationOptions::default(),
            output: OutputConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
