/*!
 * # duosub - bilingual Japanese/Chinese subtitles
 *
 * A Rust library that turns the Japanese speech of a video into a bilingual
 * ASS subtitle file with one color per speaker.
 *
 * ## Features
 *
 * - Extract a 16 kHz mono track from video files with ffmpeg
 * - Transcribe speech with an OpenAI-compatible Whisper endpoint
 * - Identify speakers through an external diarization command
 * - Attribute transcript lines to speakers by maximum time overlap
 * - Consolidate short, same-speaker fragments into readable cues
 * - Translate cues in numbered batches using the Anthropic API
 * - Write ASS files with Chinese above Japanese, styled per speaker
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `app_controller`: Main application controller (single file and folder mode)
 * - `pipeline`: End-to-end orchestration of one video
 * - `audio`, `recognition`, `diarization`: External collaborators
 * - `merger`: Speaker assignment and segment consolidation
 * - `translation`: Batched translation with retries:
 *   - `translation::core`: Translation service and token accounting
 *   - `translation::batch`: Batch processing of cues
 *   - `translation::parser`: Numbered response parsing
 *   - `translation::prompts`: Prompt templates
 *   - `translation::retry`: Retry policy
 * - `subtitle`: ASS rendering and timestamp formatting
 * - `segment`: Shared data types
 * - `file_utils`: File system operations
 * - `language_utils`: ISO language code utilities
 * - `providers`: LLM provider clients
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod audio;
pub mod diarization;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod merger;
pub mod pipeline;
pub mod providers;
pub mod recognition;
pub mod segment;
pub mod subtitle;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, FolderSummary, RunOutcome};
pub use errors::{PipelineError, ProviderError, SubtitleError, TranslationError};
pub use language_utils::{get_language_name, normalize_to_part2t};
pub use merger::{assign_speakers, consolidate, ConsolidationOptions};
pub use pipeline::{Pipeline, PipelineOutput, PipelineSettings};
pub use segment::{Cue, Segment, SpeakerTurn, TimedText, TranslatedCue};
pub use subtitle::{write_ass, AssOptions};
pub use translation::{BatchTranslator, TranslationService};
