/*!
 * Segment data model.
 *
 * Every stage of the pipeline hands the next one plain owned values:
 * - `TimedText`: an utterance produced by speech recognition
 * - `SpeakerTurn`: a voice-activity interval produced by diarization
 * - `Cue`: a timed text with a speaker label (merged or consolidated)
 * - `TranslatedCue`: a cue with its translation attached
 *
 * `Segment`, `Suggestion` and `DictionaryEntry` describe the editable form of a
 * finished subtitle line and the correction dictionary. They are data shapes only.
 */

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Speaker label used when a cue overlaps no diarization turn
pub const UNKNOWN_SPEAKER: &str = "UNKNOWN";

/// Speaker label used for every cue when diarization is disabled
pub const DEFAULT_SPEAKER: &str = "SPEAKER_00";

/// One recognized utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedText {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
    /// Recognized text
    pub text: String,
}

impl TimedText {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self { start, end, text: text.into() }
    }
}

/// One attributed voice-activity interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerTurn {
    pub start: f64,
    pub end: f64,
    /// Speaker identifier (e.g. "SPEAKER_01")
    pub speaker: String,
}

impl SpeakerTurn {
    pub fn new(start: f64, end: f64, speaker: impl Into<String>) -> Self {
        Self { start, end, speaker: speaker.into() }
    }

    /// Length of the temporal intersection with `[start, end]`, never negative
    pub fn overlap_with(&self, start: f64, end: f64) -> f64 {
        let overlap_start = start.max(self.start);
        let overlap_end = end.min(self.end);
        (overlap_end - overlap_start).max(0.0)
    }
}

/// A timed text annotated with a speaker label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cue {
    pub start: f64,
    pub end: f64,
    pub text: String,
    pub speaker: String,
}

/// Output of the merger
pub type MergedCue = Cue;

/// Output of the consolidator
pub type ConsolidatedCue = Cue;

impl Cue {
    pub fn new(start: f64, end: f64, text: impl Into<String>, speaker: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            speaker: speaker.into(),
        }
    }

    /// Builds a cue from a recognized utterance
    pub fn from_timed_text(timed: &TimedText, speaker: impl Into<String>) -> Self {
        Self::new(timed.start, timed.end, timed.text.clone(), speaker)
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Attaches a translation, consuming the cue
    pub fn with_translation(self, translation: impl Into<String>) -> TranslatedCue {
        TranslatedCue {
            start: self.start,
            end: self.end,
            text: self.text,
            speaker: self.speaker,
            translation: translation.into(),
        }
    }
}

/// A consolidated cue with its translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslatedCue {
    pub start: f64,
    pub end: f64,
    /// Original (Japanese) text
    pub text: String,
    pub speaker: String,
    /// Translated (Chinese) text; empty when the translation could not be resolved
    #[serde(default)]
    pub translation: String,
}

impl TranslatedCue {
    pub fn new(
        start: f64,
        end: f64,
        text: impl Into<String>,
        speaker: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            speaker: speaker.into(),
            translation: translation.into(),
        }
    }

    /// Wraps an untranslated cue with an empty translation
    pub fn untranslated(cue: Cue) -> Self {
        cue.with_translation(String::new())
    }
}

/// Review state of a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    #[default]
    Ok,
    Warning,
    Error,
}

/// Kind of a modification suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Recognition,
    Translation,
    Consistency,
}

/// Field of a segment a suggestion applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentField {
    TextJa,
    TextZh,
}

/// A modification suggestion for a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub field: SegmentField,
    pub original: String,
    pub suggested: String,
    pub reason: String,
    #[serde(default)]
    pub add_to_dict: bool,
}

/// Editable subtitle line with review metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub id: usize,
    pub start: f64,
    pub end: f64,
    pub speaker: String,
    pub text_ja: String,
    #[serde(default)]
    pub text_zh: String,
    #[serde(default)]
    pub status: SegmentStatus,
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Numbers translated cues from 1 in their current order
    pub fn from_translated(cues: &[TranslatedCue]) -> Vec<Segment> {
        cues.iter()
            .enumerate()
            .map(|(idx, cue)| Segment {
                id: idx + 1,
                start: cue.start,
                end: cue.end,
                speaker: cue.speaker.clone(),
                text_ja: cue.text.clone(),
                text_zh: cue.translation.clone(),
                status: SegmentStatus::Ok,
                suggestions: Vec::new(),
            })
            .collect()
    }
}

impl From<&Segment> for TranslatedCue {
    fn from(segment: &Segment) -> Self {
        TranslatedCue::new(
            segment.start,
            segment.end,
            segment.text_ja.clone(),
            segment.speaker.clone(),
            segment.text_zh.clone(),
        )
    }
}

/// Correction dictionary entry for recurring misrecognitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub id: usize,
    /// Misrecognized pattern
    pub wrong: String,
    /// Correct representation
    pub correct: String,
    /// Category (e.g. "idol terms")
    #[serde(default)]
    pub category: String,
    #[serde(default = "Local::now")]
    pub created_at: DateTime<Local>,
    #[serde(default)]
    pub used_count: u32,
}

impl DictionaryEntry {
    pub fn new(id: usize, wrong: impl Into<String>, correct: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id,
            wrong: wrong.into(),
            correct: correct.into(),
            category: category.into(),
            created_at: Local::now(),
            used_count: 0,
        }
    }
}
