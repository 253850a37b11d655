/*!
 * Timeline reconciliation.
 *
 * Fuses the recognition timeline with the diarization timeline and coalesces
 * the result into subtitle-sized cues.
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::segment::{Cue, SpeakerTurn, TimedText, DEFAULT_SPEAKER, UNKNOWN_SPEAKER};

/// Limits applied when coalescing same-speaker cues
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationOptions {
    /// Maximum silence in seconds between two cues that may be joined
    #[serde(default = "default_max_gap")]
    pub max_gap: f64,

    /// Maximum span in seconds of a joined cue
    #[serde(default = "default_max_duration")]
    pub max_duration: f64,
}

impl Default for ConsolidationOptions {
    fn default() -> Self {
        Self {
            max_gap: default_max_gap(),
            max_duration: default_max_duration(),
        }
    }
}

fn default_max_gap() -> f64 {
    0.5
}

fn default_max_duration() -> f64 {
    10.0
}

/// Returns the speaker whose turn overlaps `[start, end]` the most.
///
/// Only a strictly greater overlap replaces the current best, so on ties the
/// turn that comes first in `turns` wins.
pub fn find_best_speaker(start: f64, end: f64, turns: &[SpeakerTurn]) -> &str {
    let mut best_speaker = UNKNOWN_SPEAKER;
    let mut best_overlap = 0.0;

    for turn in turns {
        let overlap = turn.overlap_with(start, end);
        if overlap > best_overlap {
            best_overlap = overlap;
            best_speaker = turn.speaker.as_str();
        }
    }

    best_speaker
}

/// Assigns a speaker label to every recognized utterance.
///
/// Without diarization turns every cue is attributed to `SPEAKER_00`.
pub fn assign_speakers(texts: &[TimedText], turns: Option<&[SpeakerTurn]>) -> Vec<Cue> {
    match turns {
        Some(turns) if !turns.is_empty() => texts
            .iter()
            .map(|timed| Cue::from_timed_text(timed, find_best_speaker(timed.start, timed.end, turns)))
            .collect(),
        _ => texts
            .iter()
            .map(|timed| Cue::from_timed_text(timed, DEFAULT_SPEAKER))
            .collect(),
    }
}

/// Joins consecutive cues of the same speaker while the gap and total span stay
/// within `options`. Joined texts are separated by a single space.
pub fn consolidate(cues: &[Cue], options: ConsolidationOptions) -> Vec<Cue> {
    let mut consolidated = Vec::new();
    let mut current: Option<Cue> = None;

    for cue in cues {
        current = Some(match current.take() {
            None => cue.clone(),
            Some(mut acc) => {
                let same_speaker = cue.speaker == acc.speaker;
                let small_gap = cue.start - acc.end <= options.max_gap;
                let within_duration = cue.end - acc.start <= options.max_duration;

                if same_speaker && small_gap && within_duration {
                    acc.end = cue.end;
                    acc.text.push(' ');
                    acc.text.push_str(&cue.text);
                    acc
                } else {
                    consolidated.push(acc);
                    cue.clone()
                }
            }
        });
    }

    if let Some(last) = current {
        consolidated.push(last);
    }

    consolidated
}

/// Speaking-time summary of a diarization result
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpeakerStats {
    /// Distinct speakers, sorted
    pub speakers: Vec<String>,
    /// Sum of all turn durations in seconds
    pub total_duration: f64,
    /// Speaking time per speaker in seconds
    pub speaker_durations: BTreeMap<String, f64>,
}

/// Computes per-speaker speaking time from diarization turns
pub fn speaker_stats(turns: &[SpeakerTurn]) -> SpeakerStats {
    let mut speaker_durations: BTreeMap<String, f64> = BTreeMap::new();

    for turn in turns {
        *speaker_durations.entry(turn.speaker.clone()).or_insert(0.0) += turn.end - turn.start;
    }

    SpeakerStats {
        speakers: speaker_durations.keys().cloned().collect(),
        total_duration: speaker_durations.values().sum(),
        speaker_durations,
    }
}
