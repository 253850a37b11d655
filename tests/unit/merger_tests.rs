/*!
 * Tests for speaker assignment and segment consolidation
 */

use duosub::merger::{assign_speakers, consolidate, speaker_stats, ConsolidationOptions};
use duosub::segment::{Cue, SpeakerTurn, TimedText, DEFAULT_SPEAKER, UNKNOWN_SPEAKER};
use crate::common;

/// Test the merge of the sample exchange with diarization
#[test]
fn test_assignThenConsolidate_withTurns_shouldSplitOnSpeakerChange() {
    let cues = assign_speakers(&common::sample_texts(), Some(&common::sample_turns()));
    let speakers: Vec<&str> = cues.iter().map(|c| c.speaker.as_str()).collect();
    assert_eq!(speakers, vec!["SPEAKER_00", "SPEAKER_00", "SPEAKER_01", "SPEAKER_00"]);

    let consolidated = consolidate(&cues, ConsolidationOptions::default());

    assert_eq!(consolidated.len(), 3);
    assert_eq!(consolidated[0].text, "みなさん、こんにちは 今日もよろしくお願いします");
    assert_eq!(consolidated[0].start, 0.0);
    assert_eq!(consolidated[0].end, 3.0);
    assert_eq!(consolidated[1].speaker, "SPEAKER_01");
    assert_eq!(consolidated[2].text, "推しメンです");
}

/// Without diarization the gap rule alone decides
#[test]
fn test_assignThenConsolidate_withoutTurns_shouldMergeOnGapOnly() {
    let cues = assign_speakers(&common::sample_texts(), None);
    let consolidated = consolidate(&cues, ConsolidationOptions::default());

    assert_eq!(consolidated.len(), 2);
    assert!(consolidated.iter().all(|c| c.speaker == DEFAULT_SPEAKER));
    assert_eq!(consolidated[0].end, 4.6);
    assert_eq!(consolidated[1].start, 5.5);
}

#[test]
fn test_assignSpeakers_withUtteranceOutsideTurns_shouldBeUnknown() {
    let texts = vec![TimedText::new(20.0, 21.0, "ありがとう")];
    let cues = assign_speakers(&texts, Some(&common::sample_turns()));
    assert_eq!(cues[0].speaker, UNKNOWN_SPEAKER);
}

/// Custom limits should be honored exactly at the boundary
#[test]
fn test_consolidate_withCustomOptions_shouldUseInclusiveLimits() {
    let options = ConsolidationOptions {
        max_gap: 1.0,
        max_duration: 4.0,
    };
    let cues = vec![
        Cue::new(0.0, 1.0, "一", "SPEAKER_00"),
        Cue::new(2.0, 3.0, "二", "SPEAKER_00"),
        Cue::new(3.0, 4.0, "三", "SPEAKER_00"),
        Cue::new(4.5, 5.0, "四", "SPEAKER_00"),
    ];

    let result = consolidate(&cues, options);

    let texts: Vec<&str> = result.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["一 二 三", "四"]);
}

/// Consolidated cues never overlap when the input does not
#[test]
fn test_consolidate_shouldKeepChronologicalOrder() {
    let cues = assign_speakers(&common::sample_texts(), Some(&common::sample_turns()));
    let result = consolidate(&cues, ConsolidationOptions::default());
    assert!(result.windows(2).all(|w| w[0].end <= w[1].start));
}

#[test]
fn test_speakerStats_withSampleTurns_shouldCountDistinctSpeakers() {
    let stats = speaker_stats(&common::sample_turns());
    assert_eq!(stats.speakers, vec!["SPEAKER_00", "SPEAKER_01"]);
    assert!((stats.total_duration - 7.5).abs() < 1e-9);

    let empty: Vec<SpeakerTurn> = Vec::new();
    assert!(speaker_stats(&empty).speakers.is_empty());
}
