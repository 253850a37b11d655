/*!
 * Integration tests for the video to subtitle workflow
 */

use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tempfile::TempDir;

use duosub::diarization::DiarizationRequest;
use duosub::errors::{DiarizationError, PipelineError, TranslationError};
use duosub::pipeline::{Pipeline, PipelineSettings};
use duosub::providers::mock::{MockOutcome, MockProvider};
use duosub::segment::Segment;
use crate::common;
use crate::common::fakes::{FakeDiarizer, FakeExtractor, FakeRecognizer};

fn workspace(dump_json: bool) -> Result<(TempDir, PathBuf, PipelineSettings)> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "live_mc.mp4", "not really a video")?;
    let settings = PipelineSettings {
        output_dir: temp_dir.path().join("subs"),
        diarization: DiarizationRequest {
            credential: "hf_test".to_string(),
            ..Default::default()
        },
        dump_json,
        ..Default::default()
    };
    Ok((temp_dir, video, settings))
}

fn dialogue_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|l| l.starts_with("Dialogue:"))
        .map(|l| l.to_string())
        .collect()
}

/// Test the full workflow produces one colored style per speaker
#[tokio::test]
async fn test_processVideo_withFullWorkflow_shouldWriteBilingualSubtitles() -> Result<()> {
    common::init_logger();
    let (_temp_dir, video, settings) = workspace(true)?;
    let provider = MockProvider::working();
    let extractor = Arc::new(FakeExtractor::default());
    let pipeline = Pipeline::new(extractor.clone(), Arc::new(FakeRecognizer::new(common::sample_texts())), settings)
        .with_diarizer(Arc::new(FakeDiarizer::new(common::sample_turns())))
        .with_translator(common::mock_translator(provider.clone(), 2));

    let output = pipeline.process_video(&video, |_, _| {}).await?;

    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.request_count(), 2);
    assert_eq!(output.cue_count, 3);
    assert_eq!(output.speakers, vec!["SPEAKER_00", "SPEAKER_01"]);

    let content = std::fs::read_to_string(&output.subtitle_path)?;
    assert!(content.contains("Style: SPEAKER_00,Arial,48,&H00FFFFFF,"));
    assert!(content.contains("Style: SPEAKER_01,Arial,48,&H0000FFFF,"));
    assert_eq!(
        dialogue_lines(&content),
        vec![
            "Dialogue: 0,0:00:00.00,0:00:03.00,SPEAKER_00,,0,0,0,,みなさん、こんにちは 今日もよろしくお願いします\\N[ZH] みなさん、こんにちは 今日もよろしくお願いします",
            "Dialogue: 0,0:00:03.40,0:00:04.60,SPEAKER_01,,0,0,0,,センターは誰？\\N[ZH] センターは誰？",
            "Dialogue: 0,0:00:05.50,0:00:07.00,SPEAKER_00,,0,0,0,,推しメンです\\N[ZH] 推しメンです",
        ]
    );

    let segments_path = output.segments_path.expect("segments dump requested");
    assert!(segments_path.ends_with("subs/live_mc.segments.json"));
    let segments: Vec<Segment> = serde_json::from_str(&std::fs::read_to_string(segments_path)?)?;
    let ids: Vec<usize> = segments.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let usage = output.usage.expect("translation ran");
    assert_eq!(usage.requests, 2);
    Ok(())
}

/// Progress covers the documented stages and never moves backwards
#[tokio::test]
async fn test_processVideo_progress_shouldReportStagesInOrder() -> Result<()> {
    let (_temp_dir, video, settings) = workspace(false)?;
    let pipeline = Pipeline::new(
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeRecognizer::new(common::sample_texts())),
        settings,
    )
    .with_diarizer(Arc::new(FakeDiarizer::new(common::sample_turns())))
    .with_translator(common::mock_translator(MockProvider::working(), 1));
    let reports = Mutex::new(Vec::new());

    pipeline
        .process_video(&video, |message, ratio| reports.lock().unwrap().push((message.to_string(), ratio)))
        .await?;

    let reports = reports.lock().unwrap();
    assert!(reports.windows(2).all(|w| w[0].1 <= w[1].1));
    assert!(reports.iter().all(|(_, r)| (0.0..=1.0).contains(r)));
    for expected in ["Extracting audio...", "Merging segments...", "Translating... (3/3)", "Done"] {
        assert!(reports.iter().any(|(m, _)| m == expected), "missing report {:?}", expected);
    }
    let translating: Vec<f64> = reports
        .iter()
        .filter(|(m, _)| m.starts_with("Translating... ("))
        .map(|(_, r)| *r)
        .collect();
    assert_eq!(translating.len(), 3);
    assert!((translating[2] - 0.90).abs() < 1e-9);
    Ok(())
}

/// A fatal translation error leaves no subtitle file behind
#[tokio::test]
async fn test_processVideo_withFatalTranslation_shouldNotWriteOutput() -> Result<()> {
    let (_temp_dir, video, settings) = workspace(false)?;
    let pipeline = Pipeline::new(
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeRecognizer::new(common::sample_texts())),
        settings,
    )
    .with_translator(common::mock_translator(MockProvider::failing(), 10));
    let expected_output = pipeline.output_path_for(&video);

    let error = pipeline.process_video(&video, |_, _| {}).await.unwrap_err();

    assert!(matches!(error, PipelineError::Translation(TranslationError::Fatal(_))));
    assert!(!expected_output.exists());
    Ok(())
}

/// Missing diarization credentials surface as a diarization error
#[tokio::test]
async fn test_processVideo_withoutCredential_shouldFailDiarization() -> Result<()> {
    let (_temp_dir, video, mut settings) = workspace(false)?;
    settings.diarization.credential.clear();
    let recognizer = Arc::new(FakeRecognizer::new(common::sample_texts()));
    let pipeline = Pipeline::new(Arc::new(FakeExtractor::default()), recognizer, settings)
        .with_diarizer(Arc::new(FakeDiarizer::new(common::sample_turns())));

    let error = pipeline.process_video(&video, |_, _| {}).await.unwrap_err();

    assert!(matches!(error, PipelineError::Diarization(DiarizationError::MissingCredential)));
    Ok(())
}

#[tokio::test]
async fn test_processVideo_withFailingDiarizer_shouldPropagateMessage() -> Result<()> {
    let (_temp_dir, video, settings) = workspace(false)?;
    let pipeline = Pipeline::new(
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeRecognizer::new(common::sample_texts())),
        settings,
    )
    .with_diarizer(Arc::new(FakeDiarizer::failing()));

    let error = pipeline.process_video(&video, |_, _| {}).await.unwrap_err();

    assert_eq!(error.to_string(), "Pipeline failed: Speaker diarization failed: CUDA out of memory");
    Ok(())
}

/// A line missing from the model answer falls back to the Japanese text
#[tokio::test]
async fn test_processVideo_withPartialTranslation_shouldKeepJapaneseOnly() -> Result<()> {
    let (_temp_dir, video, settings) = workspace(false)?;
    let provider = MockProvider::scripted(vec![MockOutcome::Respond("1. 大家好，今天也请多关照\n3. 是我的本命".into())]);
    let pipeline = Pipeline::new(
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeRecognizer::new(common::sample_texts())),
        settings,
    )
    .with_diarizer(Arc::new(FakeDiarizer::new(common::sample_turns())))
    .with_translator(common::mock_translator(provider, 10));

    let output = pipeline.process_video(&video, |_, _| {}).await?;

    let content = std::fs::read_to_string(&output.subtitle_path)?;
    let lines = dialogue_lines(&content);
    assert_eq!(lines.len(), 3);
    assert!(lines[1].ends_with(",,センターは誰？"));
    assert!(lines[2].ends_with("推しメンです\\N是我的本命"));
    Ok(())
}

/// A failed segment dump leaves no subtitle file behind
#[tokio::test]
async fn test_processVideo_withUnwritableSegmentDump_shouldNotWriteSubtitles() -> Result<()> {
    let (temp_dir, video, settings) = workspace(true)?;
    std::fs::create_dir_all(temp_dir.path().join("subs").join("live_mc.segments.json"))?;
    let pipeline = Pipeline::new(
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeRecognizer::new(common::sample_texts())),
        settings,
    )
    .with_diarizer(Arc::new(FakeDiarizer::new(common::sample_turns())))
    .with_translator(common::mock_translator(MockProvider::working(), 10));
    let expected_output = pipeline.output_path_for(&video);

    let result = pipeline.process_video(&video, |_, _| {}).await;

    assert!(result.is_err());
    assert!(!expected_output.exists());
    Ok(())
}

/// The video duration read by the extractor is reported with the output
#[tokio::test]
async fn test_processVideo_withKnownDuration_shouldReportIt() -> Result<()> {
    let (_temp_dir, video, settings) = workspace(false)?;
    let pipeline = Pipeline::new(
        Arc::new(FakeExtractor::with_duration(125.0)),
        Arc::new(FakeRecognizer::new(common::sample_texts())),
        settings,
    )
    .with_diarizer(Arc::new(FakeDiarizer::new(common::sample_turns())))
    .with_translator(common::mock_translator(MockProvider::working(), 10));

    let output = pipeline.process_video(&video, |_, _| {}).await?;

    assert_eq!(output.video_duration, Some(125.0));
    assert!(output.subtitle_path.exists());
    Ok(())
}
