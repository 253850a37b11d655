/*!
 * Integration tests for the application controller
 */

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use duosub::app_config::Config;
use duosub::app_controller::{Controller, FolderSummary, RunOutcome};
use duosub::pipeline::{Pipeline, PipelineSettings};
use duosub::providers::mock::MockProvider;
use crate::common;
use crate::common::fakes::{FakeExtractor, FakeRecognizer};

fn controller(output_dir: &Path, provider: MockProvider) -> Controller {
    let settings = PipelineSettings {
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    };
    let pipeline = Pipeline::new(
        Arc::new(FakeExtractor::default()),
        Arc::new(FakeRecognizer::new(common::sample_texts())),
        settings,
    )
    .with_translator(common::mock_translator(provider, 10));

    let mut config = Config::default();
    config.output.dir = output_dir.to_string_lossy().to_string();
    Controller::with_pipeline(config, pipeline).quiet(true)
}

/// Test a second run skips unless overwriting is forced
#[tokio::test]
async fn test_run_twice_shouldSkipThenReprocessWhenForced() -> Result<()> {
    common::init_logger();
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "ep01.mkv", "video")?;
    let provider = MockProvider::working();
    let controller = controller(&temp_dir.path().join("out"), provider.clone());

    let first = controller.run(video.clone(), false).await?;
    let subtitle_path = match first {
        RunOutcome::Processed(output) => output.subtitle_path,
        RunOutcome::Skipped(_) => panic!("first run should process"),
    };
    assert!(subtitle_path.ends_with("out/ep01.ass"));
    assert_eq!(provider.request_count(), 1);

    let second = controller.run(video.clone(), false).await?;
    assert!(matches!(second, RunOutcome::Skipped(ref path) if *path == subtitle_path));
    assert_eq!(provider.request_count(), 1);

    let forced = controller.run(video, true).await?;
    assert!(matches!(forced, RunOutcome::Processed(_)));
    assert_eq!(provider.request_count(), 2);
    Ok(())
}

/// Test folder mode walks subdirectories and counts skipped files
#[tokio::test]
async fn test_runFolder_withExistingOutput_shouldProcessAndSkip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("videos");
    common::create_test_file(&input_dir, "day1.mp4", "video")?;
    common::create_test_file(&input_dir, "backstage/day2.MOV", "video")?;
    common::create_test_file(&input_dir, "notes.txt", "not a video")?;
    let output_dir = temp_dir.path().join("out");
    common::create_test_file(&output_dir, "day1.ass", "[Script Info]")?;

    let summary = controller(&output_dir, MockProvider::working())
        .run_folder(input_dir, false)
        .await?;

    assert_eq!(
        summary,
        FolderSummary {
            processed: 1,
            skipped: 1,
            failed: 0
        }
    );
    assert!(output_dir.join("backstage").join("day2.ass").exists());
    assert_eq!(std::fs::read_to_string(output_dir.join("day1.ass"))?, "[Script Info]");
    assert!(!output_dir.join("duosub.issues.log").exists());
    Ok(())
}

/// Test videos sharing a name in different subfolders get separate subtitles
#[tokio::test]
async fn test_runFolder_withSameNameInSubfolders_shouldProcessBoth() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("in");
    common::create_test_file(&input_dir, "a/ep01.mp4", "video")?;
    common::create_test_file(&input_dir, "b/ep01.mp4", "video")?;
    let output_dir = temp_dir.path().join("out");
    let controller = controller(&output_dir, MockProvider::working());

    let summary = controller.run_folder(input_dir.clone(), false).await?;

    assert_eq!(
        summary,
        FolderSummary {
            processed: 2,
            skipped: 0,
            failed: 0
        }
    );
    assert!(output_dir.join("a").join("ep01.ass").exists());
    assert!(output_dir.join("b").join("ep01.ass").exists());
    assert!(!output_dir.join("ep01.ass").exists());

    // A second pass finds both outputs and skips them
    let again = controller.run_folder(input_dir, false).await?;
    assert_eq!(again.skipped, 2);
    assert_eq!(again.processed, 0);
    Ok(())
}

/// Test failures are counted and written to the issue log
#[tokio::test]
async fn test_runFolder_withFailingTranslation_shouldWriteIssueLog() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("videos");
    common::create_test_file(&input_dir, "a.mp4", "video")?;
    common::create_test_file(&input_dir, "b.webm", "video")?;
    let output_dir = temp_dir.path().join("out");

    let summary = controller(&output_dir, MockProvider::failing())
        .run_folder(input_dir, false)
        .await?;

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.processed, 0);
    let log = std::fs::read_to_string(output_dir.join("duosub.issues.log"))?;
    assert_eq!(log.lines().filter(|l| l.starts_with("[ERROR]")).count(), 2);
    assert!(log.contains("a.mp4"));
    assert!(log.contains("b.webm"));
    assert!(!output_dir.join("a.ass").exists());
    Ok(())
}

#[tokio::test]
async fn test_runFolder_withMissingDirectory_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let result = controller(temp_dir.path(), MockProvider::working())
        .run_folder(temp_dir.path().join("nowhere"), false)
        .await;
    assert!(result.is_err());
    Ok(())
}
