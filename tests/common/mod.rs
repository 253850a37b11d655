/*!
 * Common test utilities for the duosub test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tempfile::TempDir;

use duosub::providers::mock::MockProvider;
use duosub::segment::{SpeakerTurn, TimedText};
use duosub::translation::{BatchTranslator, RetryPolicy, TranslationOptions, TranslationService};

// Fake pipeline collaborators
pub mod fakes;

/// Initializes env_logger once for tests that want log output
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Recognized lines of a short two-person exchange
pub fn sample_texts() -> Vec<TimedText> {
    vec![
        TimedText::new(0.0, 1.5, "みなさん、こんにちは"),
        TimedText::new(1.7, 3.0, "今日もよろしくお願いします"),
        TimedText::new(3.4, 4.6, "センターは誰？"),
        TimedText::new(5.5, 7.0, "推しメンです"),
    ]
}

/// Diarization turns matching `sample_texts`
pub fn sample_turns() -> Vec<SpeakerTurn> {
    vec![
        SpeakerTurn::new(0.0, 3.2, "SPEAKER_00"),
        SpeakerTurn::new(3.2, 5.0, "SPEAKER_01"),
        SpeakerTurn::new(5.0, 7.5, "SPEAKER_00"),
    ]
}

/// Retry policy that never sleeps noticeably
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1))
}

/// Batch translator backed by the given mock provider
pub fn mock_translator(provider: MockProvider, batch_size: usize) -> BatchTranslator {
    let options = TranslationOptions {
        retry: fast_retry(),
        ..Default::default()
    };
    BatchTranslator::new(TranslationService::with_provider(Arc::new(provider), options), batch_size)
}
