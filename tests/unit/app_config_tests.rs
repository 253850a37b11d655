/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;

use duosub::app_config::{Config, LogLevel};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "ja");
    assert_eq!(config.target_language, "zh");
    assert!(config.diarization.enabled);
    assert!(config.translation.enabled);
    assert_eq!(config.translation.batch_size, 10);
    assert_eq!(config.transcription.model, "whisper-1");
    assert_eq!(config.consolidation.max_gap, 0.5);
    assert_eq!(config.consolidation.max_duration, 10.0);
    assert_eq!(config.output.dir, "./output");
    assert_eq!(config.log_level, LogLevel::Info);
}

/// A partial file only overrides the keys it names
#[test]
fn test_loadOrCreate_withPartialFile_shouldFillDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "duosub.json",
        r#"{
            "translation": { "batch_size": 20, "api_key": "sk-ant-file" },
            "diarization": { "enabled": false },
            "consolidation": { "max_gap": 0.8 }
        }"#,
    )?;

    let config = Config::load_or_create(&path)?;

    assert_eq!(config.translation.batch_size, 20);
    assert_eq!(config.translation.api_key, "sk-ant-file");
    assert_eq!(config.translation.retry_count, 3);
    assert!(!config.diarization.enabled);
    assert_eq!(config.consolidation.max_gap, 0.8);
    assert_eq!(config.consolidation.max_duration, 10.0);
    assert!(config.validate().is_ok());
    Ok(())
}

#[test]
fn test_loadOrCreate_withMalformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "broken.json", "{ not json")?;
    assert!(Config::load_or_create(&path).is_err());
    Ok(())
}

/// Overrides applied on top of a file win over the file
#[test]
fn test_applyOverrides_afterLoad_shouldTakePrecedence() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(
        temp_dir.path(),
        "duosub.json",
        r#"{ "translation": { "api_key": "sk-ant-file" } }"#,
    )?;

    let mut config = Config::load_or_create(&path)?;
    config.apply_overrides(|key| match key {
        "CLAUDE_API_KEY" => Some("sk-ant-env".to_string()),
        "ENABLE_DIARIZATION" => Some("FALSE".to_string()),
        _ => None,
    })?;

    assert_eq!(config.translation.api_key, "sk-ant-env");
    assert!(!config.diarization.enabled);
    assert!(config.problems().is_empty());
    Ok(())
}

#[test]
fn test_problems_withInconsistentSpeakerBounds_shouldReport() {
    let mut config = Config::default();
    config.translation.api_key = "sk-ant-test".to_string();
    config.diarization.hf_token = "hf_test".to_string();
    config.diarization.min_speakers = Some(5);
    config.diarization.max_speakers = Some(2);

    let problems = config.problems();

    assert_eq!(problems.len(), 1);
    assert!(problems[0].contains("min_speakers"));
}

/// A three-letter source language reaches speech recognition as its two-letter code
#[test]
fn test_transcriptionHint_withPart2Code_shouldUsePart1Code() {
    let mut config = Config::default();
    config.source_language = "jpn".to_string();

    let hint = config.transcription.hint(&config.source_language);

    assert_eq!(hint.language, "ja");
}
