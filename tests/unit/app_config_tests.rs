/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use std::path::PathBuf;
use tei2lcp::app_config::{Config, LemmaStrategy, LogLevel};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.corpus.name, "OFROM");
    assert_eq!(config.corpus.document_layer, "Interview");
    assert_eq!(config.corpus.segment_layer, "Utterance");
    assert_eq!(config.conversion.audio_format, None);
    assert_eq!(config.conversion.lemma_strategy, LemmaStrategy::Plain);
    assert_eq!(config.source.endpoint, "https://api.nakala.fr/");
    assert_eq!(config.source.collection_id, "10.34847%2Fnkl.ebcdd191");
    assert_eq!(config.source.per_page, 50);
    assert_eq!(config.source.concurrent_downloads, 4);
    assert!(config.source.download_audio);
    assert_eq!(config.paths.download_dir, PathBuf::from("download"));
    assert_eq!(config.paths.corpus_dir, PathBuf::from("corpus"));
    assert_eq!(config.log_level, LogLevel::Info);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.corpus.name = "  ".to_string();
    assert!(config.validate().is_err());
    config.corpus.name = "OFROM".to_string();

    config.source.per_page = 0;
    assert!(config.validate().is_err());
    config.source.per_page = 50;

    config.source.concurrent_downloads = 0;
    assert!(config.validate().is_err());
    config.source.concurrent_downloads = 2;

    config.conversion.audio_format = Some(".mp3".to_string());
    assert!(config.validate().is_err());
    config.conversion.audio_format = Some("mp3".to_string());
    assert!(config.validate().is_ok());
}

/// Blank audio formats count as unset
#[test]
fn test_audio_format_withBlankValue_shouldBeNone() {
    let mut config = Config::default();
    config.conversion.audio_format = Some("   ".to_string());
    assert_eq!(config.conversion.audio_format(), None);

    config.conversion.audio_format = Some(" ogg ".to_string());
    assert_eq!(config.conversion.audio_format(), Some("ogg"));
}

/// Partial configuration files are completed with defaults
#[test]
fn test_config_deserialization_withPartialJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{
        "corpus": { "name": "TEST" },
        "conversion": { "audio_format": "mp3", "lemma_strategy": "composite" },
        "log_level": "debug"
    }"#;

    let config: Config = serde_json::from_str(json)?;
    assert_eq!(config.corpus.name, "TEST");
    assert_eq!(config.corpus.segment_layer, "Utterance");
    assert_eq!(config.conversion.audio_format(), Some("mp3"));
    assert_eq!(config.conversion.lemma_strategy, LemmaStrategy::Composite);
    assert_eq!(config.source.per_page, 50);
    assert_eq!(config.log_level, LogLevel::Debug);
    Ok(())
}

/// Saving then loading keeps the values
#[test]
fn test_config_save_withCustomValues_shouldReloadIdentically() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.corpus.name = "Saved".to_string();
    config.corpus.date = Some("2024-01-31".to_string());
    config.source.concurrent_downloads = 7;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.corpus.name, "Saved");
    assert_eq!(loaded.corpus.effective_date(), "2024-01-31");
    assert_eq!(loaded.source.concurrent_downloads, 7);
    Ok(())
}

/// Loading a missing file fails
#[test]
fn test_config_from_file_withMissingFile_shouldFail() {
    assert!(Config::from_file("./no_such_config_12345.json").is_err());
}

/// Lemma strategies parse case-insensitively
#[test]
fn test_lemma_strategy_fromStr_shouldParseKnownValues() {
    assert_eq!("Plain".parse::<LemmaStrategy>().unwrap(), LemmaStrategy::Plain);
    assert_eq!("COMPOSITE".parse::<LemmaStrategy>().unwrap(), LemmaStrategy::Composite);
    assert!("fancy".parse::<LemmaStrategy>().is_err());
    assert_eq!(LemmaStrategy::Composite.to_string(), "composite");
}

/// Log levels map onto the log facade
#[test]
fn test_log_level_toLevelFilter_shouldMatch() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
