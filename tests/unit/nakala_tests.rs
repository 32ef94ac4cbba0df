/*!
 * Tests for the Nakala collection fetcher
 */

use std::fs;
use anyhow::Result;
use tei2lcp::app_config::SourceConfig;
use tei2lcp::source::{CollectionClient, CollectionPage, Fetcher, NakalaClient};
use crate::common;
use crate::common::mock_collection::{sha1_of, MockCollection};

/// Listing URLs follow the collection API layout
#[test]
fn test_page_url_withDefaultConfig_shouldTargetCollectionDatas() -> Result<()> {
    let client = NakalaClient::new(&SourceConfig::default())?;
    assert_eq!(
        client.page_url(2),
        "https://api.nakala.fr/collections/10.34847%2Fnkl.ebcdd191/datas?page=2&limit=50"
    );
    Ok(())
}

/// Download URLs encode the record identifier
#[test]
fn test_download_url_withSlashInIdentifier_shouldEncodeIt() -> Result<()> {
    let mut config = SourceConfig::default();
    config.endpoint = "https://example.org/api".to_string();
    let client = NakalaClient::new(&config)?;
    assert_eq!(
        client.download_url("10.34847/nkl.abc", "deadbeef"),
        "https://example.org/api/data/10.34847%2Fnkl.abc/deadbeef?content-disposition=attachment"
    );
    Ok(())
}

/// Invalid endpoints are rejected up front
#[test]
fn test_new_withInvalidEndpoint_shouldFail() {
    let mut config = SourceConfig::default();
    config.endpoint = "not a url".to_string();
    assert!(NakalaClient::new(&config).is_err());
}

/// Collection pages deserialize from the API's camelCase layout
#[test]
fn test_collection_page_deserialization_shouldReadPagination() -> Result<()> {
    let json = r#"{
        "currentPage": 1,
        "lastPage": 3,
        "total": 120,
        "data": [
            { "identifier": "10.34847/nkl.1", "files": [ { "name": "a.tei", "sha1": "abc", "size": 12 } ] },
            { "identifier": "10.34847/nkl.2" }
        ]
    }"#;

    let page: CollectionPage = serde_json::from_str(json)?;
    assert_eq!(page.current_page, 1);
    assert_eq!(page.last_page, 3);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].file_with_extension("tei").map(|f| f.sha1.as_str()), Some("abc"));
    assert!(page.data[1].files.is_empty());
    Ok(())
}

/// Pagination is followed until the last page
#[tokio::test]
async fn test_list_records_withThreePages_shouldRequestEachPage() -> Result<()> {
    let mock = MockCollection::new()
        .page()
        .record("r1", &[("a.tei", "a")])
        .page()
        .record("r2", &[("b.tei", "b")])
        .page()
        .record("r3", &[("c.tei", "c")]);
    let tracker = mock.tracker();

    let temp_dir = common::create_temp_dir()?;
    let fetcher = Fetcher::new(mock, temp_dir.path(), &SourceConfig::default());
    let records = fetcher.list_records().await?;

    assert_eq!(records.len(), 3);
    assert_eq!(tracker.lock().unwrap().pages, vec![1, 2, 3]);
    Ok(())
}

/// Transcripts and audio are downloaded; records without both are ignored
#[tokio::test]
async fn test_download_all_withFreshDirectory_shouldFetchEverything() -> Result<()> {
    let mock = MockCollection::new()
        .record("10.34847/nkl.1", &[("one.tei", "<TEI/>"), ("one.wav", "RIFF1")])
        .record("10.34847/nkl.2", &[("two.tei", "<TEI>2</TEI>"), ("two.wav", "RIFF2")])
        .record("10.34847/nkl.3", &[("three.tei", "<TEI>3</TEI>")]);

    let temp_dir = common::create_temp_dir()?;
    let download_dir = temp_dir.path().join("download");
    let fetcher = Fetcher::new(mock, &download_dir, &SourceConfig::default());
    let report = fetcher.download_all().await?;

    assert_eq!(report.records, 2);
    assert_eq!(report.tei_downloaded, 2);
    assert_eq!(report.audio_downloaded, 2);
    assert_eq!(report.audio_failed, 0);
    assert_eq!(fs::read(download_dir.join("one.tei"))?, b"<TEI/>");
    assert_eq!(fs::read(download_dir.join("two.wav"))?, b"RIFF2");
    assert!(!download_dir.join("three.tei").exists());
    Ok(())
}

/// Files whose local SHA-1 matches are not downloaded again
#[tokio::test]
async fn test_download_all_withUpToDateFiles_shouldSkipThem() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let download_dir = temp_dir.path().join("download");
    fs::create_dir_all(&download_dir)?;
    fs::write(download_dir.join("one.tei"), b"<TEI/>")?;
    fs::write(download_dir.join("one.wav"), b"outdated")?;

    let mock = MockCollection::new()
        .record("r1", &[("one.tei", "<TEI/>"), ("one.wav", "RIFF1")]);
    let tracker = mock.tracker();

    let fetcher = Fetcher::new(mock, &download_dir, &SourceConfig::default());
    let report = fetcher.download_all().await?;

    assert_eq!(report.tei_skipped, 1);
    assert_eq!(report.tei_downloaded, 0);
    assert_eq!(report.audio_downloaded, 1);
    assert_eq!(fs::read(download_dir.join("one.wav"))?, b"RIFF1");

    let tracker = tracker.lock().unwrap();
    assert_eq!(tracker.downloads.len(), 1);
    assert_eq!(tracker.downloads[0].1, sha1_of(b"RIFF1"));
    Ok(())
}

/// A failing audio download is logged and counted, not fatal
#[tokio::test]
async fn test_download_all_withFailingAudio_shouldCountFailure() -> Result<()> {
    let mock = MockCollection::new()
        .record("r1", &[("one.tei", "1"), ("one.wav", "A1")])
        .record("r2", &[("two.tei", "2"), ("two.wav", "A2")])
        .failing("A2");

    let temp_dir = common::create_temp_dir()?;
    let mut config = SourceConfig::default();
    config.concurrent_downloads = 1;
    let fetcher = Fetcher::new(mock, temp_dir.path(), &config);
    let report = fetcher.download_all().await?;

    assert_eq!(report.audio_downloaded, 1);
    assert_eq!(report.audio_failed, 1);
    assert!(temp_dir.path().join("one.wav").exists());
    assert!(!temp_dir.path().join("two.wav").exists());
    Ok(())
}

/// A failing transcript download aborts the run
#[tokio::test]
async fn test_download_all_withFailingTranscript_shouldFail() -> Result<()> {
    let mock = MockCollection::new()
        .record("r1", &[("one.tei", "1"), ("one.wav", "A1")])
        .failing("1");

    let temp_dir = common::create_temp_dir()?;
    let fetcher = Fetcher::new(mock, temp_dir.path(), &SourceConfig::default());
    assert!(fetcher.download_all().await.is_err());
    Ok(())
}

/// Audio can be left out entirely
#[tokio::test]
async fn test_download_all_withoutAudio_shouldOnlyFetchTranscripts() -> Result<()> {
    let mock = MockCollection::new()
        .record("r1", &[("one.tei", "1"), ("one.wav", "A1")]);
    let tracker = mock.tracker();

    let temp_dir = common::create_temp_dir()?;
    let fetcher = Fetcher::new(mock, temp_dir.path(), &SourceConfig::default()).without_audio();
    let report = fetcher.download_all().await?;

    assert_eq!(report.tei_downloaded, 1);
    assert_eq!(report.audio_downloaded, 0);
    assert_eq!(tracker.lock().unwrap().downloads.len(), 1);
    Ok(())
}

/// The mock itself honours the client contract for unknown files
#[tokio::test]
async fn test_mock_download_withUnknownSha_shouldReturnApiError() {
    let mock = MockCollection::new();
    let result = mock.download("r1", "0000").await;
    assert!(result.is_err());
}
