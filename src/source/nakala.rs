use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use log::{debug, error, info};
use reqwest::{header, Client};
use serde::Deserialize;
use url::Url;

use crate::app_config::SourceConfig;
use crate::errors::SourceError;
use crate::file_utils::FileManager;

// @module: Nakala collection fetcher

/// A file attached to a data record
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RemoteFile {
    /// File name, e.g. `ofrom_001.tei`
    #[serde(default)]
    pub name: String,

    /// SHA-1 of the content, also used as the file's download key
    #[serde(default)]
    pub sha1: String,
}

/// One data record of the collection
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DataRecord {
    /// DOI of the record
    pub identifier: String,

    /// Attached files
    #[serde(default)]
    pub files: Vec<RemoteFile>,
}

impl DataRecord {
    /// First attached file with the given extension
    pub fn file_with_extension(&self, extension: &str) -> Option<&RemoteFile> {
        let suffix = format!(".{}", extension.trim_start_matches('.'));
        self.files.iter().find(|file| file.name.ends_with(&suffix))
    }
}

/// One page of `collections/{id}/datas`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPage {
    #[serde(default)]
    pub data: Vec<DataRecord>,
    pub current_page: u32,
    pub last_page: u32,
}

/// Access to a remote collection
#[async_trait]
pub trait CollectionClient: Send + Sync {
    /// Fetch page `page` (1-based) of the collection's records
    async fn fetch_page(&self, page: u32) -> Result<CollectionPage, SourceError>;

    /// Download the content of a file of a record
    async fn download(&self, identifier: &str, sha1: &str) -> Result<Bytes, SourceError>;
}

/// HTTP client for the Nakala API
pub struct NakalaClient {
    /// HTTP client for API requests
    client: Client,
    /// API base URL, with trailing slash
    endpoint: String,
    /// Collection DOI, URL-encoded
    collection_id: String,
    /// Records per page
    per_page: usize,
}

impl NakalaClient {
    /// Create a client from the source configuration
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let mut endpoint = Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid API endpoint: {}", config.endpoint))?
            .to_string();
        if !endpoint.ends_with('/') {
            endpoint.push('/');
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint,
            collection_id: config.collection_id.clone(),
            per_page: config.per_page,
        })
    }

    /// URL of a page of the collection listing
    pub fn page_url(&self, page: u32) -> String {
        format!(
            "{}collections/{}/datas?page={}&limit={}",
            self.endpoint, self.collection_id, page, self.per_page
        )
    }

    /// URL downloading one file of a record
    pub fn download_url(&self, identifier: &str, sha1: &str) -> String {
        format!(
            "{}data/{}/{}?content-disposition=attachment",
            self.endpoint,
            identifier.replace('/', "%2F"),
            sha1
        )
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(SourceError::ApiError {
            status_code: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CollectionClient for NakalaClient {
    async fn fetch_page(&self, page: u32) -> Result<CollectionPage, SourceError> {
        let response = self
            .client
            .get(self.page_url(page))
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::checked(response).await?;
        response
            .json::<CollectionPage>()
            .await
            .map_err(|e| SourceError::ParseError(e.to_string()))
    }

    async fn download(&self, identifier: &str, sha1: &str) -> Result<Bytes, SourceError> {
        let response = self
            .client
            .get(self.download_url(identifier, sha1))
            .send()
            .await?;

        let response = Self::checked(response).await?;
        Ok(response.bytes().await?)
    }
}

/// What a fetch run did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchReport {
    /// Records having both a transcript and an audio file
    pub records: usize,
    pub tei_downloaded: usize,
    pub tei_skipped: usize,
    pub audio_downloaded: usize,
    pub audio_skipped: usize,
    pub audio_failed: usize,
}

/// A scheduled audio download
#[derive(Debug, Clone)]
struct AudioJob {
    identifier: String,
    file: RemoteFile,
    target: PathBuf,
}

/// Mirrors a collection's transcripts and audio into a local directory
pub struct Fetcher<C: CollectionClient> {
    client: Arc<C>,
    download_dir: PathBuf,
    concurrent_downloads: usize,
    download_audio: bool,
}

impl<C: CollectionClient + 'static> Fetcher<C> {
    pub fn new(client: C, download_dir: impl Into<PathBuf>, config: &SourceConfig) -> Self {
        Self {
            client: Arc::new(client),
            download_dir: download_dir.into(),
            concurrent_downloads: config.concurrent_downloads.max(1),
            download_audio: config.download_audio,
        }
    }

    /// Skip audio downloads regardless of configuration
    pub fn without_audio(mut self) -> Self {
        self.download_audio = false;
        self
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Every record of the collection, following pagination to the last page
    pub async fn list_records(&self) -> Result<Vec<DataRecord>> {
        let mut records = Vec::new();
        let mut page = 1;
        loop {
            let listing = self
                .client
                .fetch_page(page)
                .await
                .with_context(|| format!("Failed to list collection page {}", page))?;
            debug!(
                "Collection page {}/{}: {} records",
                listing.current_page,
                listing.last_page,
                listing.data.len()
            );
            records.extend(listing.data);

            if listing.current_page >= listing.last_page {
                break;
            }
            page += 1;
        }
        Ok(records)
    }

    /// Download transcripts (sequentially) and audio (concurrently), skipping files whose
    /// local SHA-1 already matches
    pub async fn download_all(&self) -> Result<FetchReport> {
        FileManager::ensure_dir(&self.download_dir)?;

        let mut report = FetchReport::default();
        let mut audio_jobs = Vec::new();

        for record in self.list_records().await? {
            let (Some(tei), Some(wav)) = (
                record.file_with_extension("tei"),
                record.file_with_extension("wav"),
            ) else {
                continue;
            };
            report.records += 1;

            let tei_path = self.download_dir.join(&tei.name);
            if FileManager::matches_sha1(&tei_path, &tei.sha1) {
                info!("Found {} with same sha1, skipping", tei_path.display());
                report.tei_skipped += 1;
            } else {
                info!("Downloading {}...", tei.name);
                let content = self
                    .client
                    .download(&record.identifier, &tei.sha1)
                    .await
                    .with_context(|| format!("Failed to download {}", tei.name))?;
                FileManager::write_to_file(&tei_path, &content)?;
                report.tei_downloaded += 1;
            }

            let wav_path = self.download_dir.join(&wav.name);
            if !self.download_audio {
                debug!("Audio disabled, not fetching {}", wav.name);
            } else if FileManager::matches_sha1(&wav_path, &wav.sha1) {
                info!("Found {} with same sha1, skipping", wav_path.display());
                report.audio_skipped += 1;
            } else {
                debug!("Scheduled a download for {}", wav.name);
                audio_jobs.push(AudioJob {
                    identifier: record.identifier.clone(),
                    file: wav.clone(),
                    target: wav_path,
                });
            }
        }
        info!("Found {} records with transcript and audio", report.records);

        if !audio_jobs.is_empty() {
            let (downloaded, failed) = self.download_audio_files(audio_jobs).await;
            report.audio_downloaded = downloaded;
            report.audio_failed = failed;
        }

        Ok(report)
    }

    /// Run audio downloads with bounded concurrency; failures are logged, not fatal
    async fn download_audio_files(&self, jobs: Vec<AudioJob>) -> (usize, usize) {
        info!("Downloading {} audio files", jobs.len());
        let downloaded = Arc::new(AtomicUsize::new(0));
        let failed = Arc::new(AtomicUsize::new(0));

        stream::iter(jobs)
            .map(|job| {
                let client = Arc::clone(&self.client);
                let downloaded = Arc::clone(&downloaded);
                let failed = Arc::clone(&failed);
                async move {
                    info!("Downloading {}...", job.file.name);
                    let result = async {
                        let content = client.download(&job.identifier, &job.file.sha1).await?;
                        tokio::fs::write(&job.target, &content)
                            .await
                            .map_err(|e| anyhow!("Failed to write {}: {}", job.target.display(), e))?;
                        Ok::<_, anyhow::Error>(())
                    }
                    .await;

                    match result {
                        Ok(()) => {
                            info!("Download of {} complete at {}", job.file.name, job.target.display());
                            downloaded.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(e) => {
                            error!("Unable to download {}: {}", job.file.name, e);
                            failed.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrent_downloads)
            .collect::<Vec<()>>()
            .await;

        info!("Finished downloading the audio files");
        (downloaded.load(Ordering::SeqCst), failed.load(Ordering::SeqCst))
    }
}
