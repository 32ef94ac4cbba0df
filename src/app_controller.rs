use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::conversion::{ConversionSummary, CorpusConverter};
use crate::conversion::engine::TEI_EXTENSION;
use crate::corpus::sink::CorpusSink;
use crate::corpus::writer::JsonCorpusWriter;
use crate::file_utils::FileManager;
use crate::media::MediaStage;
use crate::source::{CollectionClient, FetchReport, Fetcher, NakalaClient};

// @module: Application controller for the download, convert and media pipeline

/// Phases of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Fetch the collection before converting
    pub download: bool,
    /// Convert the downloaded transcripts
    pub convert: bool,
    /// Skip audio downloads and fill the media directory with empty placeholders
    pub dummy_audio: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            download: true,
            convert: true,
            dummy_audio: false,
        }
    }
}

/// What a pipeline run did
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub fetch: Option<FetchReport>,
    pub conversion: Option<ConversionSummary>,
    /// Files placed in the media directory
    pub media_files: usize,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    /// Create a new controller for test purposes with default configuration
    pub fn new_for_test() -> Result<Self> {
        Self::with_config(Config::default())
    }

    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn download_dir(&self) -> &Path {
        self.config.paths.download_dir.as_path()
    }

    pub fn corpus_dir(&self) -> &Path {
        self.config.paths.corpus_dir.as_path()
    }

    /// Run the whole pipeline against the configured Nakala collection
    pub async fn run(&self, options: RunOptions) -> Result<RunReport> {
        if options.download {
            let client = NakalaClient::new(&self.config.source)?;
            self.run_with_client(client, options).await
        } else {
            self.run_local(options)
        }
    }

    /// Run the whole pipeline with an explicit collection client
    pub async fn run_with_client<C>(&self, client: C, options: RunOptions) -> Result<RunReport>
    where
        C: CollectionClient + 'static,
    {
        let start_time = Instant::now();
        let mut report = RunReport::default();

        if options.download {
            let download_dir = self.download_dir().to_path_buf();
            report.fetch = Some(
                self.download_with(client, &download_dir, !options.dummy_audio)
                    .await?,
            );
        }

        let local = self.run_local(RunOptions { download: false, ..options })?;
        report.conversion = local.conversion;
        report.media_files = local.media_files;

        info!("Pipeline completed in {}", Self::format_duration(start_time.elapsed()));
        Ok(report)
    }

    fn run_local(&self, options: RunOptions) -> Result<RunReport> {
        let mut report = RunReport::default();

        if options.convert {
            let input = self.download_dir().to_path_buf();
            let output = self.corpus_dir().to_path_buf();
            report.conversion = Some(self.convert(&input, &output)?);
        }

        if FileManager::dir_exists(self.corpus_dir()) {
            report.media_files = self.prepare_media(options.dummy_audio)?;
        } else {
            warn!(
                "Corpus directory {} does not exist, skipping media",
                self.corpus_dir().display()
            );
        }

        Ok(report)
    }

    /// Mirror the configured collection into `where_to`
    pub async fn download(&self, where_to: &Path, with_audio: bool) -> Result<FetchReport> {
        let client = NakalaClient::new(&self.config.source)?;
        self.download_with(client, where_to, with_audio).await
    }

    /// Mirror a collection into `where_to` through `client`
    pub async fn download_with<C>(&self, client: C, where_to: &Path, with_audio: bool) -> Result<FetchReport>
    where
        C: CollectionClient + 'static,
    {
        let mut fetcher = Fetcher::new(client, where_to, &self.config.source);
        if !with_audio {
            fetcher = fetcher.without_audio();
        }

        let start_time = Instant::now();
        let report = fetcher.download_all().await?;
        info!(
            "Download finished in {}: {} transcripts fetched, {} up to date, {} audio files fetched, {} failed",
            Self::format_duration(start_time.elapsed()),
            report.tei_downloaded,
            report.tei_skipped,
            report.audio_downloaded,
            report.audio_failed
        );
        Ok(report)
    }

    /// Convert every TEI file of `input_dir` into a JSON-lines corpus in `output_dir`
    pub fn convert(&self, input_dir: &Path, output_dir: &Path) -> Result<ConversionSummary> {
        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let start_time = Instant::now();
        let total = FileManager::find_files(input_dir, TEI_EXTENSION)?.len();

        let progress_bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));

        let mut writer = JsonCorpusWriter::create(output_dir)?;
        let mut converter = CorpusConverter::new(self.config.conversion.clone());

        let result = converter.convert_directory(input_dir, &mut writer, |done, total, path| {
            progress_bar.set_length(total as u64);
            progress_bar.set_position(done as u64);
            if let Some(name) = path.file_name() {
                progress_bar.set_message(name.to_string_lossy().to_string());
            }
        });

        if let Err(e) = result {
            progress_bar.abandon_with_message("conversion failed");
            return Err(e);
        }

        writer.finish(&self.config.corpus)?;
        progress_bar.finish_with_message("done");

        let summary = converter.summary();
        info!(
            "Converted {} documents in {}: {} utterances, {} tokens, {} mwus, {} speakers",
            summary.documents,
            Self::format_duration(start_time.elapsed()),
            summary.utterances,
            summary.tokens,
            summary.mwus,
            summary.agents
        );
        Ok(summary)
    }

    /// Fill the corpus media directory, with copies of the downloaded audio or placeholders
    pub fn prepare_media(&self, dummy_audio: bool) -> Result<usize> {
        let stage = MediaStage::new(self.corpus_dir());
        if dummy_audio {
            let references = stage.audio_references()?;
            stage.create_placeholders(&references)
        } else {
            stage.copy_audio(self.download_dir())
        }
    }

    fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
