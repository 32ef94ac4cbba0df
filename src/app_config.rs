use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Corpus description written to the output config
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Conversion engine settings
    #[serde(default)]
    pub conversion: ConversionConfig,

    /// Remote collection settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Working directories
    #[serde(default)]
    pub paths: PathsConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// How the `[lemma]` layer is read
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LemmaStrategy {
    // @strategy: Whole span text is the lemma
    #[default]
    Plain,
    // @strategy: lemma|agreement|conjunction|filler|key
    Composite,
}

impl LemmaStrategy {
    // @returns: Lowercase strategy identifier
    pub fn to_lowercase_string(&self) -> String {
        match self {
            Self::Plain => "plain".to_string(),
            Self::Composite => "composite".to_string(),
        }
    }
}

impl std::fmt::Display for LemmaStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_lowercase_string())
    }
}

impl std::str::FromStr for LemmaStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "composite" => Ok(Self::Composite),
            _ => Err(anyhow!("Invalid lemma strategy: {}", s)),
        }
    }
}

/// Corpus-level metadata
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Corpus name
    #[serde(default = "default_corpus_name")]
    pub name: String,

    /// Name of the document layer
    #[serde(default = "default_document_layer")]
    pub document_layer: String,

    /// Name of the segment layer
    #[serde(default = "default_segment_layer")]
    pub segment_layer: String,

    /// Free text description
    #[serde(default = "default_description")]
    pub description: String,

    /// Authors, comma separated
    #[serde(default = "default_authors")]
    pub authors: String,

    /// Project URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Release date (YYYY-MM-DD); today when absent
    #[serde(default)]
    pub date: Option<String>,

    /// Example query shown on the platform
    #[serde(default = "default_sample_query")]
    pub sample_query: String,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            name: default_corpus_name(),
            document_layer: default_document_layer(),
            segment_layer: default_segment_layer(),
            description: default_description(),
            authors: default_authors(),
            url: default_url(),
            date: None,
            sample_query: default_sample_query(),
        }
    }
}

impl CorpusConfig {
    /// Release date, falling back to today's date
    pub fn effective_date(&self) -> String {
        match &self.date {
            Some(date) if !date.trim().is_empty() => date.clone(),
            _ => chrono::Local::now().format("%Y-%m-%d").to_string(),
        }
    }
}

/// Conversion engine configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ConversionConfig {
    /// Rewrites the extension of each interview's audio reference (e.g. "mp3")
    #[serde(default)]
    pub audio_format: Option<String>,

    /// Lemma layer parsing
    #[serde(default)]
    pub lemma_strategy: LemmaStrategy,
}

impl ConversionConfig {
    /// Audio override with blanks treated as unset
    pub fn audio_format(&self) -> Option<&str> {
        self.audio_format
            .as_deref()
            .map(str::trim)
            .filter(|format| !format.is_empty())
    }
}

/// Remote collection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SourceConfig {
    /// API base URL
    #[serde(default = "default_api_endpoint")]
    pub endpoint: String,

    /// Collection identifier (DOI, already URL-encoded)
    #[serde(default = "default_collection_id")]
    pub collection_id: String,

    /// Records requested per page
    #[serde(default = "default_per_page")]
    pub per_page: usize,

    /// Maximum number of audio downloads in flight
    #[serde(default = "default_concurrent_downloads")]
    pub concurrent_downloads: usize,

    /// Whether audio files are fetched at all
    #[serde(default = "default_true")]
    pub download_audio: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_api_endpoint(),
            collection_id: default_collection_id(),
            per_page: default_per_page(),
            concurrent_downloads: default_concurrent_downloads(),
            download_audio: true,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Working directories
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathsConfig {
    /// Where TEI and audio files are downloaded
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Where the corpus is written
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            corpus_dir: default_corpus_dir(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching filter for the `log` facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_corpus_name() -> String {
    "OFROM".to_string()
}

fn default_document_layer() -> String {
    "Interview".to_string()
}

fn default_segment_layer() -> String {
    "Utterance".to_string()
}

fn default_description() -> String {
    "Le corpus Oral de Français de Suisse Romande. Université de Neuchâtel".to_string()
}

fn default_authors() -> String {
    "Avanzi Mathieu, Béguelin Marie-José, Corminboeuf Gilles, Diémoz Federica, Johnsen Laure Anne"
        .to_string()
}

fn default_url() -> String {
    "https://ofrom.unine.ch/".to_string()
}

fn default_sample_query() -> String {
    r#"# Find all the utterances...
Utterance u
    # ... by a speaker from Berne
    agent.region = "Berne"
    # ... that last at least 1s
    end(u) > start(u) + 1

# Look for sequences of tokens in that utterance...
sequence@u seq
    # ... that contain a token whose pos is 'CON' or 'PRO'
    Token
        pos = /CON|PRO/
    # ... followed by a token whose form is "euh"
    Token
        form = "euh"

# Display the sequences within their segment
results => plain
    context
        u
    entities
        seq"#
        .to_string()
}

fn default_api_endpoint() -> String {
    "https://api.nakala.fr/".to_string()
}

fn default_collection_id() -> String {
    "10.34847%2Fnkl.ebcdd191".to_string()
}

fn default_per_page() -> usize {
    50
}

fn default_concurrent_downloads() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    300 // audio files are large
}

fn default_true() -> bool {
    true
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("download")
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("corpus")
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;

        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let config_json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, config_json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.corpus.name.trim().is_empty() {
            return Err(anyhow!("Corpus name must not be empty"));
        }

        if self.source.collection_id.trim().is_empty() {
            return Err(anyhow!("Source collection id must not be empty"));
        }

        if self.source.per_page == 0 {
            return Err(anyhow!("Source page size must be greater than 0"));
        }

        if self.source.concurrent_downloads == 0 {
            return Err(anyhow!("Concurrent downloads must be greater than 0"));
        }

        if let Some(format) = self.conversion.audio_format() {
            if format.contains(['.', '/', '\\']) {
                return Err(anyhow!(
                    "Audio format must be a bare extension such as 'mp3', got '{}'",
                    format
                ));
            }
        }

        Ok(())
    }
}
