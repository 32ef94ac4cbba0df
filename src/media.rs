use std::io::{BufRead, BufReader};
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Deserialize;

use crate::corpus::writer::INTERVIEWS_FILE;
use crate::file_utils::FileManager;

// @module: Media directory of the converted corpus

/// Name of the media directory inside the corpus directory
pub const MEDIA_DIR: &str = "media";

/// Extension of the audio files copied from the download directory
pub const AUDIO_EXTENSION: &str = "wav";

#[derive(Deserialize)]
struct InterviewAudio {
    #[serde(default)]
    audio: String,
}

/// Fills `<corpus>/media` with the interviews' audio
pub struct MediaStage {
    corpus_dir: PathBuf,
}

impl MediaStage {
    pub fn new<P: AsRef<Path>>(corpus_dir: P) -> Self {
        Self {
            corpus_dir: corpus_dir.as_ref().to_path_buf(),
        }
    }

    pub fn media_dir(&self) -> PathBuf {
        self.corpus_dir.join(MEDIA_DIR)
    }

    /// Copy every audio file of `download_dir` into a fresh media directory
    pub fn copy_audio(&self, download_dir: &Path) -> Result<usize> {
        let media_dir = self.media_dir();
        FileManager::recreate_dir(&media_dir)?;

        if !FileManager::dir_exists(download_dir) {
            warn!("Download directory {} does not exist, no audio copied", download_dir.display());
            return Ok(0);
        }

        let files = FileManager::find_files(download_dir, AUDIO_EXTENSION)?;
        for file in &files {
            if let Some(name) = file.file_name() {
                FileManager::copy_file(file, media_dir.join(name))?;
            }
        }

        info!("Copied {} audio files to {}", files.len(), media_dir.display());
        Ok(files.len())
    }

    /// Create an empty placeholder in a fresh media directory for each audio reference
    pub fn create_placeholders<S: AsRef<str>>(&self, references: &[S]) -> Result<usize> {
        let media_dir = self.media_dir();
        FileManager::recreate_dir(&media_dir)?;

        let mut created = 0;
        for reference in references {
            let Some(name) = placeholder_name(reference.as_ref()) else {
                debug!("Interview without audio reference, no placeholder");
                continue;
            };
            FileManager::touch(media_dir.join(name))?;
            created += 1;
        }

        info!("Created {} placeholder audio files in {}", created, media_dir.display());
        Ok(created)
    }

    /// Audio references of the interviews already written to the corpus directory
    pub fn audio_references(&self) -> Result<Vec<String>> {
        let path = self.corpus_dir.join(INTERVIEWS_FILE);
        let file = File::open(&path)
            .with_context(|| format!("Failed to open {}", path.display()))?;

        let mut references = Vec::new();
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: InterviewAudio = serde_json::from_str(&line)
                .with_context(|| format!("Invalid interview record at {}:{}", path.display(), n + 1))?;
            references.push(record.audio);
        }
        Ok(references)
    }
}

/// File name of the placeholder for an audio reference, ignoring any directory part
fn placeholder_name(reference: &str) -> Option<&str> {
    let name = reference.rsplit(['/', '\\']).next().unwrap_or(reference).trim();
    if name.is_empty() { None } else { Some(name) }
}
