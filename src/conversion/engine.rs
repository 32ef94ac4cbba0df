/*!
 * Document and corpus conversion.
 *
 * `convert_document` turns one parsed TEI document into an interview. It receives the
 * running [`Timeline`] and the [`AgentRegistry`] explicitly and hands back the
 * timeline for the next document, so documents must be converted one after the
 * other, in a stable order.
 */

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use log::{info, warn};

use crate::app_config::ConversionConfig;
use crate::conversion::agents::AgentRegistry;
use crate::conversion::metadata;
use crate::conversion::timeline::Timeline;
use crate::conversion::utterance::build_utterance;
use crate::corpus::model::{Agent, FrameSpan, Interview};
use crate::corpus::sink::CorpusSink;
use crate::errors::ConversionError;
use crate::file_utils::FileManager;
use crate::tei::TeiDocument;

/// Extension of the transcript files
pub const TEI_EXTENSION: &str = "tei";

/// Where a document comes from
#[derive(Debug, Clone, Copy)]
pub struct DocumentContext<'a> {
    /// File name recorded on the interview
    pub filename: &'a str,
    /// Directory holding the document and, normally, its audio
    pub source_dir: Option<&'a Path>,
}

/// Result of converting one document
#[derive(Debug)]
pub struct ConvertedDocument {
    pub interview: Interview,
    /// Agents first seen in this document
    pub new_agents: Vec<Arc<Agent>>,
    /// Timeline for the next document
    pub next: Timeline,
}

/// Convert one document on the run's shared time axis
pub fn convert_document(
    document: &TeiDocument,
    context: &DocumentContext<'_>,
    timeline: Timeline,
    registry: &mut AgentRegistry,
    options: &ConversionConfig,
) -> Result<ConvertedDocument, ConversionError> {
    let metadata = metadata::extract(
        &document.header,
        context.filename,
        context.source_dir,
        options.audio_format(),
    );

    let new_agents = registry.register_persons(&document.persons);
    let frames = timeline.resolve(&document.timeline)?;

    let end = frames.get(&document.end_marker)?;
    let span = FrameSpan::clamped(timeline.offset(), end);

    let mut utterances = Vec::new();
    for block in &document.blocks {
        if let Some(utterance) = build_utterance(block, &frames, registry, options.lemma_strategy)? {
            utterances.push(utterance);
        }
    }

    let interview = Interview {
        filename: context.filename.to_string(),
        metadata: metadata.fields,
        audio: metadata.audio,
        span,
        utterances,
    };

    Ok(ConvertedDocument {
        interview,
        new_agents,
        next: timeline.advance_past(span.end),
    })
}

/// Totals of a conversion run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    pub documents: usize,
    pub utterances: usize,
    pub tokens: usize,
    pub mwus: usize,
    pub agents: usize,
    /// Frame after the last interview
    pub end_frame: u64,
}

/// Converts a sequence of documents into one corpus
pub struct CorpusConverter {
    options: ConversionConfig,
    registry: AgentRegistry,
    timeline: Timeline,
    summary: ConversionSummary,
}

impl CorpusConverter {
    pub fn new(options: ConversionConfig) -> Self {
        Self {
            options,
            registry: AgentRegistry::new(),
            timeline: Timeline::new(),
            summary: ConversionSummary::default(),
        }
    }

    /// Running timeline (start of the next document)
    pub fn timeline(&self) -> Timeline {
        self.timeline
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn summary(&self) -> ConversionSummary {
        self.summary
    }

    /// Convert an in-memory document and hand the result to `sink`
    pub fn convert_str<S: CorpusSink>(
        &mut self,
        xml: &str,
        context: &DocumentContext<'_>,
        sink: &mut S,
    ) -> Result<()> {
        let document = TeiDocument::parse(xml)?;
        if document.recovered {
            warn!("{} is not well-formed, converting what could be read", context.filename);
        }

        let converted = convert_document(
            &document,
            context,
            self.timeline,
            &mut self.registry,
            &self.options,
        )?;

        for agent in &converted.new_agents {
            sink.add_agent(agent)?;
        }

        let interview = converted.interview;
        self.summary.documents += 1;
        self.summary.agents += converted.new_agents.len();
        self.summary.utterances += interview.utterances.len();
        self.summary.tokens += interview.token_count();
        self.summary.mwus += interview.utterances.iter().map(|u| u.mwus.len()).sum::<usize>();
        self.summary.end_frame = interview.span.end;

        sink.finalize_interview(interview)?;
        self.timeline = converted.next;
        Ok(())
    }

    /// Convert one TEI file
    pub fn convert_file<S: CorpusSink>(&mut self, path: &Path, sink: &mut S) -> Result<()> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("Not a file path: {:?}", path))?;

        info!("Processing {}", path.display());
        let xml = FileManager::read_to_string_lossy(path)?;
        let context = DocumentContext {
            filename: &filename,
            source_dir: path.parent(),
        };

        self.convert_str(&xml, &context, sink)
            .with_context(|| format!("Failed to convert {}", path.display()))
    }

    /// Convert every `.tei` file of `input_dir` in file name order
    ///
    /// The first failing document aborts the run. `progress` is called after each
    /// document with the number of documents done and the total.
    pub fn convert_directory<S, F>(
        &mut self,
        input_dir: &Path,
        sink: &mut S,
        mut progress: F,
    ) -> Result<Vec<PathBuf>>
    where
        S: CorpusSink,
        F: FnMut(usize, usize, &Path),
    {
        if !FileManager::dir_exists(input_dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let files = FileManager::find_files(input_dir, TEI_EXTENSION)?;
        if files.is_empty() {
            warn!("No .{} files found in {}", TEI_EXTENSION, input_dir.display());
        }

        let total = files.len();
        for (done, file) in files.iter().enumerate() {
            self.convert_file(file, sink)?;
            progress(done + 1, total, file);
        }

        Ok(files)
    }
}
