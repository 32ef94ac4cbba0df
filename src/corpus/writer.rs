/*!
 * JSON-lines corpus writer.
 *
 * Every layer goes to its own `<layer>.jsonl` file inside the output directory, one
 * record per line. Records carry run-local numeric ids so children can point at their
 * parents: tokens and mwus reference their utterance, utterances reference their
 * interview and agent, mwus list their member token ids. `finish` writes `config.json`
 * describing the corpus and its layers.
 */

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Serialize;
use serde_json::json;

use crate::app_config::CorpusConfig;
use crate::corpus::model::{Agent, FrameSpan, Interview};
use crate::corpus::sink::CorpusSink;
use crate::file_utils::FileManager;

pub const AGENTS_FILE: &str = "agents.jsonl";
pub const INTERVIEWS_FILE: &str = "interviews.jsonl";
pub const UTTERANCES_FILE: &str = "utterances.jsonl";
pub const TOKENS_FILE: &str = "tokens.jsonl";
pub const MWUS_FILE: &str = "mwus.jsonl";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Serialize)]
struct AgentRecord<'a> {
    id: usize,
    speaker: &'a str,
    metadata: &'a BTreeMap<String, String>,
}

#[derive(Serialize)]
struct InterviewRecord<'a> {
    id: usize,
    filename: &'a str,
    name: &'a str,
    audio: &'a str,
    metadata: &'a BTreeMap<String, String>,
    span: FrameSpan,
}

#[derive(Serialize)]
struct UtteranceRecord<'a> {
    id: usize,
    interview: usize,
    agent: usize,
    text: &'a str,
    xml_id: Option<&'a str>,
    ana: Option<&'a str>,
    span: FrameSpan,
}

#[derive(Serialize)]
struct TokenRecord<'a> {
    id: usize,
    utterance: usize,
    form: &'a str,
    pos: &'a str,
    lemma: &'a str,
    #[serde(skip_serializing_if = "no_extras")]
    extras: &'a BTreeMap<String, String>,
    span: FrameSpan,
}

fn no_extras(extras: &&BTreeMap<String, String>) -> bool {
    extras.is_empty()
}

#[derive(Serialize)]
struct MwuRecord<'a> {
    id: usize,
    utterance: usize,
    form: &'a str,
    pos: &'a str,
    tokens: Vec<usize>,
    span: Option<FrameSpan>,
}

/// Counts of records written so far
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriterStats {
    pub agents: usize,
    pub interviews: usize,
    pub utterances: usize,
    pub tokens: usize,
    pub mwus: usize,
}

/// Streams corpus layers to JSON-lines files
pub struct JsonCorpusWriter {
    output_dir: PathBuf,
    agents: BufWriter<File>,
    interviews: BufWriter<File>,
    utterances: BufWriter<File>,
    tokens: BufWriter<File>,
    mwus: BufWriter<File>,
    // speaker id -> record id
    agent_ids: HashMap<String, usize>,
    stats: WriterStats,
}

fn create_layer(dir: &Path, name: &str) -> Result<BufWriter<File>> {
    let path = dir.join(name);
    let file = File::create(&path)
        .with_context(|| format!("Failed to create corpus file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_line<T: Serialize>(out: &mut BufWriter<File>, record: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, record).context("Failed to serialize corpus record")?;
    out.write_all(b"\n")?;
    Ok(())
}

impl JsonCorpusWriter {
    /// Create the writer, wiping any previous content of `output_dir`
    pub fn create<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        FileManager::recreate_dir(&output_dir)?;

        Ok(Self {
            agents: create_layer(&output_dir, AGENTS_FILE)?,
            interviews: create_layer(&output_dir, INTERVIEWS_FILE)?,
            utterances: create_layer(&output_dir, UTTERANCES_FILE)?,
            tokens: create_layer(&output_dir, TOKENS_FILE)?,
            mwus: create_layer(&output_dir, MWUS_FILE)?,
            output_dir,
            agent_ids: HashMap::new(),
            stats: WriterStats::default(),
        })
    }

    /// Directory receiving the corpus
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    fn agent_id(&self, agent: &Agent) -> Result<usize> {
        self.agent_ids
            .get(&agent.id)
            .copied()
            .with_context(|| format!("Agent '{}' was not registered with the writer", agent.id))
    }

    fn corpus_description(&self, corpus: &CorpusConfig) -> serde_json::Value {
        let document = &corpus.document_layer;
        let segment = &corpus.segment_layer;

        let mut layers = serde_json::Map::new();
        layers.insert(
            document.clone(),
            json!({ "layerType": "span", "contains": segment, "attributes": { "name": { "type": "text" }, "audio": { "type": "media" } } }),
        );
        layers.insert(
            segment.clone(),
            json!({ "layerType": "span", "contains": "Token", "attributes": { "text": { "type": "text" }, "agent": { "ref": "agent" } } }),
        );
        layers.insert(
            "Token".to_string(),
            json!({ "layerType": "unit", "anchoring": { "time": true }, "attributes": { "form": { "type": "text" }, "pos": { "type": "categorical" }, "lemma": { "type": "text" } } }),
        );
        layers.insert(
            "Mwu".to_string(),
            json!({ "layerType": "span", "contains": "Token", "attributes": { "form": { "type": "text" }, "pos": { "type": "categorical" } } }),
        );

        let mut track_layers = serde_json::Map::new();
        track_layers.insert(segment.clone(), json!({ "split": ["agent"] }));

        json!({
            "meta": {
                "name": corpus.name,
                "authors": corpus.authors,
                "date": corpus.effective_date(),
                "url": corpus.url,
                "corpusDescription": corpus.description,
                "sample_query": corpus.sample_query,
            },
            "firstClass": {
                "document": document,
                "segment": segment,
                "token": "Token",
            },
            "layer": layers,
            "globalAttributes": { "agent": { "file": AGENTS_FILE } },
            "tracks": {
                "layers": track_layers,
                "group_by": ["agent"],
            },
            "counts": {
                "agents": self.stats.agents,
                "interviews": self.stats.interviews,
                "utterances": self.stats.utterances,
                "tokens": self.stats.tokens,
                "mwus": self.stats.mwus,
            },
        })
    }
}

impl CorpusSink for JsonCorpusWriter {
    fn add_agent(&mut self, agent: &Arc<Agent>) -> Result<()> {
        if self.agent_ids.contains_key(&agent.id) {
            return Ok(());
        }
        let id = self.stats.agents;
        write_line(
            &mut self.agents,
            &AgentRecord {
                id,
                speaker: &agent.id,
                metadata: &agent.metadata,
            },
        )?;
        self.agent_ids.insert(agent.id.clone(), id);
        self.stats.agents += 1;
        Ok(())
    }

    fn finalize_interview(&mut self, interview: Interview) -> Result<()> {
        let interview_id = self.stats.interviews;
        write_line(
            &mut self.interviews,
            &InterviewRecord {
                id: interview_id,
                filename: &interview.filename,
                name: interview.name(),
                audio: &interview.audio,
                metadata: &interview.metadata,
                span: interview.span,
            },
        )?;
        self.stats.interviews += 1;

        for utterance in &interview.utterances {
            let utterance_id = self.stats.utterances;
            let agent = self.agent_id(&utterance.agent)?;
            write_line(
                &mut self.utterances,
                &UtteranceRecord {
                    id: utterance_id,
                    interview: interview_id,
                    agent,
                    text: &utterance.text,
                    xml_id: utterance.xml_id.as_deref(),
                    ana: utterance.ana.as_deref(),
                    span: utterance.span,
                },
            )?;
            self.stats.utterances += 1;

            let first_token_id = self.stats.tokens;
            for token in &utterance.tokens {
                write_line(
                    &mut self.tokens,
                    &TokenRecord {
                        id: self.stats.tokens,
                        utterance: utterance_id,
                        form: &token.form,
                        pos: &token.pos,
                        lemma: &token.lemma,
                        extras: &token.extras,
                        span: token.span,
                    },
                )?;
                self.stats.tokens += 1;
            }

            for mwu in &utterance.mwus {
                write_line(
                    &mut self.mwus,
                    &MwuRecord {
                        id: self.stats.mwus,
                        utterance: utterance_id,
                        form: &mwu.form,
                        pos: &mwu.pos,
                        tokens: mwu.members.iter().map(|m| first_token_id + m).collect(),
                        span: mwu.span(&utterance.tokens),
                    },
                )?;
                self.stats.mwus += 1;
            }
        }

        debug!(
            "Wrote interview '{}' ({} utterances)",
            interview.name(),
            interview.utterances.len()
        );
        Ok(())
    }

    fn finish(&mut self, corpus: &CorpusConfig) -> Result<()> {
        for layer in [
            &mut self.agents,
            &mut self.interviews,
            &mut self.utterances,
            &mut self.tokens,
            &mut self.mwus,
        ] {
            layer.flush().context("Failed to flush corpus file")?;
        }

        let description = self.corpus_description(corpus);
        let config_path = self.output_dir.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(&description)
            .context("Failed to serialize corpus config")?;
        FileManager::write_to_file(&config_path, content.as_bytes())?;

        info!(
            "Corpus written to {} ({} interviews, {} utterances, {} tokens, {} mwus)",
            self.output_dir.display(),
            self.stats.interviews,
            self.stats.utterances,
            self.stats.tokens,
            self.stats.mwus
        );
        Ok(())
    }
}
