/*!
 * Boundary between the conversion engine and whatever stores the corpus.
 */

use std::sync::Arc;

use anyhow::Result;

use crate::app_config::CorpusConfig;
use crate::corpus::model::{Agent, Interview};

/// Receives entities as the conversion engine finalizes them
///
/// Calls arrive in this order: `add_agent` once per speaker, before any utterance
/// of that speaker; `finalize_interview` once per document with its complete
/// utterance/token/mwu tree; `finish` once at the end of the run.
pub trait CorpusSink {
    /// Register a speaker the first time it is encountered in the run
    fn add_agent(&mut self, agent: &Arc<Agent>) -> Result<()>;

    /// Materialize a fully built interview
    fn finalize_interview(&mut self, interview: Interview) -> Result<()>;

    /// Flush everything and write the corpus description
    fn finish(&mut self, corpus: &CorpusConfig) -> Result<()>;
}

/// Sink keeping everything in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub agents: Vec<Arc<Agent>>,
    pub interviews: Vec<Interview>,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CorpusSink for MemorySink {
    fn add_agent(&mut self, agent: &Arc<Agent>) -> Result<()> {
        self.agents.push(Arc::clone(agent));
        Ok(())
    }

    fn finalize_interview(&mut self, interview: Interview) -> Result<()> {
        self.interviews.push(interview);
        Ok(())
    }

    fn finish(&mut self, _corpus: &CorpusConfig) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
