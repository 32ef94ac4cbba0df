/*!
 * Corpus entities produced by the conversion engine.
 *
 * All time values are frames (25 per second) on the run-wide time axis.
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

/// Half-open `[start, end)` frame interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameSpan {
    pub start: u64,
    pub end: u64,
}

impl FrameSpan {
    /// Build a span, widening it to one frame when `end <= start`
    pub fn clamped(start: u64, end: u64) -> Self {
        Self {
            start,
            end: end.max(start.saturating_add(1)),
        }
    }

    /// Number of frames covered
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Always false for clamped spans
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A speaker, shared by every utterance it produced during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Agent {
    /// Speaker id from the participant list
    pub id: String,
    /// Free-form speaker metadata
    pub metadata: BTreeMap<String, String>,
}

/// A single annotated word form
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub form: String,
    pub pos: String,
    pub lemma: String,
    /// Extra lemma sub-fields (agreement, conjunction, filler, key)
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
    pub span: FrameSpan,
    /// Raw `from` timeline reference
    #[serde(skip)]
    pub from_ref: String,
    /// Raw `to` timeline reference
    #[serde(skip)]
    pub to_ref: String,
}

/// A multi-word unit grouping contiguous tokens of its utterance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mwu {
    pub form: String,
    pub pos: String,
    /// Positions of the member tokens in the owning utterance, ascending
    pub members: Vec<usize>,
}

impl Mwu {
    /// Frame interval from the first member's start to the last member's end
    pub fn span(&self, tokens: &[Token]) -> Option<FrameSpan> {
        let first = tokens.get(*self.members.first()?)?;
        let last = tokens.get(*self.members.last()?)?;
        Some(FrameSpan::clamped(first.span.start, last.span.end))
    }
}

/// A speech turn
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// Block `xml:id`
    pub xml_id: Option<String>,
    pub agent: Arc<Agent>,
    /// Free-form annotation tag (`ana`)
    pub ana: Option<String>,
    pub span: FrameSpan,
    pub tokens: Vec<Token>,
    pub mwus: Vec<Mwu>,
}

/// One transcribed recording
#[derive(Debug, Clone, PartialEq)]
pub struct Interview {
    /// Source file name
    pub filename: String,
    /// Header metadata, including `name` and `audio`
    pub metadata: BTreeMap<String, String>,
    /// Relative audio path
    pub audio: String,
    pub span: FrameSpan,
    pub utterances: Vec<Utterance>,
}

impl Interview {
    /// Display name (falls back to the file name)
    pub fn name(&self) -> &str {
        self.metadata
            .get("name")
            .map(String::as_str)
            .unwrap_or(&self.filename)
    }

    /// Total number of tokens across utterances
    pub fn token_count(&self) -> usize {
        self.utterances.iter().map(|u| u.tokens.len()).sum()
    }
}
