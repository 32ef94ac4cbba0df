/*!
 * TEI-to-corpus conversion engine.
 *
 * - `timeline`: milliseconds to frames on the run-wide axis
 * - `agents`: speaker registry shared across documents
 * - `metadata`: header fields and audio reference
 * - `tokens`: parallel layer alignment into tokens
 * - `mwu`: multi-word unit grouping
 * - `utterance`: one annotation block to one utterance
 * - `engine`: document and directory conversion
 */

pub mod timeline;
pub mod agents;
pub mod metadata;
pub mod tokens;
pub mod mwu;
pub mod utterance;
pub mod engine;

pub use agents::AgentRegistry;
pub use engine::{convert_document, ConversionSummary, ConvertedDocument, CorpusConverter, DocumentContext};
pub use timeline::{FrameMap, Timeline, FRAMES_PER_SECOND};
pub use tokens::TokenTable;
