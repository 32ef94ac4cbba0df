/*!
 * Corpus output.
 *
 * - `model`: interview / utterance / token / mwu / agent entities
 * - `sink`: the `CorpusSink` boundary and an in-memory implementation
 * - `writer`: JSON-lines writer producing a corpus directory
 */

pub mod model;
pub mod sink;
pub mod writer;

pub use model::{Agent, FrameSpan, Interview, Mwu, Token, Utterance};
pub use sink::{CorpusSink, MemorySink};
pub use writer::JsonCorpusWriter;
