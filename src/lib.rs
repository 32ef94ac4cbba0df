/*!
 * # tei2lcp - TEI oral corpus to LCP converter
 *
 * A Rust library that turns TEI-encoded oral transcripts into a time-aligned corpus
 * of interviews, utterances, tokens and multi-word units.
 *
 * ## Features
 *
 * - Lenient TEI parsing (timeline, speakers, annotation blocks, span layers)
 * - Conversion of every document onto one run-wide frame axis (25 frames per second)
 * - Speakers shared across documents
 * - Token alignment over parallel form, part-of-speech and lemma layers
 * - Multi-word unit grouping
 * - JSON-lines corpus output with a corpus description
 * - Mirroring of a Nakala collection, with SHA-1 based skipping
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `tei`: TEI document reading:
 *   - `tei::xml`: Lenient XML tree
 *   - `tei::document`: Typed view of a transcript
 * - `conversion`: Corpus conversion engine:
 *   - `conversion::timeline`: Millisecond markers to frames
 *   - `conversion::agents`: Speaker registry
 *   - `conversion::metadata`: Header metadata
 *   - `conversion::tokens`: Token alignment
 *   - `conversion::mwu`: Multi-word units
 *   - `conversion::utterance`: Utterance construction
 *   - `conversion::engine`: Document and directory conversion
 * - `corpus`: Corpus model and output sinks
 * - `source`: Remote collection download (`source::nakala`)
 * - `media`: Corpus media directory
 * - `file_utils`: File system operations
 * - `app_controller`: Download, convert and media pipeline
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod tei;
pub mod conversion;
pub mod corpus;
pub mod source;
pub mod media;
pub mod app_controller;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use conversion::{convert_document, AgentRegistry, CorpusConverter, Timeline};
pub use corpus::{Agent, Interview, Mwu, Token, Utterance};
pub use tei::TeiDocument;
pub use errors::{AppError, ConversionError, SourceError};
