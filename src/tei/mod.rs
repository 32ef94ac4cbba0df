/*!
 * TEI input handling.
 *
 * - `xml`: lenient element tree with namespace-agnostic lookups
 * - `document`: typed model of the archive's TEI dialect
 */

pub mod xml;
pub mod document;

pub use document::{AnnotationBlock, Header, LayerKind, Marker, Person, Span, SpanGroup, TeiDocument, PLACEHOLDER_TEXT};
