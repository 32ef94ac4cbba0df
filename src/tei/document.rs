/*!
 * Typed view of an oral-corpus TEI document.
 *
 * The raw element tree is read once into plain structs; everything downstream works
 * on these types and never touches XML again.
 */

use std::fmt;

use crate::errors::ConversionError;
use crate::tei::xml::{self, Element};

/// Placeholder text the archive uses for turns without transcription
pub const PLACEHOLDER_TEXT: &str = "_";

/// A `<when>` entry of the timeline
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    /// `xml:id` without the leading `#`
    pub id: String,
    /// Raw `interval` attribute (milliseconds); `None` when absent
    pub interval: Option<String>,
}

/// A `<person>` of the participant list
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    /// Speaker id (`altGrp/alt/@type`)
    pub id: String,
    /// `noteGrp/note` pairs (`type`, text) in document order
    pub notes: Vec<(String, String)>,
}

/// One `<span>` of a span layer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Span {
    /// Span text, empty when absent
    pub text: String,
    /// Raw `from` reference, e.g. `#T12`
    pub from: String,
    /// Raw `to` reference
    pub to: String,
}

/// Named span layers of the archive's annotation scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    TokenForm,
    TokenPos,
    Lemma,
    MwuForm,
    MwuPos,
}

impl LayerKind {
    /// Suffix appended to the speaker id in `spanGrp/@type`
    pub fn suffix(&self) -> &'static str {
        match self {
            LayerKind::TokenForm => "[tok_min]",
            LayerKind::TokenPos => "[pos_min]",
            LayerKind::Lemma => "[lemma]",
            LayerKind::MwuForm => "[tok_mwu]",
            LayerKind::MwuPos => "[pos_mwu]",
        }
    }

    /// Full `spanGrp/@type` value for a speaker
    pub fn layer_name(&self, speaker: &str) -> String {
        format!("{}{}", speaker, self.suffix())
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// A `<spanGrp>` and its spans
#[derive(Debug, Clone, PartialEq)]
pub struct SpanGroup {
    /// `type` attribute, e.g. `SPK1[tok_min]`
    pub kind: String,
    /// Spans in document order
    pub spans: Vec<Span>,
}

/// An `<annotationBlock>`: one speech turn with its annotation layers
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationBlock {
    /// `xml:id`
    pub id: Option<String>,
    /// Speaker id (`who`)
    pub who: String,
    /// Raw `start` reference
    pub start: String,
    /// Raw `end` reference
    pub end: String,
    /// Free-form `ana` tag
    pub ana: Option<String>,
    /// `u/seg` text
    pub text: String,
    /// All span groups of the block
    pub span_groups: Vec<SpanGroup>,
}

impl AnnotationBlock {
    /// Whether the block only carries the placeholder text
    pub fn is_placeholder(&self) -> bool {
        self.text == PLACEHOLDER_TEXT
    }

    /// Spans of a speaker's layer; empty when the layer is absent
    ///
    /// Several groups with the same type are concatenated in document order.
    pub fn layer(&self, speaker: &str, kind: LayerKind) -> Vec<&Span> {
        let name = kind.layer_name(speaker);
        self.span_groups
            .iter()
            .filter(|group| group.kind == name)
            .flat_map(|group| group.spans.iter())
            .collect()
    }
}

/// Header fields of a document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Header {
    /// `note[@type='METADATA']/note` pairs (`type`, text), unprocessed
    pub notes: Vec<(String, String)>,
    /// `title/desc` text when present
    pub title: Option<String>,
    /// `media/@url`
    pub media_url: String,
}

/// A whole interview transcript
#[derive(Debug, Clone, PartialEq)]
pub struct TeiDocument {
    pub header: Header,
    pub persons: Vec<Person>,
    pub timeline: Vec<Marker>,
    /// Raw reference of the marker closing the recording
    pub end_marker: String,
    pub blocks: Vec<AnnotationBlock>,
    /// Whether the XML reader had to stop early
    pub recovered: bool,
}

fn read_header(root: &Element) -> Result<Header, ConversionError> {
    let header = root.require(&["teiHeader"])?;

    let mut notes = Vec::new();
    for group in header.find_all(&["note"]) {
        if group.attr("type") != Some("METADATA") {
            continue;
        }
        for note in group.children_named("note") {
            notes.push((
                note.attr("type").unwrap_or_default().to_string(),
                note.text.clone(),
            ));
        }
    }

    let title = header
        .find(&["title", "desc"])
        .and_then(Element::text)
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string);

    let media_url = header
        .require(&["media"])?
        .attr("url")
        .unwrap_or_default()
        .to_string();

    Ok(Header {
        notes,
        title,
        media_url,
    })
}

fn read_persons(root: &Element) -> Result<Vec<Person>, ConversionError> {
    root.find_all(&["listPerson", "person"])
        .into_iter()
        .map(|person| {
            let id = person.require(&["altGrp", "alt"])?.require_attr("type")?;
            let notes = person
                .find_all(&["noteGrp", "note"])
                .into_iter()
                .map(|note| {
                    (
                        note.attr("type").unwrap_or_default().to_string(),
                        note.text.clone(),
                    )
                })
                .collect();
            Ok(Person {
                id: id.to_string(),
                notes,
            })
        })
        .collect()
}

fn read_timeline(root: &Element) -> Vec<Marker> {
    root.find_all(&["timeline", "when"])
        .into_iter()
        .map(|when| Marker {
            id: when.attr("id").unwrap_or_default().to_string(),
            interval: when.attr("interval").map(str::to_string),
        })
        .collect()
}

fn read_end_marker(root: &Element) -> Result<String, ConversionError> {
    root.find_all(&["body", "div", "head", "note"])
        .into_iter()
        .find(|note| note.attr("type") == Some("end"))
        .map(|note| note.text.trim().to_string())
        .ok_or_else(|| ConversionError::MissingElement {
            element: "body/div/head/note[@type='end']".to_string(),
            context: "<TEI>".to_string(),
        })
}

fn read_span_group(group: &Element) -> SpanGroup {
    SpanGroup {
        kind: group.attr("type").unwrap_or_default().to_string(),
        spans: group
            .children_named("span")
            .map(|span| Span {
                text: span.text.clone(),
                from: span.attr("from").unwrap_or_default().to_string(),
                to: span.attr("to").unwrap_or_default().to_string(),
            })
            .collect(),
    }
}

fn read_block(block: &Element) -> Result<AnnotationBlock, ConversionError> {
    let text = block.require(&["u", "seg"])?.text.clone();

    Ok(AnnotationBlock {
        id: block.attr("id").map(str::to_string),
        who: block.attr("who").unwrap_or_default().to_string(),
        start: block.attr("start").unwrap_or_default().to_string(),
        end: block.attr("end").unwrap_or_default().to_string(),
        ana: block.attr("ana").map(str::to_string),
        text,
        span_groups: block
            .find_all(&["spanGrp"])
            .into_iter()
            .map(read_span_group)
            .collect(),
    })
}

impl TeiDocument {
    /// Read a document from XML text
    pub fn parse(input: &str) -> Result<Self, ConversionError> {
        let parsed = xml::parse(input);
        let mut document = Self::from_element(&parsed.root)?;
        document.recovered = parsed.recovered;
        Ok(document)
    }

    /// Read a document from an already parsed element tree
    pub fn from_element(root: &Element) -> Result<Self, ConversionError> {
        let header = read_header(root)?;
        let persons = read_persons(root)?;
        let timeline = read_timeline(root);
        let end_marker = read_end_marker(root)?;
        let blocks = root
            .find_all(&["body", "div", "annotationBlock"])
            .into_iter()
            .map(read_block)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            header,
            persons,
            timeline,
            end_marker,
            blocks,
            recovered: false,
        })
    }
}
