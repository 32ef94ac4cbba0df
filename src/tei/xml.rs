/*!
 * Lenient XML element tree.
 *
 * Source documents come from an archive whose exports are not always well formed:
 * mismatched end tags are reconciled against the open element stack, stray end tags
 * are dropped, and a hard syntax error stops reading while keeping everything parsed
 * so far. Element and attribute names are matched by local name, so `tei:u` answers
 * to `u` and `xml:id` answers to `id`.
 */

use log::warn;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::ConversionError;

/// One element with its attributes, direct text and child elements
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Local name (namespace prefix removed)
    pub name: String,

    /// Attributes as written, in document order
    pub attributes: Vec<(String, String)>,

    /// Concatenated text nodes that are direct children of this element
    pub text: String,

    /// Child elements in document order
    pub children: Vec<Element>,
}

/// Outcome of reading a document
#[derive(Debug)]
pub struct ParsedXml {
    /// Synthetic container holding the top-level elements
    pub root: Element,

    /// Whether the reader had to give up before the end of the input
    pub recovered: bool,
}

fn local_part(name: &str) -> &str {
    match name.rfind(':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

fn open_element(start: &BytesStart<'_>) -> Element {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    let mut attrs = start.attributes();
    attrs.with_checks(false);
    for attr in attrs.flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attributes.push((key, value));
    }

    Element {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    }
}

/// Attach `element` to whatever is on top of the stack
fn close_into(stack: &mut [Element], element: Element) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    }
}

/// Parse `input` into an element tree, recovering from malformed markup
pub fn parse(input: &str) -> ParsedXml {
    let mut reader = Reader::from_str(input);
    reader.config_mut().check_end_names = false;
    reader.config_mut().trim_text(false);

    // stack[0] is the synthetic document root
    let mut stack = vec![Element::default()];
    let mut recovered = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(open_element(&start));
            }
            Ok(Event::Empty(start)) => {
                let element = open_element(&start);
                close_into(&mut stack, element);
            }
            Ok(Event::End(end)) => {
                let name = String::from_utf8_lossy(end.local_name().as_ref()).into_owned();
                // Only unwind when the element is actually open; stray end tags are ignored
                if stack.iter().skip(1).any(|element| element.name == name) {
                    while stack.len() > 1 {
                        let Some(element) = stack.pop() else { break };
                        let matched = element.name == name;
                        close_into(&mut stack, element);
                        if matched {
                            break;
                        }
                    }
                }
            }
            Ok(Event::Text(text)) => {
                let content = match text.unescape() {
                    Ok(content) => content.into_owned(),
                    Err(_) => String::from_utf8_lossy(&text).into_owned(),
                };
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&content);
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(
                    "Malformed XML at byte {}: {} (keeping the partially read document)",
                    reader.buffer_position(),
                    e
                );
                recovered = true;
                break;
            }
        }
    }

    // Close anything left open at end of input
    while stack.len() > 1 {
        if let Some(element) = stack.pop() {
            close_into(&mut stack, element);
        }
    }

    ParsedXml {
        root: stack.pop().unwrap_or_default(),
        recovered,
    }
}

impl Element {
    /// Attribute value by local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .or_else(|| self.attributes.iter().find(|(key, _)| local_part(key) == name))
            .map(|(_, value)| value.as_str())
    }

    /// Attribute value that must be present
    pub fn require_attr(&self, name: &str) -> Result<&str, ConversionError> {
        self.attr(name).ok_or_else(|| ConversionError::MissingAttribute {
            attribute: name.to_string(),
            element: self.name.clone(),
        })
    }

    /// Direct text, `None` when empty
    pub fn text(&self) -> Option<&str> {
        if self.text.is_empty() {
            None
        } else {
            Some(self.text.as_str())
        }
    }

    /// Child elements with the given local name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// All descendants in document order (pre-order), excluding `self`
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        fn walk<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
            for child in &element.children {
                out.push(child);
                walk(child, out);
            }
        }
        walk(self, &mut out);
        out
    }

    /// Elements matching `path`: the first step is any descendant, later steps are children
    ///
    /// `find_all(&["body", "div", "annotationBlock"])` is the equivalent of the XPath
    /// `.//body/div/annotationBlock`.
    pub fn find_all(&self, path: &[&str]) -> Vec<&Element> {
        let Some((first, rest)) = path.split_first() else {
            return Vec::new();
        };

        let mut current: Vec<&Element> = self
            .descendants()
            .into_iter()
            .filter(|element| element.name == *first)
            .collect();

        for step in rest {
            let mut next = Vec::new();
            for element in current {
                for child in &element.children {
                    if child.name == *step {
                        next.push(child);
                    }
                }
            }
            current = next;
        }

        current
    }

    /// First element matching `path` (see [`Element::find_all`])
    pub fn find(&self, path: &[&str]) -> Option<&Element> {
        self.find_all(path).into_iter().next()
    }

    /// First element matching `path`, or a [`ConversionError::MissingElement`]
    pub fn require(&self, path: &[&str]) -> Result<&Element, ConversionError> {
        self.find(path).ok_or_else(|| ConversionError::MissingElement {
            element: path.join("/"),
            context: format!("<{}>", if self.name.is_empty() { "document" } else { &self.name }),
        })
    }
}
