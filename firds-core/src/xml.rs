//! Minimal owned XML element tree built from `quick-xml` events.
//!
//! Only what the pipeline needs: elements, attributes, and text. Comments,
//! processing instructions, and the declaration are dropped. Element and
//! attribute names are stored as local names, so `<auth:FinInstrm>` and
//! `<FinInstrm xmlns="...">` are both `FinInstrm`.

use crate::error::{EtlError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::io::BufRead;

/// A child of an element: a nested element or a run of character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Value of the attribute with the given local name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The n-th child node, counting text nodes (including whitespace).
    pub fn node(&self, n: usize) -> Option<&Node> {
        self.children.get(n)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child_element(&self, n: usize) -> Option<&Element> {
        self.child_elements().nth(n)
    }

    pub fn first_child_element(&self) -> Option<&Element> {
        self.child_element(0)
    }

    /// Concatenated direct text content. Whitespace is preserved as-is.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// First descendant (not self) with the given name, in document order.
    pub fn find_first(&self, tag: &str) -> Option<&Element> {
        for child in self.child_elements() {
            if child.name == tag {
                return Some(child);
            }
            if let Some(found) = child.find_first(tag) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants (not self) with the given name, in document order.
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_named(tag, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        for child in self.child_elements() {
            if child.name == tag {
                out.push(child);
            }
            child.collect_named(tag, out);
        }
    }
}

/// Parse a complete document and return its root element.
pub fn parse_document(xml: &str) -> Result<Element> {
    let reader = Reader::from_reader(xml.as_bytes());
    read_elements(reader, |_, depth| depth == 0)?
        .into_iter()
        .next()
        .ok_or_else(|| EtlError::MalformedXml("document has no root element".into()))
}

/// Stream a document and keep only the subtrees named `tag`.
///
/// Everything outside a matching subtree is discarded as it is read.
/// A match nested inside another match is kept only as part of the outer one.
pub fn collect_elements<R: BufRead>(source: R, tag: &str) -> Result<Vec<Element>> {
    read_elements(Reader::from_reader(source), |name, _| name == tag)
}

fn read_elements<R, F>(mut reader: Reader<R>, capture: F) -> Result<Vec<Element>>
where
    R: BufRead,
    F: Fn(&str, usize) -> bool,
{
    let mut buf = Vec::with_capacity(8192);
    let mut found = Vec::new();
    // Elements of the subtree currently being captured, outermost first.
    let mut stack: Vec<Element> = Vec::new();
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let element = start_element(e)?;
                if !stack.is_empty() || capture(&element.name, depth) {
                    stack.push(element);
                }
                depth += 1;
            }
            Event::Empty(ref e) => {
                let element = start_element(e)?;
                if !stack.is_empty() || capture(&element.name, depth) {
                    attach(&mut stack, &mut found, element);
                }
            }
            Event::Text(ref e) => {
                if let Some(top) = stack.last_mut() {
                    top.children.push(Node::Text(e.unescape()?.into_owned()));
                }
            }
            Event::CData(e) => {
                if let Some(top) = stack.last_mut() {
                    let text = String::from_utf8(e.into_inner().into_owned())
                        .map_err(|e| EtlError::MalformedXml(e.to_string()))?;
                    top.children.push(Node::Text(text));
                }
            }
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                if let Some(done) = stack.pop() {
                    attach(&mut stack, &mut found, done);
                }
            }
            Event::Eof => {
                if depth > 0 {
                    return Err(EtlError::MalformedXml(format!(
                        "unexpected end of input with {depth} unclosed element(s)"
                    )));
                }
                return Ok(found);
            }
            _ => {}
        }
        buf.clear();
    }
}

fn start_element(e: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(e.local_name().as_ref()));
    for attr in e.attributes() {
        let attr = attr.map_err(|e| EtlError::MalformedXml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn attach(stack: &mut [Element], found: &mut Vec<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => found.push(element),
    }
}
