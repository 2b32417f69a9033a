//! A minimal element tree over `quick-xml`.
//!
//! Only what the codec needs: elements with ordered attributes, text
//! children, a per-element protection tag and the source line of each
//! element.  Comments and processing instructions are dropped on parse.

use std::fmt;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::crypto::ProtectedValue;
use crate::errors::{KdbxError, Result};

/// Indentation unit used by [`Document::pretty_print`].
const INDENT: &str = "    ";

/// How an element's content relates to a `ProtectedValue`.
#[derive(Debug, Clone, Default)]
pub enum Protection {
    /// Ordinary text content.
    #[default]
    Plain,
    /// Text is the base64 of the value's obfuscated bytes.
    Protected(ProtectedValue),
    /// Text is temporarily the plaintext; the value is kept so the
    /// element can be hidden again without drawing new salt.
    Revealed(ProtectedValue),
}

impl Protection {
    pub fn value(&self) -> Option<&ProtectedValue> {
        match self {
            Self::Plain => None,
            Self::Protected(pv) | Self::Revealed(pv) => Some(pv),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Clone)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    protection: Protection,
    line: Option<usize>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("children", &self.children.len())
            .field("protection", &self.protection)
            .finish()
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            protection: Protection::Plain,
            line: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Line of the start tag in the parsed source, if parsed.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    // --- Attributes ---

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attribute(&mut self, name: &str) {
        self.attributes.retain(|(k, _)| k != name);
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    // --- Children ---

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        })
    }

    /// First child element named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements_mut().find(|el| el.name == name)
    }

    /// First child element named `name`, or `FileCorrupt` with `message`.
    pub fn child_or_err(&self, name: &str, message: &str) -> Result<&Element> {
        self.child(name)
            .ok_or_else(|| KdbxError::corrupt_at(message, self.line))
    }

    /// Append a new empty element and return it.
    pub fn add_child(&mut self, name: &str) -> &mut Element {
        self.children.push(Node::Element(Element::new(name)));
        match self.children.last_mut() {
            Some(Node::Element(el)) => el,
            _ => unreachable!("element was just pushed"),
        }
    }

    pub fn append(&mut self, node: Node) {
        self.children.push(node);
    }

    /// Insert `node` before position `index` (clamped to the end).
    pub fn insert(&mut self, index: usize, node: Node) {
        let index = index.min(self.children.len());
        self.children.insert(index, node);
    }

    // --- Text ---

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    /// Replace every child with a single text node (none when empty).
    pub fn replace_text(&mut self, text: &str) {
        self.children.clear();
        if !text.is_empty() {
            self.children.push(Node::Text(text.to_string()));
        }
    }

    // --- Protection ---

    pub fn protection(&self) -> &Protection {
        &self.protection
    }

    pub fn set_protection(&mut self, protection: Protection) {
        self.protection = protection;
    }

    pub(crate) fn protection_mut(&mut self) -> &mut Protection {
        &mut self.protection
    }

    pub(crate) fn take_protection(&mut self) -> Protection {
        std::mem::take(&mut self.protection)
    }
}

fn collect_text(el: &Element, out: &mut String) {
    for node in &el.children {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(child) => collect_text(child, out),
        }
    }
}

/// A parsed or freshly created XML document.
#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
    declaration: bool,
}

/// Characters the format never carries; stripped before parsing.
fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{9}' | '\u{B}' | '\u{C}' | '\u{E}'..='\u{1F}')
}

fn bad_xml(e: impl fmt::Display, line: usize) -> KdbxError {
    KdbxError::corrupt_at(format!("bad xml: {e}"), Some(line))
}

impl Document {
    /// `<?xml version="1.0" encoding="utf-8" standalone="yes"?><root/>`
    pub fn create(root_name: &str) -> Self {
        Self {
            root: Element::new(root_name),
            declaration: true,
        }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    /// Parse a document.  Any malformation is `FileCorrupt` with the
    /// line where it was detected.
    pub fn parse(xml: &str) -> Result<Self> {
        let cleaned: String = xml.chars().filter(|c| !is_stripped_control(*c)).collect();
        let bytes = cleaned.as_bytes();
        let mut reader = Reader::from_str(&cleaned);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;
        let mut declaration = false;
        let mut line = 1usize;
        let mut scanned = 0usize;

        loop {
            let pos = (reader.buffer_position() as usize).min(bytes.len());
            if pos > scanned {
                line += bytes[scanned..pos].iter().filter(|&&b| b == b'\n').count();
                scanned = pos;
            }

            match reader.read_event().map_err(|e| bad_xml(e, line))? {
                Event::Decl(_) => declaration = true,
                Event::Start(start) => stack.push(element_from_start(&start, line)?),
                Event::Empty(start) => {
                    let el = element_from_start(&start, line)?;
                    attach(&mut stack, &mut root, el, line)?;
                }
                Event::End(_) => {
                    let el = stack
                        .pop()
                        .ok_or_else(|| bad_xml("unexpected closing tag", line))?;
                    attach(&mut stack, &mut root, el, line)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| bad_xml(e, line))?;
                    push_text(&mut stack, &text, line)?;
                }
                Event::CData(data) => {
                    let text = String::from_utf8(data.into_inner().into_owned())
                        .map_err(|e| bad_xml(e, line))?;
                    push_text(&mut stack, &text, line)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(bad_xml(format!("unclosed element <{}>", open.name), line));
        }
        let root = root.ok_or_else(|| bad_xml("no root element", line))?;
        Ok(Self { root, declaration })
    }

    /// Serialize, optionally pretty-printed.  The document itself is
    /// not modified.
    pub fn serialize(&self, pretty: bool) -> Result<String> {
        let mut writer = Writer::new(Vec::new());

        if self.declaration {
            writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), Some("yes"))))
                .map_err(write_failed)?;
            if pretty {
                writer.get_mut().push(b'\n');
            }
        }

        if pretty {
            let mut root = self.root.clone();
            indent(&mut root, 1);
            write_element(&mut writer, &root)?;
        } else {
            write_element(&mut writer, &self.root)?;
        }

        String::from_utf8(writer.into_inner())
            .map_err(|e| KdbxError::corrupt(format!("xml write produced invalid UTF-8: {e}")))
    }

    /// Insert whitespace-only text nodes so each nested element starts
    /// on its own line, indented by depth.  Element, attribute and
    /// non-whitespace text content is untouched.
    pub fn pretty_print(&mut self) {
        indent(&mut self.root, 1);
    }
}

fn element_from_start(start: &BytesStart<'_>, line: usize) -> Result<Element> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| bad_xml(e, line))?
        .to_string();
    let mut el = Element::new(name);
    el.line = Some(line);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| bad_xml(e, line))?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(|e| bad_xml(e, line))?;
        let value = attr.unescape_value().map_err(|e| bad_xml(e, line))?;
        el.set_attribute(key, value.into_owned());
    }
    Ok(el)
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    el: Element,
    line: usize,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(el)),
        None if root.is_none() => *root = Some(el),
        None => return Err(bad_xml("multiple root elements", line)),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str, line: usize) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            if !text.is_empty() {
                parent.children.push(Node::Text(text.to_string()));
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(bad_xml("text outside the root element", line)),
    }
}

fn write_failed(e: impl fmt::Display) -> KdbxError {
    KdbxError::corrupt(format!("xml write failed: {e}"))
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if el.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(write_failed);
    }

    writer.write_event(Event::Start(start)).map_err(write_failed)?;
    for node in &el.children {
        match node {
            Node::Text(text) => writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_failed)?,
            Node::Element(child) => write_element(writer, child)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(el.name.as_str())))
        .map_err(write_failed)
}

fn is_blank(node: &Node) -> bool {
    matches!(node, Node::Text(text) if text.trim().is_empty())
}

/// `depth` is the indentation level of `el`'s children.
fn indent(el: &mut Element, depth: usize) {
    if !el.children.iter().any(|n| matches!(n, Node::Element(_))) {
        return;
    }

    // Drop existing layout whitespace so repeated passes do not stack.
    el.children.retain(|n| !is_blank(n));

    let before = format!("\n{}", INDENT.repeat(depth));
    let closing = format!("\n{}", INDENT.repeat(depth - 1));

    let old = std::mem::take(&mut el.children);
    for node in old {
        match node {
            Node::Element(mut child) => {
                indent(&mut child, depth + 1);
                el.children.push(Node::Text(before.clone()));
                el.children.push(Node::Element(child));
            }
            text => el.children.push(text),
        }
    }
    el.children.push(Node::Text(closing));
}
