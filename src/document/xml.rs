/*!
 * Owned XML tree for Office Open XML parts.
 *
 * Parts are small enough to hold in memory, and rewriting a paragraph in
 * place is much simpler on a tree than on an event stream. Element and
 * attribute names keep their namespace prefix exactly as written.
 */

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::errors::DocumentError;

/// A node inside an element
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    CData(String),
    /// Comments, processing instructions and doctypes, kept verbatim
    Raw(RawKind, String),
}

/// Which verbatim construct a `Raw` node holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Comment,
    ProcessingInstruction,
    DocType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

/// A parsed part: optional declaration, prolog nodes and the root element
#[derive(Debug, Clone)]
pub struct XmlDocument {
    declaration: Option<BytesDecl<'static>>,
    prolog: Vec<XmlNode>,
    pub root: XmlElement,
}

/// Split "w:p" into ("w", "p"); unprefixed names have an empty prefix
fn split_name(name: &str) -> (&str, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", name),
    }
}

/// `prefix:local`, or just `local` for the default namespace
pub fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn local_name(&self) -> &str {
        split_name(&self.name).1
    }

    pub fn prefix(&self) -> &str {
        split_name(&self.name).0
    }

    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Attribute value by local name, ignoring the prefix
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| split_name(key).1 == local)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(existing) => existing.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// First child element with the given local name
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.is(local))
    }

    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.is(local))
    }

    /// Child elements with the given local name, in order
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |e| e.is(local))
    }

    /// The `n`th child element with the given local name
    pub fn nth_child_mut(&mut self, local: &str, n: usize) -> Option<&mut XmlElement> {
        self.elements_mut().filter(|e| e.is(local)).nth(n)
    }

    /// Concatenated character data of this element and its descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        for node in &self.children {
            match node {
                XmlNode::Text(t) | XmlNode::CData(t) => out.push_str(t),
                XmlNode::Element(e) => out.push_str(&e.text()),
                XmlNode::Raw(..) => {}
            }
        }
        out
    }

    /// Drop every child except elements whose local name is in `keep`
    pub fn retain_elements(&mut self, keep: &[&str]) {
        self.children.retain(|node| match node {
            XmlNode::Element(e) => keep.contains(&e.local_name()),
            _ => false,
        });
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(XmlNode::Element(child));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.children.push(XmlNode::Text(text.into()));
    }
}

impl XmlDocument {
    /// Parse a complete XML part
    pub fn parse(bytes: &[u8]) -> Result<Self, DocumentError> {
        let source = std::str::from_utf8(bytes)
            .map_err(|e| DocumentError::Xml(format!("part is not UTF-8: {}", e)))?;
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);

        let mut reader = Reader::from_str(source);
        reader.trim_text(false);

        let mut declaration = None;
        let mut prolog = Vec::new();
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;

        loop {
            let event = reader.read_event()?;
            let node = match event {
                Event::Decl(decl) => {
                    declaration = Some(decl.into_owned());
                    continue;
                }
                Event::Start(start) => {
                    stack.push(element_from_start(&start)?);
                    continue;
                }
                Event::Empty(start) => XmlNode::Element(element_from_start(&start)?),
                Event::End(_) => {
                    let finished = stack
                        .pop()
                        .ok_or_else(|| DocumentError::Xml("unbalanced end tag".to_string()))?;
                    XmlNode::Element(finished)
                }
                Event::Text(text) => {
                    XmlNode::Text(text.unescape().map_err(DocumentError::from)?.into_owned())
                }
                Event::CData(data) => {
                    XmlNode::CData(String::from_utf8_lossy(&data.into_inner()).into_owned())
                }
                Event::Comment(text) => XmlNode::Raw(RawKind::Comment, lossy(&text)),
                Event::PI(text) => XmlNode::Raw(RawKind::ProcessingInstruction, lossy(&text)),
                Event::DocType(text) => XmlNode::Raw(RawKind::DocType, lossy(&text)),
                Event::Eof => break,
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => match node {
                    XmlNode::Element(e) if root.is_none() => root = Some(e),
                    XmlNode::Element(_) => {
                        return Err(DocumentError::Xml("multiple root elements".to_string()));
                    }
                    // Whitespace between the declaration and the root is not kept
                    XmlNode::Text(_) | XmlNode::CData(_) => {}
                    raw => prolog.push(raw),
                },
            }
        }

        if !stack.is_empty() {
            return Err(DocumentError::Xml("unclosed element at end of part".to_string()));
        }

        let root = root.ok_or_else(|| DocumentError::Xml("part has no root element".to_string()))?;
        Ok(Self {
            declaration,
            prolog,
            root,
        })
    }

    /// Serialize back to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut writer = Writer::new(Vec::new());

        if let Some(decl) = &self.declaration {
            writer.write_event(Event::Decl(decl.clone()))?;
            writer.get_mut().extend_from_slice(b"\r\n");
        }
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;

        Ok(writer.into_inner())
    }
}

fn lossy(text: &BytesText<'_>) -> String {
    String::from_utf8_lossy(&text[..]).into_owned()
}

fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, DocumentError> {
    let mut element = XmlElement::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DocumentError::Xml(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(DocumentError::from)?.into_owned();
        element.attributes.push((key, value));
    }
    Ok(element)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<(), DocumentError> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &element.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), DocumentError> {
    match node {
        XmlNode::Element(e) => write_element(writer, e)?,
        XmlNode::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
        XmlNode::CData(t) => writer.write_event(Event::CData(BytesCData::new(t.as_str())))?,
        XmlNode::Raw(RawKind::Comment, t) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(t.as_str())))?
        }
        XmlNode::Raw(RawKind::ProcessingInstruction, t) => {
            writer.write_event(Event::PI(BytesText::from_escaped(t.as_str())))?
        }
        XmlNode::Raw(RawKind::DocType, t) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(t.as_str())))?
        }
    }
    Ok(())
}
