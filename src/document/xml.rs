// ABOUTME: Owned XML tree built from quick-xml events
// ABOUTME: Lets document parts be edited structurally and written back without losing markup

use std::borrow::Cow;

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::error::{DocumentError, Result};

#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    /// Unescaped character data
    Text(String),
    /// Declarations, comments, CDATA and processing instructions, passed through
    Other(Event<'static>),
}

#[derive(Debug, Clone)]
pub struct Element {
    pub start: BytesStart<'static>,
    pub children: Vec<Node>,
    self_closing: bool,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            start: BytesStart::new(name.to_string()),
            children: Vec::new(),
            self_closing: false,
        }
    }

    pub fn empty_with_attributes(name: &str, attributes: &[(&str, &str)]) -> Self {
        let start = BytesStart::new(name.to_string()).with_attributes(attributes.iter().copied());
        Self {
            start,
            children: Vec::new(),
            self_closing: true,
        }
    }

    pub fn name(&self) -> &[u8] {
        self.start.name().into_inner()
    }

    pub fn is(&self, name: &str) -> bool {
        self.name() == name.as_bytes()
    }

    pub fn is_any(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.is(name))
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.start
            .attributes()
            .flatten()
            .any(|attribute| attribute.key.as_ref() == key.as_bytes())
    }

    pub fn push_attribute(&mut self, key: &str, value: &str) {
        self.start.push_attribute((key, value));
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|node| matches!(node, Node::Element(element) if element.is(name)))
    }

    pub fn child_mut(&mut self, index: usize) -> Option<&mut Element> {
        match self.children.get_mut(index) {
            Some(Node::Element(element)) => Some(element),
            _ => None,
        }
    }

    /// Concatenated character data of this element's direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn set_text(&mut self, text: &str) {
        self.children.retain(|node| !matches!(node, Node::Text(_)));
        self.children.insert(0, Node::Text(text.to_string()));
    }
}

/// A parsed XML part: prolog nodes plus the root element.
#[derive(Debug, Clone)]
pub struct XmlTree {
    pub nodes: Vec<Node>,
}

impl XmlTree {
    pub fn parse(part: &str, bytes: &[u8]) -> Result<Self> {
        let xml = std::str::from_utf8(bytes).map_err(|_| DocumentError::Encoding {
            part: part.to_string(),
        })?;

        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut nodes: Vec<Node> = Vec::new();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| DocumentError::xml(part, e))?;

            match event {
                Event::Start(start) => stack.push(Element {
                    start: start.into_owned(),
                    children: Vec::new(),
                    self_closing: false,
                }),
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        DocumentError::xml(part, "closing tag without an open element")
                    })?;
                    attach(&mut stack, &mut nodes, Node::Element(element));
                }
                Event::Empty(start) => {
                    let element = Element {
                        start: start.into_owned(),
                        children: Vec::new(),
                        self_closing: true,
                    };
                    attach(&mut stack, &mut nodes, Node::Element(element));
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| DocumentError::xml(part, e))?;
                    attach(&mut stack, &mut nodes, Node::Text(text.into_owned()));
                }
                Event::Eof => break,
                other => attach(&mut stack, &mut nodes, Node::Other(other.into_owned())),
            }
        }

        if let Some(open) = stack.last() {
            return Err(DocumentError::xml(
                part,
                format!(
                    "unexpected end of document inside <{}>",
                    String::from_utf8_lossy(open.name())
                ),
            ));
        }

        Ok(Self { nodes })
    }

    pub fn to_bytes(&self, part: &str) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(&mut writer, node).map_err(|e| DocumentError::xml(part, e))?;
        }
        Ok(writer.into_inner())
    }
}

fn attach(stack: &mut [Element], nodes: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => nodes.push(node),
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> std::result::Result<(), String> {
    match node {
        Node::Element(element) => {
            if element.self_closing && element.children.is_empty() {
                writer
                    .write_event(Event::Empty(element.start.borrow()))
                    .map_err(|e| e.to_string())?;
            } else {
                writer
                    .write_event(Event::Start(element.start.borrow()))
                    .map_err(|e| e.to_string())?;
                for child in &element.children {
                    write_node(writer, child)?;
                }
                writer
                    .write_event(Event::End(element.start.to_end()))
                    .map_err(|e| e.to_string())?;
            }
        }
        Node::Text(text) => {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| e.to_string())?;
        }
        Node::Other(event) => {
            writer
                .write_event(event.clone())
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

/// Depth-first visit over every element of the tree.
pub fn walk_elements_mut(nodes: &mut [Node], visit: &mut dyn FnMut(&mut Element)) {
    for node in nodes.iter_mut() {
        if let Node::Element(element) = node {
            visit(element);
            walk_elements_mut(&mut element.children, visit);
        }
    }
}

pub fn attribute_value<'a>(element: &'a Element, key: &str) -> Option<Cow<'a, str>> {
    element
        .start
        .attributes()
        .flatten()
        .find(|attribute| attribute.key.as_ref() == key.as_bytes())
        .map(|attribute| match attribute.value {
            Cow::Borrowed(bytes) => String::from_utf8_lossy(bytes),
            Cow::Owned(bytes) => Cow::Owned(String::from_utf8_lossy(&bytes).into_owned()),
        })
}
