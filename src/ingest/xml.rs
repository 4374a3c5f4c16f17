// src/ingest/xml.rs
//! Owned element tree built from quick-xml events.
//!
//! The feed is small enough to hold in memory, and the field paths need
//! random access (direct child, nested child, subtree search), so the
//! streaming reader is folded into a plain tree once per document.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::FeedError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    name: String,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Text that precedes the first child element (CDATA included), unescaped.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// First direct child with the given tag name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All elements below this one, in document order (self excluded).
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&XmlNode> = self.children.iter().collect();
        stack.reverse();
        Descendants { stack }
    }

    /// First element below this one with the given tag name.
    pub fn find_descendant(&self, name: &str) -> Option<&XmlNode> {
        self.descendants().find(|n| n.name == name)
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a XmlNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Every `order` element of the document, in document order.
pub fn find_orders(root: &XmlNode) -> Vec<&XmlNode> {
    root.descendants().filter(|n| n.name == "order").collect()
}

/// Parse an already-decoded document into its root element.
pub fn parse_document(xml: &str) -> Result<XmlNode, FeedError> {
    let mut reader = Reader::from_str(xml);
    let mut open: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = reader.read_event().map_err(|e| FeedError::Parse {
            position: reader.buffer_position() as u64,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                open.push(XmlNode::new(name));
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                close_into(&mut open, &mut root, XmlNode::new(name));
            }
            Event::End(_) => match open.pop() {
                Some(node) => close_into(&mut open, &mut root, node),
                None => {
                    return Err(FeedError::Parse {
                        position: reader.buffer_position() as u64,
                        message: "unexpected closing tag".to_string(),
                    })
                }
            },
            Event::Text(t) => {
                if let Some(node) = open.last_mut() {
                    if node.children.is_empty() {
                        let raw = String::from_utf8_lossy(&t);
                        node.text
                            .push_str(&html_escape::decode_html_entities(raw.as_ref()));
                    }
                }
            }
            Event::CData(c) => {
                if let Some(node) = open.last_mut() {
                    if node.children.is_empty() {
                        node.text.push_str(&String::from_utf8_lossy(&c));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(FeedError::Parse {
            position: reader.buffer_position() as u64,
            message: format!("unclosed element <{}>", unclosed.name),
        });
    }

    root.ok_or(FeedError::EmptyDocument)
}

fn close_into(open: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) {
    match open.last_mut() {
        Some(parent) => parent.children.push(node),
        // Trailing siblings of the root are ignored; the first root wins.
        None => {
            if root.is_none() {
                *root = Some(node);
            }
        }
    }
}
