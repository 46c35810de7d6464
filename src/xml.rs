#![deny(missing_docs)]

//! # XML Document Model
//!
//! A small owned XML tree used for wire documents and rendered schemas.
//! Parsing goes through `roxmltree`; writing is plain string building with
//! escaping. The bridge relies on documents being cheap to construct fresh,
//! so the model is plain owned data with no interior sharing.

use crate::error::AppResult;
use indexmap::IndexMap;

/// An owned XML element.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Local element name.
    pub name: String,
    /// Attributes in document order. Namespace declarations are kept as
    /// ordinary `xmlns`/`xmlns:*` attributes.
    pub attributes: IndexMap<String, String>,
    /// Child elements in document order.
    pub children: Vec<Element>,
    /// Concatenated text content of this element (direct children only).
    pub text: Option<String>,
}

impl Element {
    /// Creates an element with the given local name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Creates an element holding only text content.
    pub fn with_text(name: &str, text: &str) -> Self {
        let mut e = Self::new(name);
        e.text = Some(text.to_string());
        e
    }

    /// Sets an attribute, replacing any existing value.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attributes.insert(name.to_string(), value.to_string());
    }

    /// Returns an attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the first child element with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Returns all child elements with the given local name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn write(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        out.push_str(&pad);
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attributes {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape(v));
            out.push('"');
        }

        let text = self.text.as_deref().unwrap_or("");
        if self.children.is_empty() && text.is_empty() {
            out.push_str(" />\n");
            return;
        }

        out.push('>');
        if self.children.is_empty() {
            out.push_str(&escape(text));
        } else {
            out.push('\n');
            for child in &self.children {
                child.write(out, indent + 1);
            }
            out.push_str(&pad);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push_str(">\n");
    }
}

/// An owned XML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// The document element.
    pub root: Element,
}

impl Document {
    /// Wraps a root element into a document.
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    /// Parses a document from XML text.
    pub fn parse(text: &str) -> AppResult<Self> {
        let doc = roxmltree::Document::parse(text)?;
        Ok(Self {
            root: convert(doc.root_element()),
        })
    }

    /// Renders the document to XML text, declaration included.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
        self.root.write(&mut out, 0);
        out
    }
}

fn convert(node: roxmltree::Node<'_, '_>) -> Element {
    let mut element = Element::new(node.tag_name().name());

    if let Some(ns) = node.tag_name().namespace() {
        // Only record the namespace of the element itself; prefixed
        // attribute declarations are carried through below.
        if node
            .attributes()
            .all(|a| a.name() != "xmlns" && a.namespace().is_none())
        {
            element.set_attr("xmlns", ns);
        }
    }

    for attr in node.attributes() {
        element.set_attr(attr.name(), attr.value());
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            element.children.push(convert(child));
        } else if child.is_text() {
            if let Some(t) = child.text() {
                text.push_str(t);
            }
        }
    }
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        element.text = Some(trimmed.to_string());
    }

    element
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let doc = Document::parse("<Person><Name>Ada</Name><Age>36</Age></Person>").unwrap();
        assert_eq!(doc.root.name, "Person");
        assert_eq!(doc.root.child("Name").unwrap().text.as_deref(), Some("Ada"));
        assert_eq!(doc.root.child("Age").unwrap().text.as_deref(), Some("36"));
    }

    #[test]
    fn test_roundtrip_text() {
        let mut root = Element::new("Root");
        root.children.push(Element::with_text("Value", "a < b"));
        let doc = Document::new(root);
        let text = doc.to_xml_string();
        assert!(text.contains("a &lt; b"));

        let parsed = Document::parse(&text).unwrap();
        assert_eq!(
            parsed.root.child("Value").unwrap().text.as_deref(),
            Some("a < b")
        );
    }

    #[test]
    fn test_attributes_preserved() {
        let doc =
            Document::parse("<e a=\"1\" b=\"two\"><inner c=\"3\" /></e>").unwrap();
        assert_eq!(doc.root.attr("a"), Some("1"));
        assert_eq!(doc.root.attr("b"), Some("two"));
        assert_eq!(doc.root.child("inner").unwrap().attr("c"), Some("3"));
    }
}
