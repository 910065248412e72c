//! Map document tree
//!
//! Folds the `quick-xml` event stream into an owned element tree so the
//! loader can walk sections in document order, look at direct children and
//! read typed attributes with element/attribute context on failure.

use crate::{LevelError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// A single element with ordered attributes, children and text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    /// Tag name
    pub name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Raw attribute value
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, or `MissingAttribute`
    pub fn required_attr(&self, key: &str) -> Result<&str> {
        self.attr(key)
            .ok_or_else(|| LevelError::missing(&self.name, key))
    }

    /// Typed attribute value; absent is `Ok(None)`, unparseable is an error
    pub fn parse_attr<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        match self.attr(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| LevelError::invalid(&self.name, key, raw)),
        }
    }

    /// Typed attribute value that must be present
    pub fn required_parse<T: FromStr>(&self, key: &str) -> Result<T> {
        self.parse_attr(key)?
            .ok_or_else(|| LevelError::missing(&self.name, key))
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    /// First direct child with the given tag name
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Concatenated text content
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A parsed map document
#[derive(Debug, Clone)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Load and parse a document from disk
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a document from a string
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let position = reader.buffer_position();
            let event = reader.read_event().map_err(|e| {
                LevelError::Document(format!("XML error at byte {}: {}", position, e))
            })?;

            match event {
                Event::Start(start) => {
                    stack.push(Self::open_element(&start)?);
                }
                Event::Empty(start) => {
                    let element = Self::open_element(&start)?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        LevelError::Document(format!("unbalanced end tag at byte {}", position))
                    })?;
                    Self::attach(&mut stack, &mut root, element)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| {
                        LevelError::Document(format!("bad text at byte {}: {}", position, e))
                    })?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    let text = std::str::from_utf8(&data).map_err(|e| {
                        LevelError::Document(format!("bad CDATA at byte {}: {}", position, e))
                    })?;
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.last() {
            return Err(LevelError::Document(format!("unclosed element <{}>", open.name)));
        }

        root.map(|root| Self { root })
            .ok_or_else(|| LevelError::Document("document has no root element".into()))
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn into_root(self) -> Element {
        self.root
    }

    fn open_element(start: &BytesStart<'_>) -> Result<Element> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| LevelError::Document(format!("bad tag name: {}", e)))?
            .to_string();

        let mut element = Element::new(name);
        for attr in start.attributes() {
            let attr = attr.map_err(|e| {
                LevelError::Document(format!("bad attribute on <{}>: {}", element.name, e))
            })?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| LevelError::Document(format!("bad attribute name: {}", e)))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| {
                    LevelError::Document(format!("bad value for '{}' on <{}>: {}", key, element.name, e))
                })?
                .into_owned();
            element.attributes.push((key, value));
        }
        Ok(element)
    }

    fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None if root.is_none() => *root = Some(element),
            None => {
                return Err(LevelError::Document(format!(
                    "second root element <{}>",
                    element.name
                )))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree() {
        let doc = Document::parse(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<map width="2" height="3">
  <tileset firstgid="1" name="ground"><image source="a.png" width="64" height="32"/></tileset>
  <layer name="base">
    <data encoding="base64">
      AAAA
    </data>
  </layer>
</map>"#,
        )
        .unwrap();

        let root = doc.root();
        assert_eq!(root.name, "map");
        assert_eq!(root.required_parse::<usize>("width").unwrap(), 2);
        assert_eq!(root.children().count(), 2);

        let tileset = root.child("tileset").unwrap();
        assert_eq!(tileset.attr("name"), Some("ground"));
        assert_eq!(tileset.child("image").unwrap().attr("source"), Some("a.png"));

        let data = root.child("layer").unwrap().child("data").unwrap();
        assert_eq!(data.text().trim(), "AAAA");
    }

    #[test]
    fn test_children_keep_document_order() {
        let doc = Document::parse("<map><b/><a/><b/><c/></map>").unwrap();
        let names: Vec<&str> = doc.root().children().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "b", "c"]);
        assert_eq!(doc.root().children_named("b").count(), 2);
    }

    #[test]
    fn test_attribute_errors_carry_context() {
        let doc = Document::parse(r#"<tileset tilewidth="abc"/>"#).unwrap();
        let element = doc.root();

        match element.required_parse::<u32>("tilewidth") {
            Err(LevelError::InvalidAttribute { element, attribute, value }) => {
                assert_eq!(element, "tileset");
                assert_eq!(attribute, "tilewidth");
                assert_eq!(value, "abc");
            }
            other => panic!("expected InvalidAttribute, got {:?}", other),
        }

        assert!(matches!(
            element.required_attr("name"),
            Err(LevelError::MissingAttribute { .. })
        ));
        assert_eq!(element.parse_attr::<u32>("margin").unwrap(), None);
    }

    #[test]
    fn test_escaped_values() {
        let doc = Document::parse(r#"<map><property name="a&amp;b" value="&lt;x&gt;"/></map>"#).unwrap();
        let prop = doc.root().child("property").unwrap();
        assert_eq!(prop.attr("name"), Some("a&b"));
        assert_eq!(prop.attr("value"), Some("<x>"));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(Document::parse(""), Err(LevelError::Document(_))));
        assert!(matches!(Document::parse("<map><layer></map>"), Err(LevelError::Document(_))));
        assert!(matches!(Document::parse("<map>"), Err(LevelError::Document(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Document::load_file("/definitely/not/here.tmx");
        assert!(matches!(
            result,
            Err(LevelError::FileError(ref err)) if err.kind() == std::io::ErrorKind::NotFound
        ));
    }
}
