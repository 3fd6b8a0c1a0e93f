//! A small, path-addressed XML tree builder.
//!
//! [`Document`] is an in-memory DOM built up incrementally through path
//! expressions rather than through direct node handles, mirroring the way
//! Jenkins `config.xml` files are assembled: callers repeatedly say "set
//! this leaf, creating parents as needed" rather than walking a tree by
//! hand. A [`Query`] (built with [`QueryBuilder`]) names a path from the
//! document root down to a single element or attribute; `/`-separated
//! segments address child elements, an `@attr` suffix on the last segment
//! addresses an attribute, and a segment ending in `+` always creates a new
//! sibling rather than reusing an existing one with the same tag.
//!
//! Serialization is a hand-rolled pretty printer rather than a dependency
//! on a general XML writer crate, so that indentation, attribute ordering,
//! and self-closing-tag behavior stay fully under our control.

use std::fmt;

use thiserror::Error;

/// Errors produced while building or navigating a [`Document`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("empty path")]
    EmptyPath,

    #[error("path component {0:?} is empty")]
    EmptyComponent(String),

    #[error("attribute component must be the last segment of a path")]
    AttributeNotLast,
}

/// One segment of a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
enum Component {
    /// A child element, addressed by tag name. Reuses an existing child
    /// with the same tag if one exists at this position, unless `append`
    /// is set.
    Element { tag: String, append: bool },
    /// An attribute on the element named by the preceding components.
    Attribute { name: String },
}

/// A path from the document root to a single element or attribute.
///
/// Built with [`QueryBuilder`]; construct one with [`Query::parse`] or
/// [`Query::builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    components: Vec<Component>,
}

impl Query {
    pub fn builder() -> QueryBuilder {
        QueryBuilder::default()
    }

    /// Parses a `/`-separated path string into a [`Query`].
    ///
    /// A trailing `+` on an element segment forces creation of a new
    /// sibling element rather than reuse of an existing one with the same
    /// tag (e.g. `publishers/hudson.tasks.Mailer+`). A segment containing
    /// `@` splits into an element path and a trailing attribute name
    /// (e.g. `scm@class`); the attribute must be the final segment.
    pub fn parse(path: &str) -> Result<Self, TreeError> {
        if path.is_empty() {
            return Err(TreeError::EmptyPath);
        }

        let mut components = Vec::new();
        let parts: Vec<&str> = path.split('/').collect();
        let last_index = parts.len() - 1;

        for (idx, part) in parts.into_iter().enumerate() {
            if part.is_empty() {
                return Err(TreeError::EmptyComponent(path.to_string()));
            }

            if let Some((elem, attr)) = part.split_once('@') {
                if idx != last_index {
                    return Err(TreeError::AttributeNotLast);
                }
                if !elem.is_empty() {
                    let (tag, append) = split_append(elem);
                    components.push(Component::Element {
                        tag: tag.to_string(),
                        append,
                    });
                }
                components.push(Component::Attribute {
                    name: attr.to_string(),
                });
            } else {
                let (tag, append) = split_append(part);
                components.push(Component::Element {
                    tag: tag.to_string(),
                    append,
                });
            }
        }

        Ok(Query { components })
    }
}

fn split_append(part: &str) -> (&str, bool) {
    match part.strip_suffix('+') {
        Some(tag) => (tag, true),
        None => (part, false),
    }
}

/// Incrementally constructs a [`Query`] without parsing a path string.
#[derive(Debug, Default, Clone)]
pub struct QueryBuilder {
    components: Vec<Component>,
}

impl QueryBuilder {
    /// Appends a child-element segment, reusing an existing child with
    /// this tag if one is present.
    pub fn key(mut self, tag: impl Into<String>) -> Self {
        self.components.push(Component::Element {
            tag: tag.into(),
            append: false,
        });
        self
    }

    /// Appends a child-element segment that always creates a new sibling,
    /// even if a child with this tag already exists.
    pub fn append(mut self, tag: impl Into<String>) -> Self {
        self.components.push(Component::Element {
            tag: tag.into(),
            append: true,
        });
        self
    }

    /// Terminates the path with an attribute name.
    pub fn attr(mut self, name: impl Into<String>) -> Self {
        self.components.push(Component::Attribute { name: name.into() });
        self
    }

    /// Builds the [`Query`].
    ///
    /// Panics if no components were added.
    pub fn build(self) -> Query {
        assert!(!self.components.is_empty(), "QueryBuilder: empty path");
        Query {
            components: self.components,
        }
    }
}

/// A single XML element and its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// The element's text content, if any has been set.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The element's attributes, in insertion order.
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// The element's children, in document order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    fn find_child(&self, tag: &str) -> Option<usize> {
        self.children.iter().position(|c| c.tag == tag)
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    /// Sets the text content at `path`, relative to this element, creating
    /// any missing intermediate elements. If `path` ends in an `@attr`
    /// segment, sets the named attribute instead.
    pub fn set(&mut self, path: &str, value: impl Into<String>) -> Result<(), TreeError> {
        let query = Query::parse(path)?;
        self.set_query(&query, value)
    }

    /// Like [`Element::set`], but takes a pre-built [`Query`].
    pub fn set_query(&mut self, query: &Query, value: impl Into<String>) -> Result<(), TreeError> {
        let value = value.into();
        match query.components.split_last() {
            Some((Component::Attribute { name }, rest)) => {
                let element = self.navigate(rest);
                element.set_attr(name, &value);
            }
            Some((Component::Element { .. }, _)) => {
                let element = self.navigate(&query.components);
                element.text = Some(value);
            }
            None => return Err(TreeError::EmptyPath),
        }
        Ok(())
    }

    /// Sets the attribute named by `path`'s trailing `@attr` segment,
    /// relative to this element.
    pub fn set_attr(&mut self, path: &str, value: impl Into<String>) -> Result<(), TreeError> {
        let query = Query::parse(path)?;
        if !matches!(query.components.last(), Some(Component::Attribute { .. })) {
            return Err(TreeError::AttributeNotLast);
        }
        self.set_query(&query, value)
    }

    /// Ensures the element named by `path` exists relative to this
    /// element, creating it and any missing parents, and returns a mutable
    /// reference to it. `path` must not contain an attribute segment.
    pub fn get_or_create(&mut self, path: &str) -> Result<&mut Element, TreeError> {
        let query = Query::parse(path)?;
        if query
            .components
            .iter()
            .any(|c| matches!(c, Component::Attribute { .. }))
        {
            return Err(TreeError::AttributeNotLast);
        }
        Ok(self.navigate(&query.components))
    }

    fn navigate(&mut self, components: &[Component]) -> &mut Element {
        let mut current = self;
        for component in components {
            let Component::Element { tag, append } = component else {
                unreachable!("attribute component reached navigate()")
            };
            let idx = if *append {
                current.children.push(Element::new(tag.clone()));
                current.children.len() - 1
            } else {
                match current.find_child(tag) {
                    Some(idx) => idx,
                    None => {
                        current.children.push(Element::new(tag.clone()));
                        current.children.len() - 1
                    }
                }
            };
            current = &mut current.children[idx];
        }
        current
    }
}

/// A path-addressed XML document with a single root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    root: Element,
}

impl Document {
    /// Creates a new document with the given root tag.
    pub fn new(root_tag: impl Into<String>) -> Self {
        Document {
            root: Element::new(root_tag),
        }
    }

    /// The root element.
    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Sets the text content at `path`, creating any missing parent
    /// elements along the way. If `path` ends in an `@attr` segment, sets
    /// the named attribute instead.
    pub fn set(&mut self, path: &str, value: impl Into<String>) -> Result<(), TreeError> {
        self.root.set(path, value)
    }

    /// Like [`Document::set`], but takes a pre-built [`Query`].
    pub fn set_query(&mut self, query: &Query, value: impl Into<String>) -> Result<(), TreeError> {
        self.root.set_query(query, value)
    }

    /// Sets the attribute named by `path`'s trailing `@attr` segment.
    ///
    /// Equivalent to [`Document::set`] when the path already ends in an
    /// attribute segment; provided separately so callers can assert at the
    /// type level that they mean to set an attribute.
    pub fn set_attr(&mut self, path: &str, value: impl Into<String>) -> Result<(), TreeError> {
        self.root.set_attr(path, value)
    }

    /// Ensures the element named by `path` exists, creating it and any
    /// missing parents, and returns a mutable reference to it.
    ///
    /// `path` must not contain an attribute segment.
    pub fn get_or_create(&mut self, path: &str) -> Result<&mut Element, TreeError> {
        self.root.get_or_create(path)
    }

    /// Renders the document as pretty-printed XML: two-space indentation,
    /// attributes sorted by name, and self-closing tags for elements with
    /// no text and no children.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        write_element(&mut out, &self.root, 0);
        out
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

fn write_element(out: &mut String, element: &Element, depth: usize) {
    let indent = "  ".repeat(depth);
    out.push_str(&indent);
    out.push('<');
    out.push_str(&element.tag);

    let mut attrs = element.attrs.clone();
    attrs.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, value) in &attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_attr(value));
        out.push('"');
    }

    if element.children.is_empty() && element.text.is_none() {
        out.push_str("/>\n");
        return;
    }

    out.push('>');

    if let Some(text) = &element.text {
        out.push_str(&escape_text(text));
        out.push_str("</");
        out.push_str(&element.tag);
        out.push_str(">\n");
        return;
    }

    out.push('\n');
    for child in &element.children {
        write_element(out, child, depth + 1);
    }
    out.push_str(&indent);
    out.push_str("</");
    out.push_str(&element.tag);
    out.push_str(">\n");
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xd;"),
            other => out.push(other),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\r' => out.push_str("&#xd;"),
            '\n' => out.push_str("&#10;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_creates_missing_parents() {
        let mut doc = Document::new("project");
        doc.set("scm/url", "https://example.com/repo.git").unwrap();
        assert_eq!(
            doc.to_xml_string(),
            "<project>\n  <scm>\n    <url>https://example.com/repo.git</url>\n  </scm>\n</project>\n"
        );
    }

    #[test]
    fn set_reuses_existing_element_by_default() {
        let mut doc = Document::new("project");
        doc.set("scm/url", "first").unwrap();
        doc.set("scm/branch", "master").unwrap();
        assert_eq!(doc.root().children().len(), 1);
        assert_eq!(doc.root().children()[0].children().len(), 2);
    }

    #[test]
    fn trailing_plus_forces_new_sibling() {
        let mut doc = Document::new("project");
        doc.set("publishers/hudson.tasks.Mailer+/recipients", "a@example.com")
            .unwrap();
        doc.set("publishers/hudson.tasks.Mailer+/recipients", "b@example.com")
            .unwrap();
        let publishers = &doc.root().children()[0];
        assert_eq!(publishers.children().len(), 2);
    }

    #[test]
    fn set_attr_sets_attribute() {
        let mut doc = Document::new("project");
        doc.set_attr("scm@class", "hudson.plugins.git.GitSCM").unwrap();
        assert_eq!(
            doc.to_xml_string(),
            "<project>\n  <scm class=\"hudson.plugins.git.GitSCM\"/>\n</project>\n"
        );
    }

    #[test]
    fn attributes_are_sorted_on_render() {
        let mut doc = Document::new("project");
        doc.set_attr("scm@class", "C").unwrap();
        doc.set_attr("scm@plugin", "P").unwrap();
        let xml = doc.to_xml_string();
        assert!(xml.find("class").unwrap() < xml.find("plugin").unwrap());
    }

    #[test]
    fn get_or_create_returns_same_element_twice() {
        let mut doc = Document::new("project");
        doc.get_or_create("triggers").unwrap();
        doc.get_or_create("triggers").unwrap();
        assert_eq!(doc.root().children().len(), 1);
    }

    #[test]
    fn empty_element_self_closes() {
        let mut doc = Document::new("project");
        doc.get_or_create("keepDependencies").unwrap();
        assert_eq!(doc.to_xml_string(), "<project>\n  <keepDependencies/>\n</project>\n");
    }

    #[test]
    fn escapes_carriage_return_in_text() {
        let mut doc = Document::new("project");
        doc.set("description", "line1\rline2").unwrap();
        assert!(doc.to_xml_string().contains("&#xd;"));
    }

    #[test]
    fn parse_rejects_empty_path() {
        assert_eq!(Query::parse(""), Err(TreeError::EmptyPath));
    }

    #[test]
    fn parse_rejects_attribute_in_middle() {
        assert_eq!(Query::parse("a@attr/b"), Err(TreeError::AttributeNotLast));
    }

    #[test]
    fn builder_matches_parsed_query() {
        let built = Query::builder().key("scm").attr("class").build();
        let parsed = Query::parse("scm@class").unwrap();
        assert_eq!(built, parsed);
    }
}
