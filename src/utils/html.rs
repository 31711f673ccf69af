//! HTML document handling on top of `tl`.
//!
//! - `Document::parse()` - parse a page prepared by [`SourceText`]
//! - `Document::images_mut()` - every `<img>` tag, mutable
//! - `Document::prettify()` - re-serialize the whole tree, one node per line
//! - `is_void_element()`, `is_preformatted_element()` - tag classification

use std::borrow::Cow;

use tl::{HTMLTag, Node, NodeHandle, Parser, ParserOptions, VDom};

use super::source::SourceText;

// =============================================================================
// Element Classification
// =============================================================================

/// Check if an HTML tag is a void element (self-closing).
///
/// Void elements cannot have children and are rendered as `<tag/>`.
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Check if whitespace inside the tag is significant.
///
/// Raw text (`script`, `style`) and whitespace-preserving (`pre`, `textarea`)
/// elements are written back without re-indentation.
#[inline]
pub fn is_preformatted_element(tag: &str) -> bool {
    matches!(tag, "pre" | "textarea" | "script" | "style")
}

/// Escape double quotes in an attribute value.
///
/// Values are kept as written in the source (entities stay encoded), so only
/// the quote that delimits them on output needs escaping.
#[inline]
fn escape_quotes(value: &str) -> Cow<'_, str> {
    if value.contains('"') {
        Cow::Owned(value.replace('"', "&quot;"))
    } else {
        Cow::Borrowed(value)
    }
}

// =============================================================================
// Document
// =============================================================================

/// A parsed HTML page, borrowing its prepared source.
pub struct Document<'a> {
    dom: VDom<'a>,
    source: &'a SourceText,
}

impl<'a> Document<'a> {
    /// Parse a complete HTML document.
    ///
    /// Raw-text bodies and CDATA were taken out by [`SourceText`], so an
    /// `<img>` inside a script never shows up as an element.
    pub fn parse(source: &'a SourceText) -> Result<Self, tl::ParseError> {
        let dom = tl::parse(source.body(), ParserOptions::default())?;
        Ok(Self { dom, source })
    }

    /// Iterate over every `<img>` tag in the document.
    pub fn images_mut(&mut self) -> impl Iterator<Item = &mut HTMLTag<'a>> + '_ {
        self.dom
            .nodes_mut()
            .iter_mut()
            .filter_map(|node| node.as_tag_mut())
            .filter(|tag| tag.name().as_utf8_str().eq_ignore_ascii_case("img"))
    }

    /// Serialize the whole document.
    ///
    /// Every tag, text and comment node goes on its own line, indented one
    /// space per nesting level. Whitespace-only text is dropped and other text
    /// is trimmed. Preformatted elements are written inline, unchanged, and
    /// the prolog is written first exactly as it appeared in the source.
    pub fn prettify(&self) -> String {
        let mut printer = Printer {
            parser: self.dom.parser(),
            source: self.source,
            out: String::new(),
        };

        for decl in self.source.prolog() {
            printer.line(0, decl);
        }

        for handle in self.dom.children() {
            printer.node(*handle, 0);
        }

        printer.out
    }
}

// =============================================================================
// Printer
// =============================================================================

struct Printer<'p, 'a> {
    parser: &'p Parser<'a>,
    source: &'p SourceText,
    out: String,
}

impl Printer<'_, '_> {
    fn line(&mut self, depth: usize, text: &str) {
        self.out.extend(std::iter::repeat_n(' ', depth));
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn node(&mut self, handle: NodeHandle, depth: usize) {
        let parser = self.parser;
        let Some(node) = handle.get(parser) else {
            return;
        };

        match node {
            Node::Tag(tag) => self.tag(tag, depth),
            Node::Raw(bytes) => {
                let text = bytes.as_utf8_str();
                let text = text.trim();
                if !text.is_empty() {
                    let text = self.source.restore(text);
                    self.line(depth, &text);
                }
            }
            Node::Comment(bytes) => self.line(depth, &comment(&bytes.as_utf8_str())),
        }
    }

    fn tag(&mut self, tag: &HTMLTag<'_>, depth: usize) {
        let name = tag.name().as_utf8_str();
        let lower = name.to_ascii_lowercase();

        if is_void_element(&lower) {
            self.line(depth, &format!("{}/>", open_tag(tag, &name)));
            return;
        }

        if is_preformatted_element(&lower) {
            self.out.extend(std::iter::repeat_n(' ', depth));
            self.inline_tag(tag);
            self.out.push('\n');
            return;
        }

        self.line(depth, &format!("{}>", open_tag(tag, &name)));
        for child in tag.children().top().iter() {
            self.node(*child, depth + 1);
        }
        self.line(depth, &format!("</{name}>"));
    }

    /// Write a tag and its subtree without adding or removing whitespace.
    fn inline_tag(&mut self, tag: &HTMLTag<'_>) {
        let name = tag.name().as_utf8_str();
        self.out.push_str(&open_tag(tag, &name));

        if is_void_element(&name.to_ascii_lowercase()) {
            self.out.push_str("/>");
            return;
        }

        self.out.push('>');
        for child in tag.children().top().iter() {
            self.inline_node(*child);
        }
        self.out.push_str("</");
        self.out.push_str(&name);
        self.out.push('>');
    }

    fn inline_node(&mut self, handle: NodeHandle) {
        let parser = self.parser;
        match handle.get(parser) {
            Some(Node::Tag(tag)) => self.inline_tag(tag),
            Some(Node::Raw(bytes)) => {
                let text = bytes.as_utf8_str();
                let text = self.source.restore(&text);
                self.out.push_str(&text);
            }
            Some(Node::Comment(bytes)) => self.out.push_str(&comment(&bytes.as_utf8_str())),
            None => {}
        }
    }
}

/// `<name attr="value"` without the closing `>`.
fn open_tag(tag: &HTMLTag<'_>, name: &str) -> String {
    let mut out = format!("<{name}");
    for (key, value) in attributes(tag) {
        out.push(' ');
        out.push_str(&key);
        if let Some(value) = value {
            out.push_str("=\"");
            out.push_str(&escape_quotes(&value));
            out.push('"');
        }
    }
    out
}

/// All attributes of a tag in source order.
///
/// tl keeps `id` and `class` apart from the other attributes; they are put
/// first when the general iterator does not yield them.
fn attributes<'t>(tag: &'t HTMLTag<'_>) -> Vec<(Cow<'t, str>, Option<Cow<'t, str>>)> {
    let attrs = tag.attributes();
    let mut list: Vec<_> = attrs.iter().collect();

    for (key, value) in [("class", attrs.class()), ("id", attrs.id())] {
        if let Some(value) = value
            && !list.iter().any(|(k, _)| k == key)
        {
            list.insert(0, (Cow::Borrowed(key), Some(value.as_utf8_str())));
        }
    }

    list
}

fn comment(text: &str) -> Cow<'_, str> {
    if text.starts_with("<!--") {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(format!("<!--{text}-->"))
    }
}

// =============================================================================
// Tests
// =============================================================================
