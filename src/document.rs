//! Parsed HTML documents and the rewrite-on-serialize machinery used by the
//! content filters.
//!
//! A [`Document`] is never mutated in place. Filters record their edits in a
//! [`Rewrites`] set keyed by node id, and [`Document::serialize`] applies them
//! while writing the markup back out. Each filtering pass parses its own
//! document, so nothing is shared between passes.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write};

use ego_tree::{NodeId, NodeRef};
use scraper::node::{Element, Node};
use scraper::{ElementRef, Html, Selector};

use crate::error::{CensorError, Result};

/// HTML5 void elements that must not have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are written out verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Elements whose first newline is dropped by the parser, so one is written
/// back after the start tag when the content begins with a newline.
const NEWLINE_ELEMENTS: &[&str] = &["pre", "textarea", "listing"];

/// Attributes of `el` with their qualified names (`xlink:href`, not `href`),
/// in storage order.
pub fn qualified_attrs<'a>(el: &'a Element) -> impl Iterator<Item = (String, &'a str)> {
    el.attrs.iter().map(|(name, value)| {
        let qualified = match &name.prefix {
            Some(prefix) => format!("{prefix}:{}", name.local),
            None => name.local.to_string(),
        };
        (qualified, &**value)
    })
}

/// One piece of a rewritten text node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Character data, escaped on output.
    Text(String),
    /// Markup, parsed and inserted as nodes.
    Markup(String),
}

/// Edits recorded against a [`Document`], applied at serialization time.
#[derive(Debug, Default)]
pub struct Rewrites {
    removed: HashSet<NodeId>,
    attrs: HashMap<NodeId, Vec<(String, String)>>,
    texts: HashMap<NodeId, Vec<Segment>>,
}

impl Rewrites {
    /// Drop the node (and its subtree) from the output.
    pub fn remove(&mut self, id: NodeId) {
        self.removed.insert(id);
    }

    /// Replace the full attribute list of an element, preserving the given order.
    pub fn set_attrs(&mut self, id: NodeId, attrs: Vec<(String, String)>) {
        self.attrs.insert(id, attrs);
    }

    /// Replace a text node with a sequence of text and markup segments.
    pub fn set_text(&mut self, id: NodeId, segments: Vec<Segment>) {
        self.texts.insert(id, segments);
    }

    /// Returns `true` if no edits have been recorded.
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.attrs.is_empty() && self.texts.is_empty()
    }

    /// Number of nodes touched by this rewrite set.
    pub fn len(&self) -> usize {
        self.removed.len() + self.attrs.len() + self.texts.len()
    }
}

/// An HTML document parsed with the HTML5 tree-construction algorithm.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parse a full document. Missing `html`, `head` and `body` elements are
    /// synthesized by the parser.
    pub fn parse(markup: &str) -> Self {
        let html = Html::parse_document(markup);
        if !html.errors.is_empty() {
            tracing::trace!("Recovered from {} parse errors", html.errors.len());
        }
        Self { html }
    }

    /// The tree root.
    pub fn root(&self) -> NodeRef<'_, Node> {
        self.html.tree.root()
    }

    /// The `<body>` element, where text filtering starts.
    pub fn body(&self) -> Result<NodeRef<'_, Node>> {
        self.root()
            .descendants()
            .find(|node| matches!(node.value(), Node::Element(el) if el.name() == "body"))
            .ok_or_else(|| CensorError::Parse("document has no <body> element".to_string()))
    }

    /// All elements matching `selector`, in document order.
    pub fn select<'a>(&'a self, selector: &'a Selector) -> impl Iterator<Item = ElementRef<'a>> {
        self.html.select(selector)
    }

    /// Serialize the document with `rewrites` applied.
    pub fn serialize(&self, rewrites: &Rewrites) -> Result<String> {
        let mut serializer = Serializer {
            rewrites,
            out: String::new(),
        };
        serializer.node(self.root(), false)?;
        Ok(serializer.out)
    }

    /// Serialize the unmodified document.
    pub fn html(&self) -> Result<String> {
        self.serialize(&Rewrites::default())
    }
}

struct Serializer<'a> {
    rewrites: &'a Rewrites,
    out: String,
}

impl Serializer<'_> {
    fn node(&mut self, node: NodeRef<Node>, raw: bool) -> fmt::Result {
        let id = node.id();
        let rewrites = self.rewrites;
        if rewrites.removed.contains(&id) {
            return Ok(());
        }

        match node.value() {
            Node::Document | Node::Fragment => {
                for child in node.children() {
                    self.node(child, false)?;
                }
            }
            Node::Doctype(doctype) => {
                write!(self.out, "<!DOCTYPE {}", doctype.name())?;
                if !doctype.public_id().is_empty() {
                    write!(self.out, " PUBLIC \"{}\"", doctype.public_id())?;
                }
                if !doctype.system_id().is_empty() {
                    write!(self.out, " \"{}\"", doctype.system_id())?;
                }
                self.out.push('>');
            }
            Node::Element(el) => {
                let tag = el.name();
                write!(self.out, "<{tag}")?;

                match rewrites.attrs.get(&id) {
                    Some(attrs) => {
                        for (name, value) in attrs {
                            self.attr(name, value)?;
                        }
                    }
                    None => {
                        for (name, value) in qualified_attrs(el) {
                            self.attr(&name, value)?;
                        }
                    }
                }
                self.out.push('>');
                if NEWLINE_ELEMENTS.contains(&tag) && self.starts_with_newline(node) {
                    self.out.push('\n');
                }

                if VOID_ELEMENTS.contains(&tag) {
                    return Ok(());
                }

                let raw = RAW_TEXT_ELEMENTS.contains(&tag);
                for child in node.children() {
                    self.node(child, raw)?;
                }
                write!(self.out, "</{tag}>")?;
            }
            Node::Text(text) => match rewrites.texts.get(&id) {
                Some(segments) => {
                    for segment in segments {
                        self.segment(segment, raw)?;
                    }
                }
                None => self.text(text.as_ref(), raw),
            },
            Node::Comment(comment) => {
                self.out.push_str("<!--");
                self.out.push_str(comment.as_ref());
                self.out.push_str("-->");
            }
            _ => {}
        }
        Ok(())
    }

    fn starts_with_newline(&self, node: NodeRef<Node>) -> bool {
        let Some(first) = node.first_child() else {
            return false;
        };
        if self.rewrites.removed.contains(&first.id()) {
            return false;
        }
        match (first.value(), self.rewrites.texts.get(&first.id())) {
            (Node::Text(_), Some(segments)) => {
                matches!(segments.first(), Some(Segment::Text(t)) if t.starts_with('\n'))
            }
            (Node::Text(text), None) => {
                let text: &str = text.as_ref();
                text.starts_with('\n')
            }
            _ => false,
        }
    }

    fn attr(&mut self, name: &str, value: &str) -> fmt::Result {
        write!(self.out, " {name}=\"")?;
        for c in value.chars() {
            match c {
                '&' => self.out.push_str("&amp;"),
                '"' => self.out.push_str("&quot;"),
                '\u{a0}' => self.out.push_str("&nbsp;"),
                c => self.out.push(c),
            }
        }
        self.out.push('"');
        Ok(())
    }

    fn text(&mut self, text: &str, raw: bool) {
        if raw {
            self.out.push_str(text);
            return;
        }
        for c in text.chars() {
            match c {
                '&' => self.out.push_str("&amp;"),
                '<' => self.out.push_str("&lt;"),
                '>' => self.out.push_str("&gt;"),
                '\u{a0}' => self.out.push_str("&nbsp;"),
                c => self.out.push(c),
            }
        }
    }

    fn segment(&mut self, segment: &Segment, raw: bool) -> fmt::Result {
        match segment {
            Segment::Text(text) => self.text(text, raw),
            Segment::Markup(markup) if raw => self.out.push_str(markup),
            Segment::Markup(markup) => {
                let fragment = Html::parse_fragment(markup);
                let nested = Rewrites::default();
                let mut inner = Serializer {
                    rewrites: &nested,
                    out: String::new(),
                };
                // parse_fragment wraps the content in a synthetic <html> element.
                for wrapper in fragment.tree.root().children() {
                    for child in wrapper.children() {
                        inner.node(child, false)?;
                    }
                }
                self.out.push_str(&inner.out);
            }
        }
        Ok(())
    }
}
