//! Tree serialization
//!
//! Converts a subtree back into markup text. Output is deterministic:
//! attributes are written in insertion order and no normalization beyond
//! escaping is applied.
//!
//! XML output is always well-formed, whatever the tree holds: characters XML
//! 1.0 forbids are dropped, attributes whose names are not XML Names are
//! skipped, elements with such tag names are replaced by their children, and
//! `--` inside comments is collapsed.

use std::borrow::Cow;

use crate::node::NodeData;
use crate::tree::MarkupTree;
use crate::NodeId;

/// Void (self-closing) HTML elements
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose text is written without escaping in HTML syntax
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Check if a tag is a void element
pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_lowercase().as_str())
}

/// Output dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Syntax {
    /// HTML: void elements have no end tag, empty attributes are written bare
    #[default]
    Html,
    /// XML: childless elements self-close, attributes always carry a value
    Xml,
}

/// Options for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerializeOptions {
    /// Put every node on its own line, indented one space per level
    pub pretty: bool,

    /// Output dialect
    pub syntax: Syntax,
}

impl SerializeOptions {
    /// Compact HTML output
    pub fn html() -> Self {
        Self {
            pretty: false,
            syntax: Syntax::Html,
        }
    }

    /// Compact XML output
    pub fn xml() -> Self {
        Self {
            pretty: false,
            syntax: Syntax::Xml,
        }
    }

    /// Toggle indentation
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Serialize a node and its subtree to a string
pub fn serialize(tree: &MarkupTree, id: NodeId, options: &SerializeOptions) -> String {
    let mut output = String::with_capacity(1024);
    if options.pretty {
        write_pretty(tree, id, options.syntax, 0, false, &mut output);
        let trimmed = output.trim_end_matches('\n').len();
        output.truncate(trimmed);
    } else {
        write_compact(tree, id, options.syntax, false, &mut output);
    }
    output
}

fn write_compact(tree: &MarkupTree, id: NodeId, syntax: Syntax, raw: bool, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };

    match &node.data {
        NodeData::Document => {
            for &child in node.children() {
                write_compact(tree, child, syntax, false, out);
            }
        }
        NodeData::Text(text) => write_text(text, syntax, raw, out),
        NodeData::Comment(text) => write_comment(text, syntax, out),
        NodeData::Element(element) => {
            let children = node.children();
            if syntax == Syntax::Xml && !is_xml_name(&element.tag) {
                for &child in children {
                    write_compact(tree, child, syntax, false, out);
                }
                return;
            }
            write_start_tag(tree, id, syntax, children.is_empty(), out);
            if closes_inline(&element.tag, syntax, children.is_empty()) {
                return;
            }
            let raw = is_raw_text(&element.tag, syntax);
            for &child in children {
                write_compact(tree, child, syntax, raw, out);
            }
            write_end_tag(&element.tag, out);
        }
    }
}

fn write_pretty(
    tree: &MarkupTree,
    id: NodeId,
    syntax: Syntax,
    depth: usize,
    raw: bool,
    out: &mut String,
) {
    let Some(node) = tree.get(id) else {
        return;
    };

    match &node.data {
        NodeData::Document => {
            for &child in node.children() {
                write_pretty(tree, child, syntax, depth, false, out);
            }
        }
        NodeData::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return;
            }
            indent(depth, out);
            write_text(text, syntax, raw, out);
            out.push('\n');
        }
        NodeData::Comment(text) => {
            indent(depth, out);
            write_comment(text, syntax, out);
            out.push('\n');
        }
        NodeData::Element(element) => {
            let children = node.children();
            if syntax == Syntax::Xml && !is_xml_name(&element.tag) {
                for &child in children {
                    write_pretty(tree, child, syntax, depth, false, out);
                }
                return;
            }
            indent(depth, out);
            write_start_tag(tree, id, syntax, children.is_empty(), out);
            out.push('\n');
            if closes_inline(&element.tag, syntax, children.is_empty()) {
                return;
            }
            let raw = is_raw_text(&element.tag, syntax);
            for &child in children {
                write_pretty(tree, child, syntax, depth + 1, raw, out);
            }
            indent(depth, out);
            write_end_tag(&element.tag, out);
            out.push('\n');
        }
    }
}

/// Whether the start tag is the whole element
fn closes_inline(tag: &str, syntax: Syntax, childless: bool) -> bool {
    match syntax {
        Syntax::Html => is_void(tag),
        Syntax::Xml => childless,
    }
}

fn is_raw_text(tag: &str, syntax: Syntax) -> bool {
    syntax == Syntax::Html && RAW_TEXT_ELEMENTS.contains(&tag.to_lowercase().as_str())
}

fn write_start_tag(tree: &MarkupTree, id: NodeId, syntax: Syntax, childless: bool, out: &mut String) {
    let Some(element) = tree.element(id) else {
        return;
    };

    out.push('<');
    out.push_str(&element.tag);
    for (name, value) in &element.attributes {
        if syntax == Syntax::Xml && !is_xml_name(name) {
            continue;
        }
        out.push(' ');
        out.push_str(name);
        match syntax {
            Syntax::Html if value.is_empty() => continue,
            Syntax::Html => {
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
            }
            Syntax::Xml => {
                out.push_str("=\"");
                out.push_str(&escape_attr(&xml_chars(value)));
            }
        }
        out.push('"');
    }
    if syntax == Syntax::Xml && childless {
        out.push('/');
    }
    out.push('>');
}

fn write_end_tag(tag: &str, out: &mut String) {
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn write_text(text: &str, syntax: Syntax, raw: bool, out: &mut String) {
    match syntax {
        Syntax::Html if raw => out.push_str(text),
        Syntax::Html => out.push_str(&escape_text(text)),
        Syntax::Xml => out.push_str(&escape_text(&xml_chars(text))),
    }
}

fn write_comment(text: &str, syntax: Syntax, out: &mut String) {
    out.push_str("<!--");
    match syntax {
        Syntax::Html => out.push_str(text),
        Syntax::Xml => out.push_str(&xml_comment(text)),
    }
    out.push_str("-->");
}

/// Whether a character may appear in an XML 1.0 document
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn is_name_start_char(c: char) -> bool {
    matches!(
        c,
        ':' | '_'
            | 'A'..='Z'
            | 'a'..='z'
            | '\u{C0}'..='\u{D6}'
            | '\u{D8}'..='\u{F6}'
            | '\u{F8}'..='\u{2FF}'
            | '\u{370}'..='\u{37D}'
            | '\u{37F}'..='\u{1FFF}'
            | '\u{200C}'..='\u{200D}'
            | '\u{2070}'..='\u{218F}'
            | '\u{2C00}'..='\u{2FEF}'
            | '\u{3001}'..='\u{D7FF}'
            | '\u{F900}'..='\u{FDCF}'
            | '\u{FDF0}'..='\u{FFFD}'
            | '\u{10000}'..='\u{EFFFF}'
    )
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(
            c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}'
        )
}

/// Check if a string is an XML 1.0 Name
pub fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(is_name_start_char) && chars.all(is_name_char)
}

/// Drop characters that cannot appear in XML
fn xml_chars(s: &str) -> Cow<'_, str> {
    if s.chars().all(is_xml_char) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.chars().filter(|&c| is_xml_char(c)).collect())
    }
}

/// Comment body without `--` and without a trailing `-`
fn xml_comment(text: &str) -> String {
    let mut clean = String::with_capacity(text.len());
    for c in text.chars().filter(|&c| is_xml_char(c)) {
        if c == '-' && clean.ends_with('-') {
            continue;
        }
        clean.push(c);
    }
    if clean.ends_with('-') {
        clean.push(' ');
    }
    clean
}

fn indent(depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push(' ');
    }
}

/// Escape character data
pub fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value
pub fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
