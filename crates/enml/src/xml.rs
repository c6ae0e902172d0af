//! ENML parsing support.
//!
//! ENML is XML, so the storage side is parsed strictly with quick-xml:
//! mismatched or unclosed tags and unknown entities are errors rather than
//! something to recover from.

use std::borrow::Cow;

use enml_core::{MarkupTree, NodeId};
use quick_xml::escape::unescape_with;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::{Error, Result};

/// Named entities accepted on top of the XML builtins.
///
/// Notes written by the official clients reference the XHTML entity set
/// through the ENML DTD; these are the ones that show up in practice.
const ENTITIES: &[(&str, &str)] = &[
    ("lt", "<"),
    ("gt", ">"),
    ("amp", "&"),
    ("apos", "'"),
    ("quot", "\""),
    ("nbsp", "\u{a0}"),
    ("copy", "\u{a9}"),
    ("reg", "\u{ae}"),
    ("trade", "\u{2122}"),
    ("mdash", "\u{2014}"),
    ("ndash", "\u{2013}"),
    ("hellip", "\u{2026}"),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("ldquo", "\u{201c}"),
    ("rdquo", "\u{201d}"),
    ("laquo", "\u{ab}"),
    ("raquo", "\u{bb}"),
    ("bull", "\u{2022}"),
    ("middot", "\u{b7}"),
    ("times", "\u{d7}"),
    ("euro", "\u{20ac}"),
];

fn resolve_entity(name: &str) -> Option<&'static str> {
    ENTITIES
        .iter()
        .find(|(entity, _)| *entity == name)
        .map(|(_, text)| *text)
}

/// Resolve the body of an entity reference (`amp`, `#160`, `#xA0`)
fn resolve_reference(reference: &str) -> Result<Cow<'static, str>> {
    if let Some(number) = reference.strip_prefix('#') {
        let code = match number.strip_prefix('x').or_else(|| number.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse::<u32>(),
        };
        return code
            .ok()
            .and_then(char::from_u32)
            .map(|c| Cow::Owned(c.to_string()))
            .ok_or_else(|| Error::Parse(format!("invalid character reference &{reference};")));
    }

    resolve_entity(reference)
        .map(Cow::Borrowed)
        .ok_or_else(|| Error::Parse(format!("unknown entity &{reference};")))
}

/// Parse an ENML (XML) document into a [`MarkupTree`].
///
/// The XML declaration, DOCTYPE and processing instructions are dropped;
/// comments are kept.
///
/// # Example
///
/// ```rust
/// use enml::parse_xml;
///
/// let tree = parse_xml(r#"<en-note><en-todo checked="true"/>done</en-note>"#).unwrap();
/// let todo = tree.find_first("en-todo").unwrap();
/// assert_eq!(tree.attr(todo, "checked"), Some("true"));
///
/// assert!(parse_xml("<en-note><div></en-note>").is_err());
/// ```
pub fn parse_xml(input: impl AsRef<[u8]>) -> Result<MarkupTree> {
    let text = std::str::from_utf8(input.as_ref())
        .map_err(|e| Error::Parse(format!("input is not valid UTF-8: {e}")))?;

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);
    reader.config_mut().check_end_names = true;

    let mut tree = MarkupTree::new();
    let mut stack: Vec<NodeId> = vec![tree.root()];

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|e| Error::Parse(format!("at byte {position}: {e}")))?;

        match event {
            Event::Start(e) => {
                let node = open_element(&mut tree, &stack, &e)?;
                stack.push(node);
            }
            Event::Empty(e) => {
                open_element(&mut tree, &stack, &e)?;
            }
            Event::End(e) => {
                if stack.len() <= 1 {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    return Err(Error::Parse(format!("unexpected end tag </{name}>")));
                }
                stack.pop();
            }
            Event::Text(e) => {
                let content = String::from_utf8_lossy(&e);
                push_text(&mut tree, &stack, &content)?;
            }
            Event::CData(e) => {
                let content = String::from_utf8_lossy(&e);
                push_text(&mut tree, &stack, &content)?;
            }
            Event::GeneralRef(e) => {
                let reference = String::from_utf8_lossy(&e);
                let resolved = resolve_reference(&reference)?;
                push_text(&mut tree, &stack, &resolved)?;
            }
            Event::Comment(e) => {
                if let Some(&parent) = stack.last() {
                    let content = String::from_utf8_lossy(&e);
                    let comment = tree.new_comment(&content);
                    tree.append(parent, comment)?;
                }
            }
            Event::Eof => break,
            // Declaration, DOCTYPE and processing instructions
            _ => {}
        }
    }

    if stack.len() > 1 {
        let open: Vec<_> = stack[1..]
            .iter()
            .filter_map(|&id| tree.tag(id))
            .collect();
        return Err(Error::Parse(format!(
            "unexpected end of input, unclosed: {}",
            open.join(" > ")
        )));
    }

    tracing::trace!(nodes = tree.arena_len(), "parsed enml document");
    Ok(tree)
}

/// Create an element for a start or empty tag and attach it
fn open_element(tree: &mut MarkupTree, stack: &[NodeId], start: &BytesStart) -> Result<NodeId> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| Error::Parse(format!("invalid element name: {e}")))?
        .to_string();

    let mut attrs: Vec<(String, String)> = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Parse(format!("in <{name}>: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = unescape_with(&raw, resolve_entity)
            .map_err(|e| Error::Parse(format!("attribute {key} of <{name}>: {e}")))?;
        attrs.push((key, value.into_owned()));
    }

    let parent = *stack.last().unwrap_or(&tree.root());
    if parent == tree.root() && tree.document_element().is_some() {
        return Err(Error::Parse(format!(
            "<{name}> is a second root element"
        )));
    }

    let node = tree.new_element_with_attrs(&name, attrs);
    tree.append(parent, node)?;
    Ok(node)
}

/// Append character data to the innermost open element
fn push_text(tree: &mut MarkupTree, stack: &[NodeId], content: &str) -> Result<()> {
    match stack.last() {
        Some(&parent) if stack.len() > 1 => {
            tree.append_text(parent, content)?;
            Ok(())
        }
        _ if content.trim().is_empty() => Ok(()),
        _ => Err(Error::Parse(format!(
            "text outside the root element: {:?}",
            content.trim()
        ))),
    }
}
