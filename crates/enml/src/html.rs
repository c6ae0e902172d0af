//! HTML parsing support.
//!
//! HTML input goes through html5ever (via scraper) so browser-style error
//! recovery applies: unclosed tags are closed, stray end tags are dropped and
//! the content is wrapped in implicit `html`/`head`/`body` elements.

use enml_core::{MarkupTree, NodeId};
use scraper::{ElementRef, Html, Node as ScraperNode};

use crate::{Error, Result};

/// Parse an HTML document into a [`MarkupTree`].
///
/// Only invalid UTF-8 is rejected; any markup is accepted the way a browser
/// would accept it.
///
/// # Example
///
/// ```rust
/// use enml::parse_html;
///
/// let tree = parse_html("<p>Hello <b>World").unwrap();
/// let body = tree.find_first("body").unwrap();
/// assert_eq!(tree.text_content(body), "Hello World");
/// ```
pub fn parse_html(input: impl AsRef<[u8]>) -> Result<MarkupTree> {
    let text = std::str::from_utf8(input.as_ref())
        .map_err(|e| Error::Parse(format!("input is not valid UTF-8: {e}")))?;

    let document = Html::parse_document(text);
    let mut tree = MarkupTree::new();
    let root = tree.root();
    copy_element(&mut tree, root, document.root_element())?;

    tracing::trace!(nodes = tree.arena_len(), "parsed html document");
    Ok(tree)
}

/// Copy a scraper element and its subtree under `parent`
fn copy_element(tree: &mut MarkupTree, parent: NodeId, element: ElementRef) -> Result<()> {
    let value = element.value();
    let attrs = value.attrs.iter().map(|(name, value)| {
        let name = match &name.prefix {
            Some(prefix) => format!("{prefix}:{}", name.local),
            None => name.local.to_string(),
        };
        (name, value.to_string())
    });
    let node = tree.new_element_with_attrs(value.name(), attrs);
    tree.append(parent, node)?;

    for child in element.children() {
        match child.value() {
            ScraperNode::Text(text) => {
                tree.append_text(node, &text.text)?;
            }
            ScraperNode::Comment(comment) => {
                let comment = tree.new_comment(&comment.comment);
                tree.append(node, comment)?;
            }
            ScraperNode::Element(_) => {
                if let Some(child_element) = ElementRef::wrap(child) {
                    copy_element(tree, node, child_element)?;
                }
            }
            _ => {}
        }
    }

    Ok(())
}
