//! ENML → HTML conversion.

use enml_core::{MarkupTree, Matcher, NodeId, SerializeOptions};

use crate::options::ConvertOptions;
use crate::resolver::ResourceResolver;
use crate::tables::{BODY_TAG, HTML_TAG, IMG_TAG, INPUT_TAG, MEDIA_TAG, NOTE_TAG, TODO_TAG};
use crate::xml::parse_xml;
use crate::{Error, Result};

/// Convert an ENML document to HTML.
///
/// `en-media` elements are only rewritten when `options.resolver` is set; a
/// failing resolver aborts the whole conversion.
///
/// # Example
///
/// ```rust
/// use enml::{to_markup_format, ConvertOptions};
///
/// let html = to_markup_format(
///     "<en-note><en-todo/>buy milk</en-note>",
///     false,
///     &ConvertOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(
///     html,
///     r#"<html><body><input type="checkbox" disabled="true">buy milk</body></html>"#
/// );
/// ```
pub fn to_markup_format(
    storage: impl AsRef<[u8]>,
    pretty: bool,
    options: &ConvertOptions,
) -> Result<String> {
    options.validate()?;

    let mut tree = parse_xml(storage)?;
    convert_todos(&mut tree)?;
    if let Some(resolver) = &options.resolver {
        resolve_media(&mut tree, &**resolver)?;
    }
    let html = wrap_note(&mut tree)?;

    Ok(tree.serialize(html, &SerializeOptions::html().with_pretty(pretty)))
}

/// Replace `en-todo` with a disabled checkbox, keeping the `checked` literal
fn convert_todos(tree: &mut MarkupTree) -> Result<usize> {
    let todos = tree.find_all(&Matcher::tag(TODO_TAG));

    for &todo in &todos {
        let checked = tree.attr(todo, "checked").map(str::to_string);
        let checkbox =
            tree.new_element_with_attrs(INPUT_TAG, [("type", "checkbox"), ("disabled", "true")]);
        if let Some(checked) = checked {
            tree.set_attr(checkbox, "checked", &checked)?;
        }
        tree.replace(todo, checkbox)?;
    }

    tracing::debug!(count = todos.len(), "converted en-todo to checkboxes");
    Ok(todos.len())
}

/// Replace `en-media` with images pointing at resolved locations
fn resolve_media(tree: &mut MarkupTree, resolver: &dyn ResourceResolver) -> Result<usize> {
    let media = tree.find_all(&Matcher::tag(MEDIA_TAG));

    for &element in &media {
        let hash = required_attr(tree, element, "hash")?;
        let mime = required_attr(tree, element, "type")?;
        let locator = resolver.resolve(&hash, &mime)?;

        let image = tree.new_element_with_attrs(IMG_TAG, [("src", locator)]);
        if let Some(alt) = tree.attr(element, "alt").map(str::to_string) {
            tree.set_attr(image, "alt", &alt)?;
        }
        tree.replace(element, image)?;
    }

    tracing::debug!(count = media.len(), "resolved en-media to images");
    Ok(media.len())
}

fn required_attr(tree: &MarkupTree, id: NodeId, name: &str) -> Result<String> {
    tree.attr(id, name)
        .map(str::to_string)
        .ok_or_else(|| Error::InvalidMediaSource(format!("{MEDIA_TAG} without {name}")))
}

/// Rename `en-note` to `body` and place it under a new `html` root
fn wrap_note(tree: &mut MarkupTree) -> Result<NodeId> {
    let note = tree
        .find_first(NOTE_TAG)
        .ok_or_else(|| Error::Parse(format!("document has no {NOTE_TAG} element")))?;
    tree.rename(note, BODY_TAG)?;

    let html = tree.new_element(HTML_TAG);
    tree.append(html, note)?;
    let root = tree.root();
    tree.append(root, html)?;
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapResolver(HashMap<(String, String), String>);

    impl MapResolver {
        fn with(hash: &str, mime: &str, locator: &str) -> Self {
            let mut map = HashMap::new();
            map.insert((hash.to_string(), mime.to_string()), locator.to_string());
            Self(map)
        }
    }

    impl ResourceResolver for MapResolver {
        fn resolve(&self, hash: &str, mime: &str) -> Result<String> {
            self.0
                .get(&(hash.to_string(), mime.to_string()))
                .cloned()
                .ok_or_else(|| Error::ResourceResolution {
                    hash: hash.to_string(),
                    reason: "not found".to_string(),
                })
        }
    }

    fn compact(enml: &str, options: &ConvertOptions) -> Result<String> {
        to_markup_format(enml, false, options)
    }

    #[test]
    fn test_todos() {
        let html = compact(
            r#"<en-note><en-todo checked="true"/>a<en-todo/>b</en-note>"#,
            &ConvertOptions::default(),
        )
        .unwrap();
        assert_eq!(
            html,
            r#"<html><body><input type="checkbox" disabled="true" checked="true">a<input type="checkbox" disabled="true">b</body></html>"#
        );
    }

    #[test]
    fn test_media_resolved() {
        let options = ConvertOptions::default()
            .with_resolver(MapResolver::with("abc123", "image/png", "file:///tmp/x.png"));
        let html = compact(
            r#"<en-note><div><en-media hash="abc123" type="image/png" alt="pic"/></div></en-note>"#,
            &options,
        )
        .unwrap();
        assert_eq!(
            html,
            r#"<html><body><div><img src="file:///tmp/x.png" alt="pic"></div></body></html>"#
        );
    }

    #[test]
    fn test_media_untouched_without_resolver() {
        let html = compact(
            r#"<en-note><en-media hash="abc123" type="image/png"/></en-note>"#,
            &ConvertOptions::default(),
        )
        .unwrap();
        assert_eq!(
            html,
            r#"<html><body><en-media hash="abc123" type="image/png"></en-media></body></html>"#
        );
    }

    #[test]
    fn test_resolver_failure_aborts() {
        let options = ConvertOptions::default()
            .with_resolver(MapResolver::with("abc123", "image/png", "file:///tmp/x.png"));
        let err = compact(
            r#"<en-note><en-media hash="abc123" type="image/png"/><en-media hash="ffff" type="image/png"/></en-note>"#,
            &options,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ResourceResolution { ref hash, .. } if hash == "ffff"));
    }

    #[test]
    fn test_media_without_hash() {
        let options = ConvertOptions::default()
            .with_resolver(MapResolver::with("abc123", "image/png", "file:///tmp/x.png"));
        let err = compact(r#"<en-note><en-media type="image/png"/></en-note>"#, &options).unwrap_err();
        assert!(matches!(err, Error::InvalidMediaSource(_)));
    }

    #[test]
    fn test_note_attributes_kept() {
        let html = compact(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE en-note SYSTEM "http://xml.evernote.com/pub/enml2.dtd">
<en-note style="word-wrap: break-word;">hi</en-note>"#,
            &ConvertOptions::default(),
        )
        .unwrap();
        assert_eq!(
            html,
            r#"<html><body style="word-wrap: break-word;">hi</body></html>"#
        );
    }

    #[test]
    fn test_pretty() {
        let html = to_markup_format(
            "<en-note><div>a</div><en-todo/></en-note>",
            true,
            &ConvertOptions::default(),
        )
        .unwrap();
        assert_eq!(
            html,
            "<html>\n <body>\n  <div>\n   a\n  </div>\n  <input type=\"checkbox\" disabled=\"true\">\n </body>\n</html>"
        );
    }

    #[test]
    fn test_missing_note() {
        let err = compact("<div>x</div>", &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_malformed() {
        let err = compact("<en-note><div></en-note>", &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
