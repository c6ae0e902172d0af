//! HTML → ENML conversion.
//!
//! The passes run in a fixed order and each one assumes the previous ones
//! are complete:
//!
//! 1. checkbox inputs become `en-todo`
//! 2. the content container (`body`) is renamed to `en-note`
//! 3. images become `en-media` according to [`ImageMode`]
//! 4. prohibited elements are stripped from the note
//!
//! Stripping runs last, so `body` and checkbox `input`s (both prohibited in
//! ENML) have already been rewritten by the time it runs; any other `input`
//! is removed.

use enml_core::{MarkupTree, Matcher, NodeId, SerializeOptions};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::html::parse_html;
use crate::options::{ConvertOptions, ImageMode, MediaReference};
use crate::tables::{
    is_prohibited, mime_for, BODY_TAG, ENML_DOCTYPE, IMG_TAG, INPUT_TAG, MEDIA_TAG, NOTE_TAG,
    PROHIBITED_ELEMENTS, TODO_TAG, XML_DECLARATION,
};
use crate::{Error, Result};

/// Trailing `<hash>.<ext>` of an image path
static MEDIA_FILE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|/)([0-9A-Fa-f]+)\.([A-Za-z0-9]+)$").expect("media file name pattern is valid")
});

/// Convert an HTML document to ENML.
///
/// # Example
///
/// ```rust
/// use enml::{to_storage_format, ConvertOptions};
///
/// let enml = to_storage_format("<p>Hi<script>x()</script></p>", &ConvertOptions::default()).unwrap();
/// assert!(enml.ends_with("<en-note><p>Hi</p></en-note>"));
/// ```
pub fn to_storage_format(markup: impl AsRef<[u8]>, options: &ConvertOptions) -> Result<String> {
    options.validate()?;

    let mut tree = parse_html(markup)?;
    convert_todos(&mut tree)?;
    let note = rename_container(&mut tree)?;
    match options.image_mode {
        ImageMode::AppendFromList => append_media_from_list(&mut tree, note, options)?,
        ImageMode::DeriveFromSrc => derive_media_from_src(&mut tree, note)?,
    }
    strip_prohibited(&mut tree, note)?;

    let mut enml = String::with_capacity(256);
    enml.push_str(XML_DECLARATION);
    enml.push('\n');
    enml.push_str(ENML_DOCTYPE);
    enml.push('\n');
    enml.push_str(&tree.serialize(note, &SerializeOptions::xml()));
    Ok(enml)
}

/// Replace checkbox inputs with `en-todo`, keeping the `checked` literal
pub(crate) fn convert_todos(tree: &mut MarkupTree) -> Result<usize> {
    let checkboxes = tree.find_all(&Matcher::tag_with_attr(INPUT_TAG, "type", "checkbox"));

    for &checkbox in &checkboxes {
        let checked = tree.attr(checkbox, "checked").map(str::to_string);
        let todo = tree.new_element(TODO_TAG);
        if let Some(checked) = checked {
            tree.set_attr(todo, "checked", &checked)?;
        }
        tree.replace(checkbox, todo)?;
    }

    tracing::debug!(count = checkboxes.len(), "converted checkboxes to en-todo");
    Ok(checkboxes.len())
}

/// Rename the content container to `en-note` and return it
pub(crate) fn rename_container(tree: &mut MarkupTree) -> Result<NodeId> {
    let container = tree
        .find_first(BODY_TAG)
        .or_else(|| tree.document_element())
        .ok_or_else(|| Error::Parse("document has no elements".to_string()))?;
    tree.rename(container, NOTE_TAG)?;
    Ok(container)
}

/// Drop every image, then append one `en-media` per listed resource
fn append_media_from_list(
    tree: &mut MarkupTree,
    note: NodeId,
    options: &ConvertOptions,
) -> Result<()> {
    let images = tree.find_all(&Matcher::tag(IMG_TAG));
    for &image in &images {
        tree.extract(image)?;
    }

    for resource in &options.resources {
        let media = new_media(tree, &MediaReference::from(resource))?;
        tree.append(note, media)?;
    }

    tracing::debug!(
        removed = images.len(),
        appended = options.resources.len(),
        "appended en-media from resource list"
    );
    Ok(())
}

/// Replace each image in place with the reference encoded in its `src`.
///
/// Images the strip pass would drop anyway are left alone, so their sources
/// never have to parse.
fn derive_media_from_src(tree: &mut MarkupTree, note: NodeId) -> Result<()> {
    let prohibited = Matcher::any_tag_or_attr(PROHIBITED_ELEMENTS);
    let images: Vec<NodeId> = tree
        .find_all_in(note, &Matcher::tag(IMG_TAG))
        .into_iter()
        .filter(|&image| !is_stripped(tree, note, image, &prohibited))
        .collect();

    for &image in &images {
        let src = tree
            .attr(image, "src")
            .ok_or_else(|| Error::InvalidMediaSource("img without src".to_string()))?;
        let mut reference = media_reference_from_src(src)?;
        reference.alt = tree.attr(image, "alt").map(str::to_string);

        let media = new_media(tree, &reference)?;
        tree.replace(image, media)?;
    }

    tracing::debug!(count = images.len(), "derived en-media from img src");
    Ok(())
}

/// Whether `id` or an ancestor below `note` matches the denylist
fn is_stripped(tree: &MarkupTree, note: NodeId, id: NodeId, prohibited: &Matcher) -> bool {
    let mut current = Some(id);
    while let Some(node) = current.filter(|&node| node != note) {
        if tree.element(node).is_some_and(|e| prohibited.matches(e)) {
            return true;
        }
        current = tree.parent(node);
    }
    false
}

/// Read `<hash>.<ext>` from the last path segment of an image source
pub fn media_reference_from_src(src: &str) -> Result<MediaReference> {
    let path = src.split(['?', '#']).next().unwrap_or_default();
    let captures = MEDIA_FILE_NAME
        .captures(path)
        .ok_or_else(|| Error::InvalidMediaSource(src.to_string()))?;

    let extension = &captures[2];
    let mime = mime_for(extension).ok_or_else(|| Error::UnsupportedMimeType(format!(".{extension}")))?;

    Ok(MediaReference {
        hash: captures[1].to_string(),
        mime: mime.to_string(),
        alt: None,
    })
}

fn new_media(tree: &mut MarkupTree, reference: &MediaReference) -> Result<NodeId> {
    let media = tree.new_element_with_attrs(
        MEDIA_TAG,
        [("hash", reference.hash.as_str()), ("type", reference.mime.as_str())],
    );
    if let Some(alt) = &reference.alt {
        tree.set_attr(media, "alt", alt)?;
    }
    Ok(media)
}

/// Remove prohibited elements below the note.
///
/// An element is removed with its subtree when its tag name or any of its
/// attribute names is prohibited. The note itself cannot be removed, so its
/// own prohibited attributes are dropped instead.
pub(crate) fn strip_prohibited(tree: &mut MarkupTree, note: NodeId) -> Result<usize> {
    let prohibited = Matcher::any_tag_or_attr(PROHIBITED_ELEMENTS);
    let matches: Vec<NodeId> = tree
        .find_all_in(note, &prohibited)
        .into_iter()
        .filter(|&id| id != note)
        .collect();

    for &node in &matches {
        tree.extract(node)?;
    }

    let own: Vec<String> = tree
        .element(note)
        .map(|e| {
            e.attributes
                .keys()
                .filter(|name| is_prohibited(name))
                .cloned()
                .collect()
        })
        .unwrap_or_default();
    for name in &own {
        tree.remove_attr(note, name)?;
    }

    tracing::debug!(removed = matches.len(), "stripped prohibited elements");
    Ok(matches.len())
}
