//! Fixed tables and names shared by both conversion directions.

/// Elements (and attributes) never allowed inside an ENML note.
///
/// Matched exactly against tag names and attribute names.
pub const PROHIBITED_ELEMENTS: &[&str] = &[
    "applet", "base", "basefont", "bgsound", "blink", "body", "button", "dir", "embed", "fieldset",
    "form", "frame", "frameset", "head", "html", "iframe", "ilayer", "input", "isindex", "label",
    "layer", "legend", "link", "marquee", "menu", "meta", "noframes", "noscript", "object", "optgroup",
    "option", "param", "plaintext", "script", "select", "style", "textarea", "xml", "id", "class",
    "onclick", "ondblclick", "on", "accesskey", "data", "dynsrc", "tabindex",
];

/// URL schemes image sources may be fetched from
pub const VALID_URL_PROTOCOLS: &[&str] = &["http", "https", "file"];

/// MIME type to file extension
pub const MIME_EXTENSIONS: &[(&str, &str)] = &[
    ("image/png", ".png"),
    ("image/jpg", ".jpg"),
    ("image/jpeg", ".jpg"),
    ("image/gif", ".gif"),
];

/// Extension to MIME type, used when an image only carries a file name
const EXTENSION_MIMES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
];

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
pub const ENML_DOCTYPE: &str = r#"<!DOCTYPE en-note SYSTEM "http://xml.evernote.com/pub/enml2.dtd">"#;

pub const NOTE_TAG: &str = "en-note";
pub const TODO_TAG: &str = "en-todo";
pub const MEDIA_TAG: &str = "en-media";
pub const BODY_TAG: &str = "body";
pub const HTML_TAG: &str = "html";
pub const INPUT_TAG: &str = "input";
pub const IMG_TAG: &str = "img";

/// File extension (with leading dot) for a MIME type
pub fn extension_for(mime: &str) -> Option<&'static str> {
    MIME_EXTENSIONS
        .iter()
        .find(|(m, _)| *m == mime)
        .map(|(_, ext)| *ext)
}

/// MIME type for a file extension, with or without the leading dot
pub fn mime_for(extension: &str) -> Option<&'static str> {
    let extension = extension.trim_start_matches('.').to_lowercase();
    EXTENSION_MIMES
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// Check if a URL scheme may be fetched
pub fn is_valid_protocol(scheme: &str) -> bool {
    VALID_URL_PROTOCOLS.contains(&scheme)
}

/// Check if a name is in the prohibited set
pub fn is_prohibited(name: &str) -> bool {
    PROHIBITED_ELEMENTS.contains(&name)
}
