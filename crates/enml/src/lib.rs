//! # enml
//!
//! Convert between HTML and ENML, the restricted XML dialect Evernote stores
//! note content in.
//!
//! ## Design
//!
//! Both directions parse the input into an [`enml_core::MarkupTree`], rewrite
//! it in place and serialize it again:
//!
//! - **HTML → ENML**: checkboxes become `en-todo`, images become `en-media`
//!   references, `body` becomes `en-note` and prohibited elements are stripped.
//! - **ENML → HTML**: `en-todo` becomes a disabled checkbox and, when a
//!   [`ResourceResolver`] is configured, `en-media` becomes an `img` whose
//!   `src` points at the resolved resource.
//!
//! Every call builds its own tree, so conversions can run concurrently.
//!
//! ## Example
//!
//! ```rust
//! use enml::{ConvertOptions, Resource, to_markup_format, to_storage_format};
//!
//! let options = ConvertOptions::default()
//!     .with_resources(vec![Resource::new("abc123", "image/png")]);
//!
//! let enml = to_storage_format(
//!     r#"<p><input type="checkbox" checked="checked"> milk</p><img src="x.png">"#,
//!     &options,
//! )
//! .unwrap();
//! assert!(enml.contains(r#"<en-todo checked="checked"/>"#));
//! assert!(enml.contains(r#"<en-media hash="abc123" type="image/png"/>"#));
//!
//! let html = to_markup_format(&enml, false, &ConvertOptions::default()).unwrap();
//! assert!(html.contains(r#"<input type="checkbox" disabled="true" checked="checked">"#));
//! ```

pub mod forward;
pub mod html;
pub mod media;
mod options;
pub mod resolver;
pub mod reverse;
mod service;
pub mod tables;
pub mod xml;

pub use enml_core::{MarkupTree, Matcher, NodeId, SerializeOptions, Syntax};
pub use forward::to_storage_format;
pub use html::parse_html;
pub use media::{collect_images, UrlFetcher};
#[cfg(feature = "http")]
pub use media::HttpFetcher;
pub use options::{ConvertOptions, ImageMode, MediaReference, Resource};
pub use resolver::{ContentSource, FileBackedResolver, ResourceResolver};
pub use reverse::to_markup_format;
pub use service::EnmlService;
pub use xml::parse_xml;

/// Error type for conversion operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported MIME type: {0}")]
    UnsupportedMimeType(String),

    #[error("Failed to resolve resource {hash}: {reason}")]
    ResourceResolution { hash: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid media source: {0}")]
    InvalidMediaSource(String),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Unsupported URL protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Tree error: {0}")]
    Tree(#[from] enml_core::TreeError),
}

pub type Result<T> = std::result::Result<T, Error>;
