//! Conversion options.

use std::fmt;
use std::sync::Arc;

use crate::resolver::ResourceResolver;
use crate::{Error, Result};

/// How images are turned into `en-media` references
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageMode {
    /// Drop every `img` and append one `en-media` per supplied [`Resource`]
    #[default]
    AppendFromList,
    /// Replace each `img` in place, reading hash and type from its
    /// `.../<hash>.<ext>` source path
    DeriveFromSrc,
}

/// A binary attachment of a note, identified by content hash
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Resource {
    /// Hex-encoded content hash
    pub hash: String,

    /// MIME type of the body
    pub mime: String,

    /// Alternate text carried over to `alt`
    pub alt: Option<String>,
}

impl Resource {
    /// Create a resource from a known hash
    pub fn new(hash: &str, mime: &str) -> Self {
        Self {
            hash: hash.to_string(),
            mime: mime.to_string(),
            alt: None,
        }
    }

    /// Create a resource from its body, hashing it with MD5 as the note service does
    pub fn from_bytes(data: &[u8], mime: &str) -> Self {
        Self::new(&format!("{:x}", md5::compute(data)), mime)
    }

    /// Set the alternate text
    pub fn with_alt(mut self, alt: &str) -> Self {
        self.alt = Some(alt.to_string());
        self
    }
}

/// The attributes of an `en-media` element
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaReference {
    pub hash: String,
    pub mime: String,
    pub alt: Option<String>,
}

impl From<&Resource> for MediaReference {
    fn from(resource: &Resource) -> Self {
        Self {
            hash: resource.hash.clone(),
            mime: resource.mime.clone(),
            alt: resource.alt.clone(),
        }
    }
}

/// Options shared by both conversion directions
#[derive(Clone)]
pub struct ConvertOptions {
    /// Image strategy for HTML → ENML
    pub image_mode: ImageMode,

    /// Resources appended as `en-media` in [`ImageMode::AppendFromList`]
    pub resources: Vec<Resource>,

    /// Resolver used by ENML → HTML; `en-media` is kept as-is without one
    pub resolver: Option<Arc<dyn ResourceResolver + Send + Sync>>,

    /// Indent HTML output
    pub pretty: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            image_mode: ImageMode::AppendFromList,
            resources: Vec::new(),
            resolver: None,
            pretty: true,
        }
    }
}

impl fmt::Debug for ConvertOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertOptions")
            .field("image_mode", &self.image_mode)
            .field("resources", &self.resources)
            .field("resolver", &self.resolver.as_ref().map(|_| ".."))
            .field("pretty", &self.pretty)
            .finish()
    }
}

impl ConvertOptions {
    pub fn with_image_mode(mut self, mode: ImageMode) -> Self {
        self.image_mode = mode;
        self
    }

    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_resolver<R>(mut self, resolver: R) -> Self
    where
        R: ResourceResolver + Send + Sync + 'static,
    {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Reject option combinations that cannot both apply
    pub fn validate(&self) -> Result<()> {
        if self.image_mode == ImageMode::DeriveFromSrc && !self.resources.is_empty() {
            return Err(Error::InvalidOptions(format!(
                "{} resources supplied but image mode derives media from img src",
                self.resources.len()
            )));
        }
        Ok(())
    }
}
