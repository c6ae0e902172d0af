//! Loading the images of an HTML document as note resources.
//!
//! Used to build the resource list for
//! [`ImageMode::AppendFromList`](crate::ImageMode::AppendFromList): every
//! `img` is loaded, hashed and typed so the caller can upload it and pass the
//! list to the conversion.

use std::fs;
use std::path::Path;

use enml_core::Matcher;
use url::Url;

use crate::html::parse_html;
use crate::options::Resource;
use crate::tables::{is_valid_protocol, mime_for, IMG_TAG};
use crate::{Error, Result};

/// Fetches the body of a remote (`http`/`https`) image
pub trait UrlFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Load every image of an HTML document, in document order.
///
/// - `src` starting with `/` is read from `resource_dir` by its file name
/// - `file:` URLs are read from disk
/// - `http:`/`https:` URLs go through `fetcher`; without one they fail
///
/// Other schemes are rejected with [`Error::UnsupportedProtocol`].
pub fn collect_images(
    markup: impl AsRef<[u8]>,
    resource_dir: &Path,
    fetcher: Option<&dyn UrlFetcher>,
) -> Result<Vec<Resource>> {
    let tree = parse_html(markup)?;
    let images = tree.find_all(&Matcher::tag(IMG_TAG));
    let mut resources = Vec::with_capacity(images.len());

    for image in images {
        let src = tree
            .attr(image, "src")
            .ok_or_else(|| Error::InvalidMediaSource("img without src".to_string()))?;

        let mime = mime_for(extension_of(src))
            .ok_or_else(|| Error::UnsupportedMimeType(format!("image at {src}")))?;
        let data = load(src, resource_dir, fetcher)?;

        let mut resource = Resource::from_bytes(&data, mime);
        resource.alt = tree.attr(image, "alt").map(str::to_string);
        tracing::debug!(src, hash = %resource.hash, bytes = data.len(), "loaded image");
        resources.push(resource);
    }

    Ok(resources)
}

/// Extension of the last path segment, query and fragment ignored
fn extension_of(src: &str) -> &str {
    let path = src.split(['?', '#']).next().unwrap_or_default();
    let name = path.rsplit('/').next().unwrap_or_default();
    match name.rsplit_once('.') {
        Some((_, extension)) => extension,
        None => "",
    }
}

fn load(src: &str, resource_dir: &Path, fetcher: Option<&dyn UrlFetcher>) -> Result<Vec<u8>> {
    if src.starts_with('/') {
        let name = src.rsplit('/').next().unwrap_or_default();
        return Ok(fs::read(resource_dir.join(name))?);
    }

    let url = Url::parse(src).map_err(|e| Error::InvalidMediaSource(format!("{src}: {e}")))?;
    if !is_valid_protocol(url.scheme()) {
        return Err(Error::UnsupportedProtocol(url.scheme().to_string()));
    }

    match url.scheme() {
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| Error::InvalidMediaSource(src.to_string()))?;
            Ok(fs::read(path)?)
        }
        _ => match fetcher {
            Some(fetcher) => fetcher.fetch(&url),
            None => Err(Error::Fetch {
                url: url.to_string(),
                reason: "no fetcher configured for remote images".to_string(),
            }),
        },
    }
}

/// Blocking HTTP fetcher backed by reqwest
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("enml/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Fetch {
                url: String::new(),
                reason: format!("failed to build http client: {e}"),
            })?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl UrlFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        let fetch_error = |reason: String| Error::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| fetch_error(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_error(format!("status {}", response.status())));
        }

        let body = response.bytes().map_err(|e| fetch_error(e.to_string()))?;
        Ok(body.to_vec())
    }
}
