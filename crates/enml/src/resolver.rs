//! Resolving `en-media` references to dereferenceable locations.
//!
//! A [`ResourceResolver`] maps a content hash and MIME type to a locator the
//! HTML side can point an `img` at. [`FileBackedResolver`] keeps a local copy
//! of every resource it has seen and hands out `file://` URLs.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;
use url::Url;

use crate::tables::extension_for;
use crate::{Error, Result};

/// Maps a content hash and MIME type to a locator string
pub trait ResourceResolver {
    fn resolve(&self, hash: &str, mime: &str) -> Result<String>;
}

impl<R: ResourceResolver + ?Sized> ResourceResolver for &R {
    fn resolve(&self, hash: &str, mime: &str) -> Result<String> {
        (**self).resolve(hash, mime)
    }
}

impl<R: ResourceResolver + ?Sized> ResourceResolver for Box<R> {
    fn resolve(&self, hash: &str, mime: &str) -> Result<String> {
        (**self).resolve(hash, mime)
    }
}

impl<R: ResourceResolver + ?Sized> ResourceResolver for Arc<R> {
    fn resolve(&self, hash: &str, mime: &str) -> Result<String> {
        (**self).resolve(hash, mime)
    }
}

/// Upstream that produces the body of a resource from its hash
pub trait ContentSource {
    fn fetch(&self, hash: &str) -> Result<Vec<u8>>;
}

impl<F> ContentSource for F
where
    F: Fn(&str) -> Result<Vec<u8>>,
{
    fn fetch(&self, hash: &str) -> Result<Vec<u8>> {
        self(hash)
    }
}

/// Resolver that saves resources under a directory, once.
///
/// The file for a hash is written at most once: later calls reuse it without
/// contacting the source. Writes go to a temporary file in the same directory
/// that is then linked into place, so concurrent resolvers never observe a
/// partially written file.
#[derive(Debug, Clone)]
pub struct FileBackedResolver<S> {
    base_path: PathBuf,
    source: S,
}

impl<S: ContentSource> FileBackedResolver<S> {
    pub fn new(base_path: impl Into<PathBuf>, source: S) -> Self {
        Self {
            base_path: base_path.into(),
            source,
        }
    }

    /// Directory resources are saved to
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path a resource is (or will be) saved at
    pub fn path_for(&self, hash: &str, mime: &str) -> Result<PathBuf> {
        validate_hash(hash)?;
        let extension =
            extension_for(mime).ok_or_else(|| Error::UnsupportedMimeType(mime.to_string()))?;
        Ok(self.base_path.join(format!("{hash}{extension}")))
    }

    /// Fetch and write the resource unless a copy already exists
    fn save(&self, hash: &str, target: &Path) -> Result<()> {
        if target.is_file() {
            tracing::debug!(hash, path = %target.display(), "resource already saved");
            return Ok(());
        }

        let data = self.source.fetch(hash).map_err(|e| match e {
            Error::ResourceResolution { .. } => e,
            other => Error::ResourceResolution {
                hash: hash.to_string(),
                reason: other.to_string(),
            },
        })?;

        let mut file = NamedTempFile::new_in(&self.base_path)?;
        file.write_all(&data)?;
        file.as_file().sync_all()?;

        match file.persist_noclobber(target) {
            Ok(_) => {
                tracing::info!(hash, bytes = data.len(), path = %target.display(), "saved resource");
                Ok(())
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                tracing::warn!(hash, path = %target.display(), "resource saved concurrently, keeping existing file");
                Ok(())
            }
            Err(e) => Err(Error::Io(e.error)),
        }
    }
}

impl<S: ContentSource> ResourceResolver for FileBackedResolver<S> {
    fn resolve(&self, hash: &str, mime: &str) -> Result<String> {
        let target = self.path_for(hash, mime)?;
        fs::create_dir_all(&self.base_path)?;
        self.save(hash, &target)?;

        let absolute = fs::canonicalize(&target)?;
        let url = Url::from_file_path(&absolute).map_err(|_| Error::ResourceResolution {
            hash: hash.to_string(),
            reason: format!("{} cannot be expressed as a file URL", absolute.display()),
        })?;
        Ok(url.into())
    }
}

/// Hashes name files on disk, so only hex digits are accepted
fn validate_hash(hash: &str) -> Result<()> {
    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidMediaSource(format!(
            "content hash {hash:?} is not a hex string"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_source(calls: &AtomicUsize) -> impl Fn(&str) -> Result<Vec<u8>> + '_ {
        move |hash: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("body of {hash}").into_bytes())
        }
    }

    #[test]
    fn test_resolve_writes_file_and_returns_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nested").join("resources");
        let calls = AtomicUsize::new(0);
        let resolver = FileBackedResolver::new(&base, counting_source(&calls));

        let locator = resolver.resolve("abc123", "image/png").unwrap();

        let path = fs::canonicalize(base.join("abc123.png")).unwrap();
        assert_eq!(locator, Url::from_file_path(&path).unwrap().to_string());
        assert!(locator.starts_with("file:///"));
        assert_eq!(fs::read(&path).unwrap(), b"body of abc123");
    }

    #[test]
    fn test_resolve_fetches_at_most_once() {
        let dir = tempfile::tempdir().unwrap();
        let calls = AtomicUsize::new(0);
        let resolver = FileBackedResolver::new(dir.path(), counting_source(&calls));

        let first = resolver.resolve("abc123", "image/jpeg").unwrap();
        let second = resolver.resolve("abc123", "image/jpeg").unwrap();

        assert_eq!(first, second);
        assert!(first.ends_with("abc123.jpg"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("abc123.gif"), b"cached").unwrap();
        let calls = AtomicUsize::new(0);
        let resolver = FileBackedResolver::new(dir.path(), counting_source(&calls));

        resolver.resolve("abc123", "image/gif").unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(fs::read(dir.path().join("abc123.gif")).unwrap(), b"cached");
    }

    #[test]
    fn test_unsupported_mime_type() {
        let dir = tempfile::tempdir().unwrap();
        let calls = AtomicUsize::new(0);
        let resolver = FileBackedResolver::new(dir.path(), counting_source(&calls));

        let err = resolver.resolve("abc123", "image/bmp").unwrap_err();
        assert!(matches!(err, Error::UnsupportedMimeType(ref m) if m == "image/bmp"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rejects_non_hex_hash() {
        let dir = tempfile::tempdir().unwrap();
        let calls = AtomicUsize::new(0);
        let resolver = FileBackedResolver::new(dir.path(), counting_source(&calls));

        let err = resolver.resolve("../etc/passwd", "image/png").unwrap_err();
        assert!(matches!(err, Error::InvalidMediaSource(_)));
    }

    #[test]
    fn test_source_failure_is_resolution_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = |_: &str| -> Result<Vec<u8>> {
            Err(Error::Io(io::Error::new(io::ErrorKind::TimedOut, "upstream timed out")))
        };
        let resolver = FileBackedResolver::new(dir.path(), source);

        let err = resolver.resolve("abc123", "image/png").unwrap_err();
        match err {
            Error::ResourceResolution { hash, reason } => {
                assert_eq!(hash, "abc123");
                assert!(reason.contains("upstream timed out"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!dir.path().join("abc123.png").exists());
    }
}
