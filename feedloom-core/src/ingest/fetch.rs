//! Fetch collaborator.

use std::fs;
use std::path::PathBuf;

use feedloom_types::FetchError;

/// Produces the raw bytes of a feed.
///
/// Implementations may block; the calling worker waits for as long as it
/// takes. Transport, retries and caching are the implementation's business.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Reads feeds from the local filesystem.
///
/// A `file://` prefix is stripped. Relative paths resolve against the
/// configured root, or the working directory when there is none.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    root: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        let path = url.strip_prefix("file://").unwrap_or(url);
        match &self.root {
            Some(root) => root.join(path),
            None => PathBuf::from(path),
        }
    }
}

impl Fetcher for FileFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        fs::read(self.resolve(url)).map_err(|e| FetchError {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}
