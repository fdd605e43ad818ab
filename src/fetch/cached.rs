use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{FetchError, Fetcher};

/// Serves files from `<cache_dir>/<path>` when present, otherwise delegates to the
/// inner fetcher and stores what it returns.
#[derive(Debug)]
pub struct CachedFetcher<F>
where
    F: Fetcher,
{
    inner: F,
    cache_dir: PathBuf,
}

impl<F> CachedFetcher<F>
where
    F: Fetcher,
{
    pub fn new<P: Into<PathBuf>>(inner: F, cache_dir: P) -> Self {
        Self {
            inner,
            cache_dir: cache_dir.into(),
        }
    }

    fn cache_path(&self, path: &str) -> PathBuf {
        self.cache_dir.join(path.trim_start_matches('/'))
    }

    fn store(&self, cache_path: &Path, content: &[u8]) -> Result<(), FetchError> {
        let to_err = |e: std::io::Error| FetchError::Cache(cache_path.display().to_string(), e.to_string());
        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent).map_err(to_err)?;
        }
        fs::write(cache_path, content).map_err(to_err)
    }
}

impl<F> Fetcher for CachedFetcher<F>
where
    F: Fetcher,
{
    fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let cache_path = self.cache_path(path);
        if let Ok(content) = fs::read(&cache_path) {
            debug!("cache hit for {path}");
            return Ok(content);
        }

        debug!("cache miss for {path}, fetching from source");
        let content = self.inner.fetch(path)?;
        self.store(&cache_path, &content)?;
        Ok(content)
    }
}
