use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{FetchError, Fetcher};

/// Reads OCP3 files from a local directory mirroring the host's filesystem root.
#[derive(Debug, Clone)]
pub struct LocalRootFetcher {
    root: PathBuf,
}

impl LocalRootFetcher {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }
}

impl Fetcher for LocalRootFetcher {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let full_path = self.root.join(path.trim_start_matches('/'));
        debug!("reading {}", full_path.display());
        fs::read(&full_path).map_err(|e| FetchError::Read(path.to_string(), e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn reads_paths_relative_to_root() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("etc/origin/master")).unwrap();
        fs::write(dir.path().join("etc/origin/master/htpasswd"), b"admin:x").unwrap();

        let fetcher = LocalRootFetcher::new(dir.path());
        assert_eq!(
            fetcher.fetch("/etc/origin/master/htpasswd").unwrap(),
            b"admin:x".to_vec()
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempdir().unwrap();
        let fetcher = LocalRootFetcher::new(dir.path());
        assert_matches!(fetcher.fetch("/nope"), Err(FetchError::Read(path, _)) => {
            assert_eq!(path, "/nope");
        });
    }
}
