use std::env::VarError;

pub mod cached;
pub mod local;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    /// The source file could not be read.
    #[error("unable to read `{0}`: `{1}`")]
    Read(String, String),
    /// The fetched content could not be stored in the local cache.
    #[error("unable to write cache file `{0}`: `{1}`")]
    Cache(String, String),
}

/// Retrieves the raw bytes of a file from the OCP3 host being migrated.
pub trait Fetcher {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

// Accept closures as Fetcher implementations
impl<F> Fetcher for F
where
    F: Fn(&str) -> Result<Vec<u8>, FetchError>,
{
    fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        self(path)
    }
}

/// Resolves environment variables referenced by the source configuration.
pub trait EnvReader {
    fn var(&self, name: &str) -> Result<String, VarError>;
}

impl<F> EnvReader for F
where
    F: Fn(&str) -> Result<String, VarError>,
{
    fn var(&self, name: &str) -> Result<String, VarError> {
        self(name)
    }
}
