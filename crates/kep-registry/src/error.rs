//! Error types for kep-registry

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while bootstrapping the registry.
///
/// All of these are fatal for the caller: no KEP can be validated without a
/// correct reference set.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// The remote source answered with a non-success status
    #[error("invalid status code when fetching {url}: {status}")]
    BadStatus { url: String, status: u16 },

    /// A local source could not be read
    #[error("unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The owners-alias document is not valid YAML of the expected shape
    #[error("unable to parse aliases content: {0}")]
    Aliases(#[from] serde_yaml::Error),
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        RegistryError::Http(err.to_string())
    }
}
