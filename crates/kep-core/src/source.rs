//! Pull-request document source.
//!
//! A [`PullRequestSource`] only discovers raw documents; parsing and
//! validation happen in the query layer so that every document, local or
//! proposed, goes through the same engine and error reporting. In-memory
//! fakes live in [`crate::fakes`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::error::{KepError, Result};

/// A KEP metadata file changed by an open pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestDocument {
    /// Pull request number.
    pub number: u64,
    /// Browser URL of the pull request.
    pub url: String,
    /// Repository path of the file, e.g. `keps/sig-cli/1234-foo/kep.yaml`.
    pub path: String,
    /// Raw file contents at the head of the pull request.
    pub contents: String,
}

/// A pull request or file that was discovered but could not be fetched.
#[derive(Debug)]
pub struct FetchFailure {
    /// Pull request URL or repository file path.
    pub location: String,
    pub error: KepError,
}

/// What one group lookup produced. A failed file does not drop the others.
#[derive(Debug, Default)]
pub struct PullRequestBatch {
    /// Fetched documents, in discovery order.
    pub documents: Vec<PullRequestDocument>,
    pub failures: Vec<FetchFailure>,
}

/// Finds KEP documents proposed in open pull requests.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Documents in open pull requests labelled for `group`.
    ///
    /// `Err` means the group could not be searched at all; failures of
    /// single pull requests or files are returned inside the batch.
    async fn find_documents(&self, group: &str) -> Result<PullRequestBatch>;
}
