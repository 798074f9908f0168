//! In-memory fakes for source traits (testing only)
//!
//! `MemoryPullRequestSource` satisfies the [`PullRequestSource`] contract
//! without touching the network.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::error::{KepError, Result};
use crate::source::{FetchFailure, PullRequestBatch, PullRequestDocument, PullRequestSource};

// ---------------------------------------------------------------------------
// MemoryPullRequestSource
// ---------------------------------------------------------------------------

/// Pull-request source backed by a `HashMap<group, documents>`.
#[derive(Debug, Default)]
pub struct MemoryPullRequestSource {
    documents: Mutex<HashMap<String, Vec<PullRequestDocument>>>,
    broken: Mutex<HashMap<String, Vec<(String, String)>>>,
    failing: Mutex<HashSet<String>>,
    requests: Mutex<Vec<String>>,
}

impl MemoryPullRequestSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document proposed for `group`.
    pub fn add(&self, group: &str, document: PullRequestDocument) {
        let mut documents = self.documents.lock().unwrap();
        documents.entry(group.to_string()).or_default().push(document);
    }

    /// Report `location` of `group` as unfetchable with `message`.
    pub fn add_broken(&self, group: &str, location: &str, message: &str) {
        let mut broken = self.broken.lock().unwrap();
        broken
            .entry(group.to_string())
            .or_default()
            .push((location.to_string(), message.to_string()));
    }

    /// Make lookups for `group` fail.
    pub fn fail_group(&self, group: &str) {
        self.failing.lock().unwrap().insert(group.to_string());
    }

    /// Groups looked up so far, in call order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PullRequestSource for MemoryPullRequestSource {
    async fn find_documents(&self, group: &str) -> Result<PullRequestBatch> {
        self.requests.lock().unwrap().push(group.to_string());
        if self.failing.lock().unwrap().contains(group) {
            return Err(KepError::GitHub(format!("search for {group} failed")));
        }
        let documents = self.documents.lock().unwrap();
        let broken = self.broken.lock().unwrap();
        Ok(PullRequestBatch {
            documents: documents.get(group).cloned().unwrap_or_default(),
            failures: broken
                .get(group)
                .into_iter()
                .flatten()
                .map(|(location, message)| FetchFailure {
                    location: location.clone(),
                    error: KepError::GitHub(message.clone()),
                })
                .collect(),
        })
    }
}
