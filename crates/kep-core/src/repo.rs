//! Local enhancements repository.
//!
//! Layout: `<root>/keps/<group>/` holds one directory per new-style KEP
//! (`NNNN-name/kep.yaml`) and one Markdown file per legacy KEP
//! (`YYYYMMDD-name.md`).

use std::fs;
use std::path::{Path, PathBuf};

use kep_registry::Registry;
use tracing::debug;

use crate::domain::error::{KepError, Result};
use crate::domain::proposal::{Proposal, Provenance};
use crate::parser::{read_proposal, METADATA_FILE};

/// Base URL for links to merged KEPs.
pub const KEP_LINK_BASE: &str = "https://git.k8s.io/enhancements/keps";

const KEPS_DIR: &str = "keps";

/// A checkout of the enhancements repository.
#[derive(Debug, Clone)]
pub struct LocalRepo {
    root: PathBuf,
}

impl LocalRepo {
    /// Use `root` as-is, without checking its layout.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Open `root`, requiring a `keps/` directory inside it.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        if !root.join(KEPS_DIR).is_dir() {
            return Err(KepError::RepoNotFound(root.to_path_buf()));
        }
        Ok(Self::new(root))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the KEPs of `group`.
    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.root.join(KEPS_DIR).join(group)
    }

    /// Names of the KEPs owned by `group`, in lexical order.
    ///
    /// A group without a directory has no KEPs; that is not an error.
    ///
    /// # TDD: test_find_local_keps_mixed_layout
    pub fn find_local_keps(&self, group: &str) -> Result<Vec<String>> {
        let dir = self.group_dir(group);
        if !dir.exists() {
            debug!(group, "no KEP directory for group");
            return Ok(Vec::new());
        }

        let read_err = |source: std::io::Error| KepError::Read {
            path: dir.clone(),
            source,
        };
        let mut entries = fs::read_dir(&dir)
            .map_err(read_err)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(read_err)?;
        entries.sort_by_key(|entry| entry.file_name());

        let mut names = Vec::new();
        for entry in entries {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() {
                names.push(file_name);
            } else if file_name != "README.md" {
                if let Some(stem) = file_name.strip_suffix(".md") {
                    names.push(stem.to_string());
                }
            }
        }
        Ok(names)
    }

    /// Read one KEP of `group`, preferring `<name>/kep.yaml` over `<name>.md`.
    pub fn read_kep(&self, group: &str, name: &str, registry: &Registry) -> Result<Proposal> {
        let dir = self.group_dir(group);
        let metadata = dir.join(name).join(METADATA_FILE);
        let legacy = dir.join(format!("{name}.md"));

        let path = if metadata.is_file() {
            metadata
        } else if legacy.is_file() {
            legacy
        } else {
            return Err(KepError::NotFound {
                group: group.to_string(),
                name: name.to_string(),
            });
        };

        let mut proposal = read_proposal(&path, registry)?;
        proposal.name = name.to_string();
        proposal.link = Some(format!("{KEP_LINK_BASE}/{group}/{name}"));
        proposal.provenance = Provenance::Local;
        Ok(proposal)
    }
}
