//! Registry bootstrap
//!
//! Fetches the groups listing and the owners-alias file, either over HTTP or
//! from local copies, and builds a [`Registry`] from them.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::registry::Registry;
use crate::Result;

/// Upstream list of community groups.
pub const DEFAULT_GROUPS_SOURCE: &str =
    "https://raw.githubusercontent.com/kubernetes/community/master/sigs.yaml";

/// Upstream owners-alias file of the enhancements repository.
pub const DEFAULT_ALIASES_SOURCE: &str =
    "https://raw.githubusercontent.com/kubernetes/enhancements/master/OWNERS_ALIASES";

/// Alias holding the production readiness approvers.
pub const PRR_APPROVERS_ALIAS: &str = "prod-readiness-approvers";

/// Where a registry document comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// Fetched with an HTTP GET
    Url(String),
    /// Read from the local filesystem
    File(PathBuf),
}

impl Source {
    /// `http://` and `https://` locations are URLs, anything else is a path.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Source::Url(location.to_string())
        } else {
            Source::File(PathBuf::from(location))
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Url(url) => write!(f, "{url}"),
            Source::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Registry source configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Line-oriented groups listing (`- dir: <group>` entries)
    pub groups_source: Source,
    /// Owners-alias YAML with the PRR approver list
    pub aliases_source: Source,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            groups_source: Source::parse(
                &std::env::var("KEP_SIGS_SOURCE")
                    .unwrap_or_else(|_| DEFAULT_GROUPS_SOURCE.to_string()),
            ),
            aliases_source: Source::parse(
                &std::env::var("KEP_ALIASES_SOURCE")
                    .unwrap_or_else(|_| DEFAULT_ALIASES_SOURCE.to_string()),
            ),
        }
    }
}

impl RegistryConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Config reading both documents from the given locations
    pub fn new(groups: &str, aliases: &str) -> Self {
        RegistryConfig {
            groups_source: Source::parse(groups),
            aliases_source: Source::parse(aliases),
        }
    }

    /// Override the groups listing location
    pub fn with_groups_source(mut self, location: &str) -> Self {
        self.groups_source = Source::parse(location);
        self
    }

    /// Override the owners-alias location
    pub fn with_aliases_source(mut self, location: &str) -> Self {
        self.aliases_source = Source::parse(location);
        self
    }
}

/// Loads a [`Registry`] from its two sources.
pub struct RegistryLoader {
    config: RegistryConfig,
    http_client: reqwest::Client,
}

impl RegistryLoader {
    /// Create a new loader
    pub fn new(config: RegistryConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("kep-registry/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(RegistryLoader {
            config,
            http_client,
        })
    }

    /// Create a loader from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(RegistryConfig::from_env())
    }

    /// Fetch both documents and build the registry.
    ///
    /// Fails on the first unreachable source, non-success status, or
    /// unparsable alias file. Nothing is retried.
    pub async fn load(&self) -> Result<Registry> {
        let listing = self.fetch(&self.config.groups_source).await?;
        let groups = parse_group_listing(&listing);
        if groups.is_empty() {
            warn!(source = %self.config.groups_source, "groups listing contains no groups");
        }

        let aliases = self.fetch(&self.config.aliases_source).await?;
        let approvers = parse_prr_approvers(&aliases)?;
        if approvers.is_empty() {
            warn!(
                source = %self.config.aliases_source,
                alias = PRR_APPROVERS_ALIAS,
                "no PRR approvers found"
            );
        }

        let registry = Registry::new(groups, approvers);
        info!(
            groups = registry.groups().len(),
            approvers = registry.approvers().len(),
            "registry loaded"
        );
        Ok(registry)
    }

    async fn fetch(&self, source: &Source) -> Result<String> {
        debug!(%source, "fetching registry document");
        match source {
            Source::Url(url) => {
                let response = self.http_client.get(url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(RegistryError::BadStatus {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }
                Ok(response.text().await?)
            }
            Source::File(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| RegistryError::Read {
                        path: path.clone(),
                        source,
                    })
            }
        }
    }
}

fn group_dir_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"- dir: (.*)$").expect("static pattern is valid"))
}

/// Extract every `- dir: <group>` identifier from a groups listing, sorted.
pub fn parse_group_listing(listing: &str) -> Vec<String> {
    let pattern = group_dir_pattern();
    let mut groups: Vec<String> = listing
        .lines()
        .filter_map(|line| pattern.captures(line))
        .map(|caps| caps[1].trim().to_string())
        .filter(|group| !group.is_empty())
        .collect();
    groups.sort();
    groups
}

#[derive(Debug, Deserialize)]
struct OwnersAliases {
    #[serde(default)]
    aliases: BTreeMap<String, Option<Vec<String>>>,
}

/// Extract the PRR approver list from an owners-alias document, sorted.
///
/// A document without the alias yields an empty list, as does an alias
/// with no members. A document that is not YAML of the
/// `aliases: {name: [..]}` shape is an error.
pub fn parse_prr_approvers(document: &str) -> Result<Vec<String>> {
    if document.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut parsed: OwnersAliases = serde_yaml::from_str(document)?;
    let mut approvers = parsed
        .aliases
        .remove(PRR_APPROVERS_ALIAS)
        .flatten()
        .unwrap_or_default();
    approvers.sort();
    Ok(approvers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIGS_LISTING: &str = "\
sigs:
  - dir: sig-node
    name: Node
  - dir: sig-apps
    name: Apps
workinggroups:
  - dir: wg-lts
    name: LTS
committees:
  - dir: committee-steering
";

    const OWNERS_ALIASES: &str = "\
aliases:
  sig-node-leads:
    - dchen1107
  prod-readiness-approvers:
    - wojtek-t
    - deads2k
    - johnbelamaric
";

    #[test]
    fn test_parse_group_listing_extracts_and_sorts() {
        let groups = parse_group_listing(SIGS_LISTING);
        assert_eq!(
            groups,
            vec!["committee-steering", "sig-apps", "sig-node", "wg-lts"]
        );
    }

    #[test]
    fn test_parse_group_listing_ignores_other_lines() {
        let groups = parse_group_listing("name: foo\ndir: not-a-list-item\n");
        assert!(groups.is_empty());
    }

    #[test]
    fn test_parse_group_listing_handles_crlf() {
        let groups = parse_group_listing("  - dir: sig-cli\r\n  - dir: sig-auth\r\n");
        assert_eq!(groups, vec!["sig-auth", "sig-cli"]);
    }

    #[test]
    fn test_parse_prr_approvers_sorted() {
        let approvers = parse_prr_approvers(OWNERS_ALIASES).unwrap();
        assert_eq!(approvers, vec!["deads2k", "johnbelamaric", "wojtek-t"]);
    }

    #[test]
    fn test_parse_prr_approvers_missing_alias_is_empty() {
        let approvers = parse_prr_approvers("aliases:\n  other:\n    - someone\n").unwrap();
        assert!(approvers.is_empty());
    }

    #[test]
    fn test_parse_prr_approvers_tolerates_empty_aliases() {
        let document = "aliases:\n  sig-foo-leads:\n  prod-readiness-approvers:\n    - wojtek-t\n";
        assert_eq!(parse_prr_approvers(document).unwrap(), vec!["wojtek-t"]);

        let document = "aliases:\n  prod-readiness-approvers:\n";
        assert!(parse_prr_approvers(document).unwrap().is_empty());
    }

    #[test]
    fn test_parse_prr_approvers_empty_document() {
        assert!(parse_prr_approvers("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_prr_approvers_rejects_wrong_shape() {
        let err = parse_prr_approvers("aliases: [1, 2, 3]\n").unwrap_err();
        assert!(matches!(err, RegistryError::Aliases(_)));
    }

    #[test]
    fn test_source_parse() {
        assert_eq!(
            Source::parse("https://example.com/sigs.yaml"),
            Source::Url("https://example.com/sigs.yaml".to_string())
        );
        assert_eq!(
            Source::parse("./sigs.yaml"),
            Source::File(PathBuf::from("./sigs.yaml"))
        );
    }
}
