//! Query and filter KEPs across groups.
//!
//! A query resolves group patterns against the registry, collects the
//! documents of every resolved group (local checkout first, then open pull
//! requests), and keeps those passing the status, stage and PRR approver
//! allow-sets. A document that fails to read or validate is reported as a
//! [`QueryIssue`] and the batch continues.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Instant;

use kep_registry::{strip_handle, Registry};
use regex::Regex;
use serde::Serialize;
use tracing::{debug, Instrument};

use crate::domain::error::QueryError;
use crate::domain::proposal::{Proposal, Provenance};
use crate::obs;
use crate::parser::{parse_proposal, proposal_name, DocumentFormat};
use crate::repo::LocalRepo;
use crate::source::{PullRequestDocument, PullRequestSource};

/// Query criteria. Empty lists mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOpts {
    /// Group selector patterns (unanchored regular expressions).
    pub groups: Vec<String>,
    pub status: Vec<String>,
    pub stage: Vec<String>,
    pub prr_approvers: Vec<String>,
    /// Also collect KEPs proposed in open pull requests.
    pub include_prs: bool,
}

/// Values of `candidates` matching at least one pattern, in `candidates` order.
pub fn select_by_regexp(candidates: &[String], patterns: &[String]) -> Result<Vec<String>, QueryError> {
    let compiled = patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| QueryError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(candidates
        .iter()
        .filter(|candidate| compiled.iter().any(|re| re.is_match(candidate)))
        .cloned()
        .collect())
}

/// Resolve group patterns against the registry.
///
/// No patterns selects every group. Patterns that together match nothing
/// are an error; a single pattern matching nothing is not.
pub fn resolve_groups(registry: &Registry, patterns: &[String]) -> Result<Vec<String>, QueryError> {
    if patterns.is_empty() {
        return Ok(registry.groups().to_vec());
    }
    let groups = select_by_regexp(registry.groups(), patterns)?;
    if groups.is_empty() {
        return Err(QueryError::NoGroupMatch(patterns.to_vec()));
    }
    Ok(groups)
}

/// A document or group that could not be collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryIssue {
    pub group: String,
    /// KEP name or pull-request file path; `None` for group-level failures.
    pub document: Option<String>,
    pub message: String,
}

impl fmt::Display for QueryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.document {
            Some(document) => write!(f, "{}/{}: {}", self.group, document, self.message),
            None => write!(f, "{}: {}", self.group, self.message),
        }
    }
}

/// Proposals that passed every filter, plus what went wrong along the way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub proposals: Vec<Proposal>,
    pub issues: Vec<QueryIssue>,
}

impl QueryResult {
    /// Proposal names in result order.
    pub fn names(&self) -> Vec<&str> {
        self.proposals.iter().map(|p| p.name.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Allow-set filters over collected proposals.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    status: HashSet<String>,
    stage: HashSet<String>,
    prr_approvers: HashSet<String>,
}

impl Filter {
    pub fn from_opts(opts: &QueryOpts) -> Self {
        Self {
            status: opts.status.iter().cloned().collect(),
            stage: opts.stage.iter().cloned().collect(),
            prr_approvers: opts
                .prr_approvers
                .iter()
                .map(|a| strip_handle(a).to_string())
                .collect(),
        }
    }

    /// Every non-empty allow-set must admit the proposal. The PRR set admits
    /// a proposal when any of its approvers is listed.
    pub fn matches(&self, proposal: &Proposal) -> bool {
        if !self.status.is_empty() && !self.status.contains(&proposal.status) {
            return false;
        }
        if !self.stage.is_empty() && !self.stage.contains(proposal.stage_str()) {
            return false;
        }
        if !self.prr_approvers.is_empty()
            && !proposal
                .prr_approvers
                .iter()
                .any(|a| self.prr_approvers.contains(strip_handle(a)))
        {
            return false;
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

struct Collector<'a> {
    registry: &'a Registry,
    proposals: Vec<Proposal>,
    issues: Vec<QueryIssue>,
}

impl Collector<'_> {
    fn issue(&mut self, group: &str, document: Option<String>, error: &dyn fmt::Display) {
        obs::emit_document_rejected(group, document.as_deref(), error);
        self.issues.push(QueryIssue {
            group: group.to_string(),
            document,
            message: error.to_string(),
        });
    }

    fn collect_local(&mut self, repo: &LocalRepo, group: &str) {
        let names = match repo.find_local_keps(group) {
            Ok(names) => names,
            Err(err) => {
                self.issue(group, None, &err);
                return;
            }
        };
        for name in names {
            match repo.read_kep(group, &name, self.registry) {
                Ok(proposal) => {
                    obs::emit_document_loaded(group, &proposal.name);
                    self.proposals.push(proposal);
                }
                Err(err) => self.issue(group, Some(name), &err),
            }
        }
    }

    async fn collect_pull_requests(&mut self, source: &dyn PullRequestSource, group: &str) {
        let batch = match source.find_documents(group).await {
            Ok(batch) => batch,
            Err(err) => {
                self.issue(group, None, &err);
                return;
            }
        };
        for failure in batch.failures {
            self.issue(group, Some(failure.location), &failure.error);
        }
        for document in batch.documents {
            match pull_request_proposal(&document, self.registry) {
                Ok(proposal) => {
                    obs::emit_document_loaded(group, &proposal.name);
                    self.proposals.push(proposal);
                }
                Err(err) => self.issue(group, Some(document.path.clone()), &err),
            }
        }
    }
}

/// Parse and validate a KEP proposed in a pull request.
pub fn pull_request_proposal(
    document: &PullRequestDocument,
    registry: &Registry,
) -> crate::domain::error::Result<Proposal> {
    let mut proposal = parse_proposal(&document.contents, DocumentFormat::Yaml, registry)?;
    proposal.name = proposal_name(Path::new(&document.path));
    proposal.link = Some(document.url.clone());
    proposal.provenance = Provenance::PullRequest {
        number: document.number,
    };
    Ok(proposal)
}

/// Run a query.
///
/// Proposals keep collection order: per resolved group, local KEPs in
/// discovery order followed by pull-request KEPs in discovery order. A KEP
/// with an open pull request appears once per source.
///
/// # TDD: test_run_query_keeps_local_and_pull_request_copies
pub async fn run_query(
    opts: &QueryOpts,
    registry: &Registry,
    repo: &LocalRepo,
    pull_requests: Option<&dyn PullRequestSource>,
) -> Result<QueryResult, QueryError> {
    let started = Instant::now();
    let groups = resolve_groups(registry, &opts.groups)?;
    let span = obs::query_span(&groups);

    async {
        obs::emit_query_started(&groups, opts.include_prs);

        let pull_requests = match (opts.include_prs, pull_requests) {
            (true, None) => {
                debug!("pull requests requested but no source configured");
                None
            }
            (include, source) => source.filter(|_| include),
        };

        let mut collector = Collector {
            registry,
            proposals: Vec::new(),
            issues: Vec::new(),
        };
        for group in &groups {
            collector.collect_local(repo, group);
            if let Some(source) = pull_requests {
                collector.collect_pull_requests(source, group).await;
            }
        }

        let filter = Filter::from_opts(opts);
        let collected = collector.proposals.len();
        let proposals: Vec<Proposal> = collector
            .proposals
            .into_iter()
            .filter(|p| filter.matches(p))
            .collect();
        debug!(collected, kept = proposals.len(), "applied filters");

        obs::emit_query_finished(
            proposals.len(),
            collector.issues.len(),
            started.elapsed().as_millis() as u64,
        );
        Ok(QueryResult {
            proposals,
            issues: collector.issues,
        })
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::MemoryPullRequestSource;
    use std::fs;

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn registry() -> Registry {
        Registry::new(
            groups(&["sig-node", "sig-cli", "sig-api-machinery", "wg-lts"]),
            groups(&["deads2k", "johnbelamaric"]),
        )
    }

    fn proposal(status: &str, stage: Option<&str>, prr: &[&str]) -> Proposal {
        Proposal {
            status: status.to_string(),
            stage: stage.map(str::to_string),
            prr_approvers: groups(prr),
            ..Default::default()
        }
    }

    fn kep(sig: &str, status: &str) -> String {
        format!("title: T\nowning-sig: {sig}\nstatus: {status}\nstage: beta\nprr-approvers: [\"@deads2k\"]\n")
    }

    #[test]
    fn test_select_by_regexp_keeps_candidate_order() {
        let candidates = groups(&["sig-api-machinery", "sig-cli", "sig-node", "wg-lts"]);
        let selected = select_by_regexp(&candidates, &groups(&["node", "^sig-a"])).unwrap();
        assert_eq!(selected, vec!["sig-api-machinery", "sig-node"]);
    }

    #[test]
    fn test_select_by_regexp_invalid_pattern() {
        let err = select_by_regexp(&groups(&["sig-cli"]), &groups(&["sig-("])).unwrap_err();
        assert!(matches!(err, QueryError::InvalidPattern { .. }));
    }

    #[test]
    fn test_resolve_groups() {
        let r = registry();
        assert_eq!(resolve_groups(&r, &[]).unwrap().len(), 4);
        assert_eq!(
            resolve_groups(&r, &groups(&["^sig-cli$", "nothing-here"])).unwrap(),
            vec!["sig-cli"]
        );
        assert!(matches!(
            resolve_groups(&r, &groups(&["nothing", "here"])),
            Err(QueryError::NoGroupMatch(_))
        ));
    }

    #[test]
    fn test_filter_allow_sets() {
        let filter = Filter::from_opts(&QueryOpts {
            status: groups(&["implementable"]),
            stage: groups(&["beta", "stable"]),
            ..Default::default()
        });
        assert!(filter.matches(&proposal("implementable", Some("beta"), &[])));
        assert!(!filter.matches(&proposal("provisional", Some("beta"), &[])));
        assert!(!filter.matches(&proposal("implementable", Some("alpha"), &[])));
        assert!(!filter.matches(&proposal("implementable", None, &[])));
        assert!(Filter::default().matches(&proposal("anything", None, &[])));
    }

    #[test]
    fn test_filter_prr_is_any_match() {
        let filter = Filter::from_opts(&QueryOpts {
            prr_approvers: groups(&["deads2k", "@wojtek-t"]),
            ..Default::default()
        });
        assert!(filter.matches(&proposal("x", None, &["@johnbelamaric", "@deads2k"])));
        assert!(filter.matches(&proposal("x", None, &["wojtek-t"])));
        assert!(!filter.matches(&proposal("x", None, &["@johnbelamaric"])));
        assert!(!filter.matches(&proposal("x", None, &[])));
    }

    #[test]
    fn test_query_issue_display() {
        let issue = QueryIssue {
            group: "sig-cli".into(),
            document: Some("123-x".into()),
            message: "missing key title".into(),
        };
        assert_eq!(issue.to_string(), "sig-cli/123-x: missing key title");
    }

    #[tokio::test]
    async fn test_run_query_keeps_local_and_pull_request_copies() {
        let dir = tempfile::tempdir().unwrap();
        let group = dir.path().join("keps").join("sig-cli");
        fs::create_dir_all(group.join("100-local")).unwrap();
        fs::write(group.join("100-local").join("kep.yaml"), kep("sig-cli", "implementable")).unwrap();
        let repo = LocalRepo::open(dir.path()).unwrap();

        let source = MemoryPullRequestSource::new();
        source.add(
            "sig-cli",
            PullRequestDocument {
                number: 9,
                url: "https://github.com/kubernetes/enhancements/pull/9".into(),
                path: "keps/sig-cli/100-local/kep.yaml".into(),
                contents: kep("sig-cli", "implementable"),
            },
        );

        let opts = QueryOpts {
            groups: groups(&["sig-cli"]),
            include_prs: true,
            ..Default::default()
        };
        let result = run_query(&opts, &registry(), &repo, Some(&source)).await.unwrap();

        assert_eq!(result.names(), vec!["100-local", "100-local"]);
        assert_eq!(result.proposals[0].provenance, Provenance::Local);
        assert_eq!(
            result.proposals[1].provenance,
            Provenance::PullRequest { number: 9 }
        );
        assert_eq!(
            result.proposals[1].link.as_deref(),
            Some("https://github.com/kubernetes/enhancements/pull/9")
        );
        assert!(result.issues.is_empty());
    }

    #[tokio::test]
    async fn test_run_query_skips_pull_requests_unless_requested() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("keps")).unwrap();
        let repo = LocalRepo::open(dir.path()).unwrap();
        let source = MemoryPullRequestSource::new();

        let opts = QueryOpts {
            groups: groups(&["sig-cli"]),
            ..Default::default()
        };
        let result = run_query(&opts, &registry(), &repo, Some(&source)).await.unwrap();
        assert!(result.proposals.is_empty());
        assert!(source.requests().is_empty());
    }

    #[tokio::test]
    async fn test_run_query_unfetchable_file_keeps_other_pull_requests() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("keps")).unwrap();
        let repo = LocalRepo::open(dir.path()).unwrap();

        let source = MemoryPullRequestSource::new();
        source.add(
            "sig-cli",
            PullRequestDocument {
                number: 1,
                url: "https://github.com/kubernetes/enhancements/pull/1".into(),
                path: "keps/sig-cli/1-first/kep.yaml".into(),
                contents: kep("sig-cli", "provisional"),
            },
        );
        source.add_broken(
            "sig-cli",
            "keps/sig-cli/2-second/kep.yaml",
            "fetching raw file failed with status 500",
        );

        let opts = QueryOpts {
            groups: groups(&["^sig-cli$"]),
            include_prs: true,
            ..Default::default()
        };
        let result = run_query(&opts, &registry(), &repo, Some(&source)).await.unwrap();

        assert_eq!(result.names(), vec!["1-first"]);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(
            result.issues[0].document.as_deref(),
            Some("keps/sig-cli/2-second/kep.yaml")
        );
        assert_eq!(
            result.issues[0].message,
            "GitHub error: fetching raw file failed with status 500"
        );
    }

    #[test]
    fn test_run_query_future_is_send() {
        fn assert_send<T: Send>(_: T) {}
        let registry = registry();
        let repo = LocalRepo::new("/nonexistent");
        let opts = QueryOpts::default();
        assert_send(run_query(&opts, &registry, &repo, None));
    }

    #[tokio::test]
    async fn test_run_query_records_pull_request_failures() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("keps")).unwrap();
        let repo = LocalRepo::open(dir.path()).unwrap();

        let source = MemoryPullRequestSource::new();
        source.fail_group("sig-cli");
        source.add(
            "sig-node",
            PullRequestDocument {
                number: 3,
                url: "https://github.com/kubernetes/enhancements/pull/3".into(),
                path: "keps/sig-node/3-bad/kep.yaml".into(),
                contents: "title: only a title\n".into(),
            },
        );

        let opts = QueryOpts {
            groups: groups(&["^sig-cli$", "^sig-node$"]),
            include_prs: true,
            ..Default::default()
        };
        let result = run_query(&opts, &registry(), &repo, Some(&source)).await.unwrap();

        assert!(result.proposals.is_empty());
        assert_eq!(result.issues.len(), 2);
        // Registry order: sig-cli sorts before sig-node.
        assert_eq!(result.issues[0].group, "sig-cli");
        assert_eq!(result.issues[0].document, None);
        assert_eq!(result.issues[1].document.as_deref(), Some("keps/sig-node/3-bad/kep.yaml"));
        assert_eq!(
            result.issues[1].message,
            "error validating KEP metadata: missing key owning-sig"
        );
    }
}
