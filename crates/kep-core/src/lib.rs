//! KEP Core Library
//!
//! Validation engine and query layer for Kubernetes Enhancement Proposals.
//! Every entry point takes the [`Registry`] by reference; load it once with
//! [`kep_registry::RegistryLoader`] and share it.

pub mod domain;
pub mod fakes;
pub mod github;
pub mod obs;
pub mod parser;
pub mod query;
pub mod repo;
pub mod source;
pub mod telemetry;

pub use domain::{
    rule_for, validate, FieldRule, FieldValue, KepError, Proposal, Provenance, QueryError, Record,
    RecordKey, Result, ValidationError, FIELD_RULES, MANDATORY_KEYS, STAGES, STATUSES,
};

pub use github::{GitHubConfig, GitHubPullRequests, DEFAULT_GITHUB_API};
pub use parser::{parse_proposal, read_proposal, DocumentFormat, METADATA_FILE};
pub use query::{
    resolve_groups, run_query, select_by_regexp, Filter, QueryIssue, QueryOpts, QueryResult,
};
pub use repo::{LocalRepo, KEP_LINK_BASE};
pub use source::{FetchFailure, PullRequestBatch, PullRequestDocument, PullRequestSource};
pub use telemetry::init_tracing;

pub use kep_registry::Registry;
