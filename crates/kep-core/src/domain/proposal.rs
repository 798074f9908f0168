//! Typed KEP model used after validation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;

/// Where a proposal was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    /// Merged into the local enhancements checkout.
    #[default]
    Local,
    /// Proposed in an open pull request.
    PullRequest { number: u64 },
}

/// A Kubernetes Enhancement Proposal.
///
/// Deserialized from metadata that already passed
/// [`validate`](crate::domain::validation::validate), so field types are
/// lenient: blank lists become empty and non-string scalars are stringified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Proposal {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "string_list")]
    pub authors: Vec<String>,
    #[serde(default)]
    pub owning_sig: String,
    #[serde(default, deserialize_with = "string_list")]
    pub participating_sigs: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub reviewers: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub approvers: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub prr_approvers: Vec<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub editor: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub creation_date: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "optional_string")]
    pub stage: Option<String>,
    #[serde(default, deserialize_with = "optional_string")]
    pub latest_milestone: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub see_also: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub replaces: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub superseded_by: Vec<String>,

    /// Directory or file stem the KEP was discovered under.
    #[serde(skip_deserializing)]
    pub name: String,
    #[serde(skip_deserializing)]
    pub link: Option<String>,
    #[serde(skip_deserializing)]
    pub provenance: Provenance,
}

impl Proposal {
    /// Stage as compared by filters; absent stage is the empty string.
    pub fn stage_str(&self) -> &str {
        self.stage.as_deref().unwrap_or("")
    }

    /// Last-updated date for display.
    pub fn last_updated_str(&self) -> &str {
        self.last_updated.as_deref().unwrap_or("")
    }

    pub fn is_from_pull_request(&self) -> bool {
        matches!(self.provenance, Provenance::PullRequest { .. })
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => scalar_to_string(tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(scalar_to_string)
        .filter(|s| !s.is_empty()))
}

fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Sequence(items)) => items.into_iter().filter_map(scalar_to_string).collect(),
        Some(other) => scalar_to_string(other)
            .filter(|s| !s.is_empty())
            .into_iter()
            .collect(),
        None => Vec::new(),
    })
}
