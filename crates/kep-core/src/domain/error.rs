//! Domain-level error taxonomy for KEP tooling.

use std::path::PathBuf;

use super::record::FieldValue;

/// A single metadata schema violation.
///
/// Each variant carries the offending key, the observed value and, for
/// enumerations, the allowed set in the order it was supplied. The rendered
/// messages are part of the tool's output contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing key {key}")]
    KeyMustBeSpecified { key: String },

    #[error("key {key} must be a string but it is a {}", .key.type_name())]
    KeyMustBeString { key: FieldValue },

    #[error("{key:?} must be a string but it is a {}: {value}", .value.type_name())]
    ValueMustBeString { key: String, value: FieldValue },

    #[error("{key:?} must be one of ({}) but it is a string: {value}", .allowed.join(","))]
    ValueMustBeOneOf {
        key: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("{key:?} must be a list of strings: {value}")]
    ValueMustBeListOfStrings { key: String, value: FieldValue },

    #[error("{key:?} must have a value")]
    MustHaveOneValue { key: String },

    #[error("{key:?} must have at least one value")]
    MustHaveAtLeastOneValue { key: String },
}

impl ValidationError {
    /// The field the violation was reported against.
    pub fn key(&self) -> String {
        match self {
            ValidationError::KeyMustBeString { key } => key.to_string(),
            ValidationError::KeyMustBeSpecified { key }
            | ValidationError::ValueMustBeString { key, .. }
            | ValidationError::ValueMustBeOneOf { key, .. }
            | ValidationError::ValueMustBeListOfStrings { key, .. }
            | ValidationError::MustHaveOneValue { key }
            | ValidationError::MustHaveAtLeastOneValue { key } => key.clone(),
        }
    }
}

/// Errors reading or parsing a single KEP document.
#[derive(Debug, thiserror::Error)]
pub enum KepError {
    #[error("error validating KEP metadata: {0}")]
    Validation(#[from] ValidationError),

    #[error("unable to parse KEP metadata: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("KEP metadata must be a mapping but it is a {0}")]
    NotAMapping(&'static str),

    #[error("no YAML front matter found")]
    MissingFrontMatter,

    #[error("unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("KEP {name} not found for {group}")]
    NotFound { group: String, name: String },

    #[error("no enhancements repository found at {}", .0.display())]
    RepoNotFound(PathBuf),

    #[error("GitHub error: {0}")]
    GitHub(String),
}

impl From<reqwest::Error> for KepError {
    fn from(err: reqwest::Error) -> Self {
        KepError::GitHub(err.to_string())
    }
}

/// Errors that stop a query before any document is read.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("no group matches any of the supplied patterns: {}", .0.join(", "))]
    NoGroupMatch(Vec<String>),

    #[error("invalid group pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Result type for KEP document operations.
pub type Result<T> = std::result::Result<T, KepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        let cases = vec![
            (
                ValidationError::KeyMustBeSpecified {
                    key: "title".to_string(),
                },
                "missing key title",
            ),
            (
                ValidationError::KeyMustBeString {
                    key: FieldValue::Other {
                        type_name: "int",
                        rendered: "42".to_string(),
                    },
                },
                "key 42 must be a string but it is a int",
            ),
            (
                ValidationError::ValueMustBeString {
                    key: "status".to_string(),
                    value: FieldValue::from(vec!["a", "b"]),
                },
                "\"status\" must be a string but it is a list: [a, b]",
            ),
            (
                ValidationError::ValueMustBeOneOf {
                    key: "stage".to_string(),
                    value: "gamma".to_string(),
                    allowed: vec!["alpha".into(), "beta".into(), "stable".into()],
                },
                "\"stage\" must be one of (alpha,beta,stable) but it is a string: gamma",
            ),
            (
                ValidationError::ValueMustBeListOfStrings {
                    key: "authors".to_string(),
                    value: FieldValue::from("@someone"),
                },
                "\"authors\" must be a list of strings: @someone",
            ),
            (
                ValidationError::MustHaveOneValue {
                    key: "title".to_string(),
                },
                "\"title\" must have a value",
            ),
            (
                ValidationError::MustHaveAtLeastOneValue {
                    key: "reviewers".to_string(),
                },
                "\"reviewers\" must have at least one value",
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_kep_error_wraps_validation() {
        let err = KepError::from(ValidationError::MustHaveOneValue {
            key: "title".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "error validating KEP metadata: \"title\" must have a value"
        );
    }

    #[test]
    fn test_no_group_match_lists_patterns() {
        let err = QueryError::NoGroupMatch(vec!["^sig-nope$".to_string(), "xyz".to_string()]);
        assert!(err.to_string().contains("^sig-nope$, xyz"));
    }

    #[test]
    fn test_error_key() {
        let err = ValidationError::ValueMustBeOneOf {
            key: "owning-sig".to_string(),
            value: "sig-awesome".to_string(),
            allowed: vec![],
        };
        assert_eq!(err.key(), "owning-sig");
    }
}
