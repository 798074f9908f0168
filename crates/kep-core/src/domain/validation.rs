//! KEP metadata validation.
//!
//! Checks a [`Record`] against the fixed rule table in [`super::rules`] and
//! the loaded [`Registry`]. Validation is fail-fast: the first violation is
//! returned and nothing is aggregated.
//!
//! Entries are visited in source order, so when a record has several
//! violations the one reported is the first in the document.

use kep_registry::Registry;

use super::error::ValidationError;
use super::record::{Record, RecordKey};
use super::rules::{rule_for, MANDATORY_KEYS};

/// Validate a KEP metadata record.
///
/// Checks:
/// 1. Every key in `MANDATORY_KEYS` is present (exact match, in order).
/// 2. Every key is a string.
/// 3. Every known field satisfies its `FieldRule`; unknown fields are ignored.
///
/// # Errors
///
/// The first `ValidationError` encountered.
pub fn validate(record: &Record, registry: &Registry) -> Result<(), ValidationError> {
    for &key in MANDATORY_KEYS {
        if !record.contains_key(key) {
            return Err(ValidationError::KeyMustBeSpecified {
                key: key.to_string(),
            });
        }
    }

    for (key, value) in record.iter() {
        let key = match key {
            RecordKey::Text(text) => text,
            RecordKey::NonText(other) => {
                return Err(ValidationError::KeyMustBeString { key: other.clone() });
            }
        };

        if let Some(rule) = rule_for(key) {
            rule.check(key, value, registry)?;
        }
    }

    Ok(())
}
