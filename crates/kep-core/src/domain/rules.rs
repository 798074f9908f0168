//! Field rule table.
//!
//! Every known metadata field maps to exactly one [`FieldRule`]. Fields that
//! are not in [`FIELD_RULES`] are accepted without checks.

use kep_registry::{strip_handle, Registry};

use super::error::ValidationError;
use super::record::FieldValue;

/// Keys that must be present in every KEP, checked in this order.
pub const MANDATORY_KEYS: &[&str] = &["title", "owning-sig"];

/// Lifecycle states, in declaration order.
pub const STATUSES: &[&str] = &[
    "provisional",
    "implementable",
    "implemented",
    "deferred",
    "rejected",
    "withdrawn",
    "replaced",
];

/// Maturity stages, in declaration order.
pub const STAGES: &[&str] = &["alpha", "beta", "stable"];

/// How a single field is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRule {
    /// Non-empty string.
    MandatoryString,
    /// Null or empty is accepted; anything else must be a non-empty string.
    OptionalString,
    /// String containing one of the listed tokens anywhere in it.
    ///
    /// The match is deliberately unanchored: `pre-implementable-draft`
    /// satisfies the status rule. Existing KEPs depend on this.
    EnumSubstring(&'static [&'static str]),
    /// String naming a registry group.
    RegistryGroup,
    /// Non-empty list of strings.
    RequiredStringList,
    /// Null, `""` or `[]`, otherwise a list of strings.
    OptionalStringList,
    /// Like `OptionalStringList`, every entry a registry group.
    RegistryGroupList,
    /// List of registry approvers, each optionally written as `@handle`.
    PrefixedApproverList,
}

/// The fixed rule table, keyed by lower-case field name.
pub const FIELD_RULES: &[(&str, FieldRule)] = &[
    ("status", FieldRule::EnumSubstring(STATUSES)),
    ("stage", FieldRule::EnumSubstring(STAGES)),
    ("owning-sig", FieldRule::RegistryGroup),
    ("editor", FieldRule::OptionalString),
    ("title", FieldRule::MandatoryString),
    ("creation-date", FieldRule::MandatoryString),
    ("last-updated", FieldRule::MandatoryString),
    ("participating-sigs", FieldRule::RegistryGroupList),
    ("replaces", FieldRule::OptionalStringList),
    ("superseded-by", FieldRule::OptionalStringList),
    ("see-also", FieldRule::OptionalStringList),
    ("authors", FieldRule::RequiredStringList),
    ("reviewers", FieldRule::RequiredStringList),
    ("approvers", FieldRule::RequiredStringList),
    ("prr-approvers", FieldRule::PrefixedApproverList),
];

/// Look up the rule for a field name, ignoring case.
pub fn rule_for(key: &str) -> Option<FieldRule> {
    let lower = key.to_lowercase();
    FIELD_RULES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, rule)| *rule)
}

impl FieldRule {
    /// Check one value. `key` is reported verbatim in any error.
    pub fn check(
        &self,
        key: &str,
        value: &FieldValue,
        registry: &Registry,
    ) -> Result<(), ValidationError> {
        match self {
            FieldRule::MandatoryString => check_string(key, value),
            FieldRule::OptionalString => match value {
                FieldValue::Null => Ok(()),
                FieldValue::String(s) if s.is_empty() => Ok(()),
                _ => check_string(key, value),
            },
            FieldRule::EnumSubstring(allowed) => {
                let text = scalar_text(key, value)?;
                if allowed.iter().any(|token| text.contains(token)) {
                    Ok(())
                } else {
                    Err(ValidationError::ValueMustBeOneOf {
                        key: key.to_string(),
                        value: text,
                        allowed: allowed.iter().map(|s| s.to_string()).collect(),
                    })
                }
            }
            FieldRule::RegistryGroup => {
                let text = scalar_text(key, value)?;
                check_group(key, &text, registry)
            }
            FieldRule::RequiredStringList => match value {
                FieldValue::List(items) if items.is_empty() => {
                    Err(ValidationError::MustHaveAtLeastOneValue {
                        key: key.to_string(),
                    })
                }
                _ => string_list(key, value).map(|_| ()),
            },
            FieldRule::OptionalStringList => {
                if is_blank(value) {
                    return Ok(());
                }
                string_list(key, value).map(|_| ())
            }
            FieldRule::RegistryGroupList => {
                if is_blank(value) {
                    return Ok(());
                }
                for group in string_list(key, value)? {
                    check_group(key, group, registry)?;
                }
                Ok(())
            }
            FieldRule::PrefixedApproverList => {
                if value.is_null() {
                    return Ok(());
                }
                for approver in string_list(key, value)? {
                    if !registry.lookup_approver(approver) {
                        return Err(ValidationError::ValueMustBeOneOf {
                            key: key.to_string(),
                            value: strip_handle(approver).to_string(),
                            allowed: registry.approvers().to_vec(),
                        });
                    }
                }
                Ok(())
            }
        }
    }
}

fn check_string(key: &str, value: &FieldValue) -> Result<(), ValidationError> {
    match value {
        FieldValue::String(s) if s.is_empty() => Err(ValidationError::MustHaveOneValue {
            key: key.to_string(),
        }),
        FieldValue::String(_) => Ok(()),
        _ => Err(ValidationError::ValueMustBeString {
            key: key.to_string(),
            value: value.clone(),
        }),
    }
}

/// Text of a scalar that is compared against an allowed set. Lists are
/// rejected outright; any other non-string counts as the empty string and
/// so fails the membership check.
fn scalar_text(key: &str, value: &FieldValue) -> Result<String, ValidationError> {
    match value {
        FieldValue::List(_) => Err(ValidationError::ValueMustBeString {
            key: key.to_string(),
            value: value.clone(),
        }),
        FieldValue::String(s) => Ok(s.clone()),
        FieldValue::Null | FieldValue::Other { .. } => Ok(String::new()),
    }
}

fn check_group(key: &str, group: &str, registry: &Registry) -> Result<(), ValidationError> {
    if registry.lookup_group(group) {
        Ok(())
    } else {
        Err(ValidationError::ValueMustBeOneOf {
            key: key.to_string(),
            value: group.to_string(),
            allowed: registry.groups().to_vec(),
        })
    }
}

fn is_blank(value: &FieldValue) -> bool {
    match value {
        FieldValue::Null => true,
        FieldValue::String(s) => s.is_empty(),
        FieldValue::List(items) => items.is_empty(),
        FieldValue::Other { .. } => false,
    }
}

fn string_list<'v>(key: &str, value: &'v FieldValue) -> Result<Vec<&'v str>, ValidationError> {
    let not_a_list = || ValidationError::ValueMustBeListOfStrings {
        key: key.to_string(),
        value: value.clone(),
    };
    match value {
        FieldValue::List(items) => items
            .iter()
            .map(|item| item.as_str().ok_or_else(not_a_list))
            .collect(),
        _ => Err(not_a_list()),
    }
}
