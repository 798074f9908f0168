//! Domain models for KEP tooling.
//!
//! Canonical definitions for the core entities:
//! - `Record`: loosely-typed metadata as read from a document
//! - `FieldRule`: the fixed per-field validation rules
//! - `ValidationError`: the schema violation taxonomy
//! - `Proposal`: a validated KEP with display and provenance fields

pub mod error;
pub mod proposal;
pub mod record;
pub mod rules;
pub mod validation;

// Re-export main types and errors
pub use error::{KepError, QueryError, Result, ValidationError};
pub use proposal::{Proposal, Provenance};
pub use record::{FieldValue, Record, RecordKey};
pub use rules::{rule_for, FieldRule, FIELD_RULES, MANDATORY_KEYS, STAGES, STATUSES};
pub use validation::validate;
