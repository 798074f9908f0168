//! KEP-Registry: reference lists for KEP validation
//!
//! Holds the two externally maintained lists every KEP is checked against:
//! the valid owning groups (SIGs, WGs, UGs, committees) and the production
//! readiness approvers.
//!
//! ## Lifecycle
//!
//! A [`Registry`] is built once at program start by [`RegistryLoader`] and is
//! read-only afterwards. It is passed by reference into validation and query
//! calls; there is no process-wide state.

pub mod error;
pub mod loader;
pub mod registry;

pub use error::RegistryError;
pub use loader::{
    parse_group_listing, parse_prr_approvers, RegistryConfig, RegistryLoader, Source,
    DEFAULT_ALIASES_SOURCE, DEFAULT_GROUPS_SOURCE,
};
pub use registry::{strip_handle, Registry};

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
