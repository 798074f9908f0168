//! Structured observability hooks for query runs.
//!
//! - `query_span` scoping every event of one query
//! - `emit_*` functions for the query lifecycle: start, per-document outcome, finish
//!
//! Events are emitted with an `event` field so JSON logs can be filtered on it.

use tracing::{debug, info, warn};

/// Span scoping every event of one query. Attach it to the query future
/// with [`tracing::Instrument`] so it is entered only while the future runs.
///
/// ```ignore
/// async { /* ... */ }.instrument(query_span(&groups)).await
/// // events logged inside carry groups = "sig-cli,sig-node"
/// ```
pub fn query_span(groups: &[String]) -> tracing::Span {
    tracing::info_span!("kep.query", groups = %groups.join(","))
}

/// Emit event: registry loaded with its group and approver counts.
pub fn emit_registry_loaded(groups: usize, approvers: usize) {
    info!(event = "registry.loaded", groups, approvers);
}

/// Emit event: query started over the resolved groups.
pub fn emit_query_started(groups: &[String], include_prs: bool) {
    info!(
        event = "query.started",
        groups = %groups.join(","),
        include_prs,
    );
}

/// Emit event: a document passed validation.
pub fn emit_document_loaded(group: &str, name: &str) {
    debug!(event = "query.document_loaded", group = %group, name = %name);
}

/// Emit event: a document was skipped (warning level).
pub fn emit_document_rejected(group: &str, document: Option<&str>, error: &dyn std::fmt::Display) {
    warn!(
        event = "query.document_rejected",
        group = %group,
        document = document.unwrap_or("-"),
        error = %error,
    );
}

/// Emit event: query finished.
pub fn emit_query_finished(matched: usize, issues: usize, duration_ms: u64) {
    info!(
        event = "query.finished",
        matched,
        issues,
        duration_ms,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_span_create() {
        let span = query_span(&["sig-cli".to_string(), "sig-node".to_string()]);
        let _entered = span.enter();
        emit_query_started(&["sig-cli".to_string()], false);
        emit_query_finished(0, 0, 1);
    }
}
