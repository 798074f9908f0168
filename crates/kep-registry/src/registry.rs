//! Sorted reference lists with binary-search lookup.

/// Valid owning groups and PRR approvers.
///
/// # Invariants
///
/// Both lists are sorted ascending (byte order) at construction and never
/// change afterwards, so lookups are `O(log n)` and the lists can be shown
/// verbatim as the allowed set of a failed check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    groups: Vec<String>,
    approvers: Vec<String>,
}

impl Registry {
    /// Build a registry, sorting both lists.
    pub fn new(mut groups: Vec<String>, mut approvers: Vec<String>) -> Self {
        groups.sort();
        approvers.sort();
        Self { groups, approvers }
    }

    /// All valid groups, ascending.
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// All PRR approvers, ascending.
    pub fn approvers(&self) -> &[String] {
        &self.approvers
    }

    /// Exact, case-sensitive group membership.
    pub fn lookup_group(&self, name: &str) -> bool {
        contains_sorted(&self.groups, name)
    }

    /// Exact, case-sensitive approver membership. A single leading `@` is
    /// ignored, so `@alice` and `alice` are the same approver.
    pub fn lookup_approver(&self, name: &str) -> bool {
        contains_sorted(&self.approvers, strip_handle(name))
    }
}

/// Drop one leading `@` from a GitHub handle.
pub fn strip_handle(name: &str) -> &str {
    name.strip_prefix('@').unwrap_or(name)
}

fn contains_sorted(sorted: &[String], needle: &str) -> bool {
    sorted
        .binary_search_by(|candidate| candidate.as_str().cmp(needle))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn new_sorts_both_lists() {
        let registry = Registry::new(
            strings(&["sig-node", "sig-apps", "committee-steering"]),
            strings(&["wojtek-t", "deads2k", "johnbelamaric"]),
        );
        assert_eq!(
            registry.groups(),
            strings(&["committee-steering", "sig-apps", "sig-node"]).as_slice()
        );
        assert_eq!(
            registry.approvers(),
            strings(&["deads2k", "johnbelamaric", "wojtek-t"]).as_slice()
        );
    }

    #[test]
    fn lookup_group_is_exact() {
        let registry = Registry::new(strings(&["sig-apps", "sig-node"]), vec![]);
        assert!(registry.lookup_group("sig-apps"));
        assert!(!registry.lookup_group("sig-app"));
        assert!(!registry.lookup_group("SIG-APPS"));
        assert!(!registry.lookup_group("zzz"));
        assert!(!registry.lookup_group(""));
    }

    #[test]
    fn lookup_approver_strips_one_at_sign() {
        let registry = Registry::new(vec![], strings(&["alice", "bob"]));
        assert!(registry.lookup_approver("alice"));
        assert!(registry.lookup_approver("@bob"));
        assert!(!registry.lookup_approver("@@bob"));
        assert!(!registry.lookup_approver("Alice"));
    }

    #[test]
    fn empty_registry_matches_nothing() {
        let registry = Registry::default();
        assert!(!registry.lookup_group("sig-apps"));
        assert!(!registry.lookup_approver("alice"));
    }
}
