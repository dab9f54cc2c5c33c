//! Scope subset matching.

use crate::oauth::types::parse_scope;

/// Returns true when every scope token in `required` is present in `available`.
///
/// An empty `required` scope places no restriction. A missing or empty
/// `available` scope never satisfies a non-empty `required` scope.
pub fn scope_satisfied(required: &str, available: Option<&str>) -> bool {
    let required = parse_scope(required);
    if required.is_empty() {
        return true;
    }

    match available {
        Some(available) => required.is_subset(&parse_scope(available)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_required_always_satisfied() {
        assert!(scope_satisfied("", None));
        assert!(scope_satisfied("   ", Some("")));
        assert!(scope_satisfied("", Some("read write")));
    }

    #[test]
    fn test_empty_available_fails_closed() {
        assert!(!scope_satisfied("read", None));
        assert!(!scope_satisfied("read", Some("")));
        assert!(!scope_satisfied("read", Some("  \t ")));
    }

    #[test]
    fn test_subset() {
        assert!(scope_satisfied("read", Some("read write")));
        assert!(scope_satisfied("write  read", Some("read\twrite")));
        assert!(scope_satisfied("read read", Some("read")));
        assert!(!scope_satisfied("read delete", Some("read write")));
    }

    #[test]
    fn test_tokens_compared_whole() {
        assert!(!scope_satisfied("rea", Some("read")));
        assert!(!scope_satisfied("read", Some("read-only")));
        assert!(!scope_satisfied("Read", Some("read")));
    }
}
