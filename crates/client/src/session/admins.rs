//! Admin allow-list.

use std::collections::BTreeSet;
use std::sync::Arc;

use literacy_census_core::{Email, Identity};

/// Immutable set of lower-cased admin email addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminAllowList(Arc<BTreeSet<String>>);

impl AdminAllowList {
    /// Parse a comma-separated list.
    ///
    /// Entries are trimmed and lower-cased; empty entries are dropped, and
    /// entries that are not email addresses are dropped with a warning.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let emails = raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .filter_map(|entry| match Email::parse(entry) {
                Ok(email) => Some(email.normalized().into_inner()),
                Err(e) => {
                    tracing::warn!(entry, error = %e, "Ignoring invalid admin email");
                    None
                }
            })
            .collect();
        Self(Arc::new(emails))
    }

    /// Whether `email` is on the list, ignoring case and surrounding space.
    #[must_use]
    pub fn contains(&self, email: &str) -> bool {
        self.0.contains(&email.trim().to_lowercase())
    }

    /// The admin predicate: an identity is present and its email is listed.
    #[must_use]
    pub fn is_admin(&self, identity: Option<&Identity>) -> bool {
        identity
            .and_then(|i| i.email.as_deref())
            .is_some_and(|email| self.contains(email))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_lowercases() {
        let list = AdminAllowList::parse("a@x.com, B@X.com");
        assert_eq!(list.iter().collect::<Vec<_>>(), vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn test_empty_and_invalid_entries_dropped() {
        let list = AdminAllowList::parse(" , a@x.com,,not-an-email, ");
        assert_eq!(list.len(), 1);
        assert!(AdminAllowList::parse("").is_empty());
    }

    #[test]
    fn test_is_admin_ignores_case() {
        let list = AdminAllowList::parse("a@x.com, B@X.com");
        let identity = Identity::new("u1").with_email("B@x.com");
        assert!(list.is_admin(Some(&identity)));
    }

    #[test]
    fn test_is_admin_requires_identity_and_email() {
        let list = AdminAllowList::parse("a@x.com");
        assert!(!list.is_admin(None));
        assert!(!list.is_admin(Some(&Identity::new("u1"))));
        assert!(!list.is_admin(Some(&Identity::new("u2").with_email("c@x.com"))));
    }
}
