//! Statement relevance matching.
//!
//! A statement is relevant to a user when it names one of the user's groups
//! as `group <name>`, `group '<name>'` or `group "<name>"`, compared without
//! regard to case. The check is a plain substring test: a group named
//! `Admin` also matches `group Administrators`. Tightening this to word
//! boundaries would change which statements are reported, so it is kept
//! as-is.
//!
//! # Usage
//!
//! ```
//! use ocipa_core::matcher::RelevanceMatcher;
//!
//! let matcher = RelevanceMatcher::new(["Admins"]);
//! assert!(matcher.is_relevant("Allow group 'admins' to manage all-resources in tenancy"));
//! assert!(!matcher.is_relevant("Allow group Auditors to inspect all-resources in tenancy"));
//! ```

/// Precomputed surface forms for one group.
#[derive(Debug, Clone)]
struct GroupPatterns {
    name: String,
    forms: [String; 3],
}

impl GroupPatterns {
    fn new(name: &str) -> Self {
        let lower = name.to_lowercase();
        Self {
            name: name.to_string(),
            forms: [
                format!("group {lower}"),
                format!("group '{lower}'"),
                format!("group \"{lower}\""),
            ],
        }
    }

    fn matches(&self, statement_lower: &str) -> bool {
        self.forms.iter().any(|form| statement_lower.contains(form.as_str()))
    }
}

/// Decides whether statements reference any of a fixed set of groups.
#[derive(Debug, Clone, Default)]
pub struct RelevanceMatcher {
    groups: Vec<GroupPatterns>,
}

impl RelevanceMatcher {
    /// Build a matcher for the given group names.
    pub fn new<I, S>(group_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            groups: group_names
                .into_iter()
                .map(|name| GroupPatterns::new(name.as_ref()))
                .collect(),
        }
    }

    /// Returns `true` if the matcher has no groups to look for.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The first group (in construction order) that `statement` names.
    pub fn first_match(&self, statement: &str) -> Option<&str> {
        if self.groups.is_empty() {
            return None;
        }
        let lower = statement.to_lowercase();
        self.groups
            .iter()
            .find(|group| group.matches(&lower))
            .map(|group| group.name.as_str())
    }

    pub fn is_relevant(&self, statement: &str) -> bool {
        self.first_match(statement).is_some()
    }
}

/// Returns `true` if `statement` names any of `group_names`.
pub fn is_relevant<I, S>(statement: &str, group_names: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    RelevanceMatcher::new(group_names).is_relevant(statement)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_GROUPS: [&str; 0] = [];

    #[test]
    fn test_bare_group_name() {
        assert!(is_relevant(
            "allow group Admins to manage all-resources in compartment Finance",
            ["Admins"]
        ));
    }

    #[test]
    fn test_quoted_group_names() {
        assert!(is_relevant("allow group 'Net Ops' to use vcns in tenancy", ["Net Ops"]));
        assert!(is_relevant("allow group \"Net Ops\" to use vcns in tenancy", ["Net Ops"]));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(is_relevant("ALLOW GROUP ADMINS TO READ buckets IN TENANCY", ["admins"]));
        assert!(is_relevant("allow group admins to read buckets in tenancy", ["ADMINS"]));
    }

    #[test]
    fn test_substring_match_is_kept() {
        // "Admin" is a prefix of "Administrators": the textual check accepts it.
        assert!(is_relevant(
            "allow group Administrators to manage users in tenancy",
            ["Admin"]
        ));
    }

    #[test]
    fn test_empty_group_set_never_matches() {
        assert!(!is_relevant("allow group Admins to manage all-resources in tenancy", NO_GROUPS));
        assert!(RelevanceMatcher::new(NO_GROUPS).is_empty());
    }

    #[test]
    fn test_no_group_keyword() {
        assert!(!is_relevant("allow any-user to read buckets in tenancy", ["Admins"]));
        assert!(!is_relevant("allow service objectstorage to manage keys in tenancy", ["objectstorage"]));
    }

    #[test]
    fn test_dynamic_group_with_same_name_matches_textually() {
        assert!(is_relevant(
            "allow dynamic-group Admins to read buckets in tenancy",
            ["Admins"]
        ));
    }

    #[test]
    fn test_requires_single_space() {
        assert!(!is_relevant("allow group  Admins to read buckets in tenancy", ["Admins"]));
    }

    #[test]
    fn test_any_of_several_groups() {
        let statement = "allow group Auditors, Admins to inspect all-resources in tenancy";
        assert!(is_relevant(statement, ["Developers", "Auditors"]));
        assert!(!is_relevant(statement, ["Developers"]));
    }

    #[test]
    fn test_first_match_follows_construction_order() {
        let matcher = RelevanceMatcher::new(["Ops", "Auditors"]);
        assert_eq!(
            matcher.first_match("allow group Auditors to read all-resources in tenancy where request.user.name = 'x' or group Ops"),
            Some("Ops")
        );
        assert_eq!(matcher.first_match("allow any-user to read buckets in tenancy"), None);
    }
}
