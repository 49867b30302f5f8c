//! Canonical roles and normalization of raw upstream role strings.

use serde::{Deserialize, Serialize};

/// The gateway's closed role vocabulary, one of which is derived per
/// request from whatever role strings the upstream handed out.
///
/// Privilege order, descending:
/// `Administrator > SeoManager > Editor > SeoEditor > Author > Contributor
/// > Subscriber > Public`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalRole {
    Administrator,
    SeoManager,
    Editor,
    SeoEditor,
    Author,
    Contributor,
    Subscriber,
    Public,
}

/// Descending privilege order. Normalization picks the first of these that
/// the raw role list maps onto, so list ordering in the session can never
/// influence the outcome.
const PRIORITY: [CanonicalRole; 8] = [
    CanonicalRole::Administrator,
    CanonicalRole::SeoManager,
    CanonicalRole::Editor,
    CanonicalRole::SeoEditor,
    CanonicalRole::Author,
    CanonicalRole::Contributor,
    CanonicalRole::Subscriber,
    CanonicalRole::Public,
];

impl CanonicalRole {
    /// Numeric privilege level; higher outranks lower.
    fn privilege(self) -> u8 {
        match self {
            CanonicalRole::Administrator => 7,
            CanonicalRole::SeoManager => 6,
            CanonicalRole::Editor => 5,
            CanonicalRole::SeoEditor => 4,
            CanonicalRole::Author => 3,
            CanonicalRole::Contributor => 2,
            CanonicalRole::Subscriber => 1,
            CanonicalRole::Public => 0,
        }
    }

    /// Whether this role meets or exceeds `other` in the privilege order.
    pub fn outranks_or_equals(self, other: CanonicalRole) -> bool {
        self.privilege() >= other.privilege()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalRole::Administrator => "administrator",
            CanonicalRole::SeoManager => "seo_manager",
            CanonicalRole::Editor => "editor",
            CanonicalRole::SeoEditor => "seo_editor",
            CanonicalRole::Author => "author",
            CanonicalRole::Contributor => "contributor",
            CanonicalRole::Subscriber => "subscriber",
            CanonicalRole::Public => "public",
        }
    }

    /// Parse a canonical spelling (as used in policy config).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "administrator" => Some(CanonicalRole::Administrator),
            "seo_manager" => Some(CanonicalRole::SeoManager),
            "editor" => Some(CanonicalRole::Editor),
            "seo_editor" => Some(CanonicalRole::SeoEditor),
            "author" => Some(CanonicalRole::Author),
            "contributor" => Some(CanonicalRole::Contributor),
            "subscriber" => Some(CanonicalRole::Subscriber),
            "public" => Some(CanonicalRole::Public),
            _ => None,
        }
    }

    /// Derive the single canonical role for a raw upstream role list.
    ///
    /// Each raw string is resolved case-insensitively through the alias
    /// table (canonical spellings pass through); unknown spellings are
    /// ignored. Of everything that resolved, the highest-privilege role
    /// wins. An empty or entirely unknown list yields [`Self::Public`].
    ///
    /// Deterministic and permutation-independent: the priority order
    /// decides, never the list order.
    pub fn normalize(raw_roles: &[String]) -> CanonicalRole {
        let mut present = [false; 8];

        for raw in raw_roles {
            if let Some(role) = resolve_alias(&raw.to_lowercase()) {
                present[role.privilege() as usize] = true;
            }
        }

        for role in PRIORITY {
            if present[role.privilege() as usize] {
                return role;
            }
        }

        CanonicalRole::Public
    }
}

impl std::fmt::Display for CanonicalRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map one lowercased upstream spelling onto a canonical role.
///
/// The upstream role set has grown organically: WordPress core roles, the
/// SEO plugin's labels, and a few human-entered variants all appear in real
/// sessions. Unknown spellings resolve to `None` and are skipped.
fn resolve_alias(raw: &str) -> Option<CanonicalRole> {
    match raw {
        "administrator" | "admin" => Some(CanonicalRole::Administrator),
        "seo_manager" | "seo manager" | "seo-manager" | "seo_lead" | "seo lead" | "seo-lead" => {
            Some(CanonicalRole::SeoManager)
        }
        "editor" => Some(CanonicalRole::Editor),
        "seo_editor" | "seo editor" | "seo-editor" | "seo_specialist" | "seo specialist"
        | "seo-specialist" => Some(CanonicalRole::SeoEditor),
        "author" => Some(CanonicalRole::Author),
        "contributor" => Some(CanonicalRole::Contributor),
        "subscriber" => Some(CanonicalRole::Subscriber),
        "public" | "guest" | "anonymous" => Some(CanonicalRole::Public),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_empty_list_is_public() {
        assert_eq!(CanonicalRole::normalize(&[]), CanonicalRole::Public);
    }

    #[test]
    fn test_unknown_roles_are_public() {
        assert_eq!(
            CanonicalRole::normalize(&roles(&["galactic_overlord", "vip"])),
            CanonicalRole::Public
        );
    }

    #[rstest]
    #[case("admin", CanonicalRole::Administrator)]
    #[case("administrator", CanonicalRole::Administrator)]
    #[case("seo lead", CanonicalRole::SeoManager)]
    #[case("seo_lead", CanonicalRole::SeoManager)]
    #[case("seo manager", CanonicalRole::SeoManager)]
    #[case("seo-editor", CanonicalRole::SeoEditor)]
    #[case("seo_specialist", CanonicalRole::SeoEditor)]
    #[case("editor", CanonicalRole::Editor)]
    #[case("author", CanonicalRole::Author)]
    #[case("contributor", CanonicalRole::Contributor)]
    #[case("subscriber", CanonicalRole::Subscriber)]
    #[case("guest", CanonicalRole::Public)]
    fn test_alias_transparency(#[case] alias: &str, #[case] expected: CanonicalRole) {
        // An alias must normalize exactly as its canonical spelling would
        assert_eq!(CanonicalRole::normalize(&roles(&[alias])), expected);
        assert_eq!(
            CanonicalRole::normalize(&roles(&[expected.as_str()])),
            expected
        );
    }

    #[test]
    fn test_case_insensitive() {
        // WordPress sometimes capitalizes role labels
        assert_eq!(
            CanonicalRole::normalize(&roles(&["Subscriber"])),
            CanonicalRole::Subscriber
        );
        assert_eq!(
            CanonicalRole::normalize(&roles(&["ADMIN"])),
            CanonicalRole::Administrator
        );
    }

    #[test]
    fn test_highest_privilege_wins() {
        assert_eq!(
            CanonicalRole::normalize(&roles(&["subscriber", "editor", "author"])),
            CanonicalRole::Editor
        );
        assert_eq!(
            CanonicalRole::normalize(&roles(&["seo_editor", "seo_lead"])),
            CanonicalRole::SeoManager
        );
    }

    #[test]
    fn test_permutation_independent() {
        let a = roles(&["author", "admin", "subscriber"]);
        let b = roles(&["subscriber", "author", "admin"]);
        let c = roles(&["admin", "subscriber", "author"]);

        assert_eq!(CanonicalRole::normalize(&a), CanonicalRole::Administrator);
        assert_eq!(CanonicalRole::normalize(&a), CanonicalRole::normalize(&b));
        assert_eq!(CanonicalRole::normalize(&b), CanonicalRole::normalize(&c));
    }

    #[test]
    fn test_unknowns_mixed_with_known() {
        assert_eq!(
            CanonicalRole::normalize(&roles(&["mystery_role", "contributor"])),
            CanonicalRole::Contributor
        );
    }

    #[test]
    fn test_seo_manager_outranks_editor() {
        assert!(CanonicalRole::SeoManager.outranks_or_equals(CanonicalRole::Editor));
        assert!(!CanonicalRole::Editor.outranks_or_equals(CanonicalRole::SeoManager));
        assert!(CanonicalRole::Editor.outranks_or_equals(CanonicalRole::Editor));
    }
}
