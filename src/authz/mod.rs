//! Authorization: canonical roles, the access policy table, and the guard.
//!
//! The authorization flow:
//! 1. The guard verifies the session cookie (see [`crate::auth`])
//! 2. Raw upstream role strings are normalized onto one canonical role,
//!    highest privilege winning
//! 3. The (route pattern, method, action) triple is looked up in the
//!    static policy table
//! 4. No matching rule, or a rule the role does not satisfy, denies
//!
//! Historically these checks were ad hoc `roles.includes(...)` tests
//! scattered across route handlers; they are centralized here so policy is
//! one pure, testable function.

mod action;
mod guard;
mod policy;
mod role;

pub use action::Action;
pub use guard::{AccessGrant, AccessGuard, GuardError};
pub use policy::{PolicyRule, PolicyTable};
pub use role::CanonicalRole;

/// Match a route pattern against a concrete request path.
///
/// Patterns are matched segment by segment. A `{name}` segment matches any
/// single non-empty path segment; everything else must match exactly. There
/// are no prefix or multi-segment wildcards: a pattern either covers the
/// whole path or does not match at all.
///
/// ```ignore
/// assert!(path_pattern_matches("/api/wp/comments/{id}", "/api/wp/comments/99"));
/// assert!(!path_pattern_matches("/api/wp/comments/{id}", "/api/wp/comments"));
/// assert!(!path_pattern_matches("/api/wp/comments/{id}", "/api/wp/comments/99/replies"));
/// ```
pub(crate) fn path_pattern_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.trim_end_matches('/').split('/');
    let mut path_segments = path.trim_end_matches('/').split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (Some(p), Some(s)) => {
                let is_param = p.starts_with('{') && p.ends_with('}');
                if is_param {
                    if s.is_empty() {
                        return false;
                    }
                } else if p != s {
                    return false;
                }
            }
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(path_pattern_matches("/api/wp/posts", "/api/wp/posts"));
        assert!(!path_pattern_matches("/api/wp/posts", "/api/wp/pages"));
        assert!(!path_pattern_matches("/api/wp/posts", "/api/wp/post"));
    }

    #[test]
    fn test_param_segment() {
        assert!(path_pattern_matches(
            "/api/wp/comments/{id}",
            "/api/wp/comments/99"
        ));
        assert!(path_pattern_matches(
            "/api/wp/comments/{id}",
            "/api/wp/comments/abc-def"
        ));
        assert!(!path_pattern_matches(
            "/api/wp/comments/{id}",
            "/api/wp/comments"
        ));
    }

    #[test]
    fn test_no_partial_or_prefix_matches() {
        assert!(!path_pattern_matches(
            "/api/wp/comments/{id}",
            "/api/wp/comments/99/replies"
        ));
        assert!(!path_pattern_matches("/api/wp", "/api/wp/posts"));
        assert!(!path_pattern_matches("/api/wp/posts", "/api"));
    }

    #[test]
    fn test_trailing_slash_tolerated() {
        assert!(path_pattern_matches("/api/wp/posts", "/api/wp/posts/"));
        assert!(path_pattern_matches("/api/wp/posts/", "/api/wp/posts"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!path_pattern_matches("/api/wp/posts", "/api/wp/Posts"));
    }
}
