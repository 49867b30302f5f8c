//! Required-action vocabulary for policy rules.

use serde::{Deserialize, Serialize};

/// What a request intends to do, decoupled from the HTTP verb carrying it.
///
/// Policy authors reason about intent: a `POST` that flips a comment's
/// moderation status is a `Moderate`, not a generic write, and a `GET` that
/// exports data is still a `Read`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
    Delete,
    Moderate,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Delete => "delete",
            Action::Moderate => "moderate",
        }
    }

    /// Parse a config-file spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(Action::Read),
            "write" => Some(Action::Write),
            "delete" => Some(Action::Delete),
            "moderate" => Some(Action::Moderate),
            _ => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for action in [Action::Read, Action::Write, Action::Delete, Action::Moderate] {
            assert_eq!(Action::parse(action.as_str()), Some(action));
        }
        assert_eq!(Action::parse("browse"), None);
        assert_eq!(Action::parse("READ"), None); // config spellings are lowercase
    }
}
