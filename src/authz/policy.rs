//! The access policy table and its evaluator.

use http::Method;

use super::{Action, CanonicalRole, path_pattern_matches};
use crate::config::{ConfigError, PolicyConfig};

/// One compiled policy rule.
#[derive(Debug, Clone)]
pub struct PolicyRule {
    /// Route pattern; `{name}` segments match any single path segment.
    pub path: String,
    pub method: Method,
    pub action: Action,
    /// Roles granted this action. These are minimum privilege levels: a
    /// caller whose role outranks any granted role satisfies the rule.
    pub roles: Vec<CanonicalRole>,
}

/// The static access policy table.
///
/// Read-only once built; shared across requests behind an `Arc`. Reloading
/// is an out-of-band restart, never part of the request path.
#[derive(Debug)]
pub struct PolicyTable {
    rules: Vec<PolicyRule>,
}

impl PolicyTable {
    /// Compile the configured rules, or fall back to [`Self::builtin`] when
    /// the config carries none.
    pub fn from_config(config: &PolicyConfig) -> Result<Self, ConfigError> {
        if config.rules.is_empty() {
            return Ok(Self::builtin());
        }

        let mut rules = Vec::with_capacity(config.rules.len());
        for rule in &config.rules {
            let method: Method = rule.method.parse().map_err(|_| {
                ConfigError::Validation(format!("unknown method '{}'", rule.method))
            })?;
            let action = Action::parse(&rule.action).ok_or_else(|| {
                ConfigError::Validation(format!("unknown action '{}'", rule.action))
            })?;
            let roles = rule
                .roles
                .iter()
                .map(|r| {
                    CanonicalRole::parse(r).ok_or_else(|| {
                        ConfigError::Validation(format!(
                            "unknown role '{r}' in rule for '{}'",
                            rule.path
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            rules.push(PolicyRule {
                path: rule.path.clone(),
                method,
                action,
                roles,
            });
        }

        Ok(Self { rules })
    }

    /// The default table covering the gateway's own API surface.
    ///
    /// Deployments normally override this with a versioned `[[policy.rules]]`
    /// table; the built-in exists so a minimal config still fails closed
    /// instead of open.
    pub fn builtin() -> Self {
        use CanonicalRole::*;

        let rule = |path: &str, method: Method, action: Action, roles: &[CanonicalRole]| {
            PolicyRule {
                path: path.to_string(),
                method,
                action,
                roles: roles.to_vec(),
            }
        };

        Self {
            rules: vec![
                rule("/api/auth/me", Method::GET, Action::Read, &[Subscriber]),
                rule("/api/wp/posts", Method::GET, Action::Read, &[Public]),
                rule("/api/wp/posts", Method::POST, Action::Write, &[Editor]),
                rule("/api/wp/search", Method::GET, Action::Read, &[Public]),
                rule("/api/wp/users/me", Method::GET, Action::Read, &[Subscriber]),
                rule("/api/wp/users/me", Method::POST, Action::Write, &[Subscriber]),
                rule(
                    "/api/wp/comments/{id}",
                    Method::PATCH,
                    Action::Moderate,
                    &[Editor],
                ),
                rule(
                    "/api/wp/comments/{id}",
                    Method::DELETE,
                    Action::Delete,
                    &[Editor],
                ),
            ],
        }
    }

    /// Evaluate the table for one request.
    ///
    /// Pure function of its inputs: no side effects beyond logging, no
    /// network. A triple with no matching rule denies (fail closed); the
    /// miss is logged distinctly so absent policy entries are discoverable
    /// without granting anything in the meantime.
    pub fn check(&self, role: CanonicalRole, path: &str, method: &Method, action: Action) -> bool {
        let rule = self.rules.iter().find(|r| {
            r.method == *method && r.action == action && path_pattern_matches(&r.path, path)
        });

        let Some(rule) = rule else {
            tracing::warn!(
                %method,
                path,
                action = %action,
                "no policy rule matches; denying by default"
            );
            return false;
        };

        let allowed = rule
            .roles
            .iter()
            .any(|granted| role.outranks_or_equals(*granted));

        tracing::debug!(
            %method,
            path,
            action = %action,
            role = %role,
            rule_path = %rule.path,
            allowed,
            "policy evaluated"
        );

        allowed
    }

    #[cfg(test)]
    pub(crate) fn rule_count(&self) -> usize {
        self.rules.len()
    }
}
