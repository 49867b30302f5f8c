//! Access policy table configuration.
//!
//! The policy table is configuration the gateway evaluates, not state it
//! owns: it is maintained and versioned alongside the deployment, and the
//! gateway never writes to it.

use serde::{Deserialize, Serialize};

use super::ConfigError;

const VALID_METHODS: &[&str] = &["GET", "POST", "PATCH", "PUT", "DELETE"];
const VALID_ACTIONS: &[&str] = &["read", "write", "delete", "moderate"];

/// Access policy configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Policy rules. When empty, the built-in default table is used.
    #[serde(default)]
    pub rules: Vec<PolicyRuleConfig>,
}

/// One rule: who may perform an action on a route.
///
/// Roles name *minimum* privilege levels; a caller whose canonical role
/// outranks a granted role satisfies the rule too.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyRuleConfig {
    /// Route pattern. `{name}` segments match any single path segment,
    /// e.g. `/api/wp/comments/{id}`.
    pub path: String,

    /// HTTP method, uppercase.
    pub method: String,

    /// Required action: `read`, `write`, `delete` or `moderate`.
    pub action: String,

    /// Canonical role names granted this action.
    pub roles: Vec<String>,
}

impl PolicyConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        for rule in &self.rules {
            if !rule.path.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "policy rule path '{}' must start with '/'",
                    rule.path
                )));
            }
            if !VALID_METHODS.contains(&rule.method.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "policy rule for '{}' has unknown method '{}'",
                    rule.path, rule.method
                )));
            }
            if !VALID_ACTIONS.contains(&rule.action.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "policy rule for '{}' has unknown action '{}'",
                    rule.path, rule.action
                )));
            }
            if rule.roles.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "policy rule for '{}' grants no roles; delete the rule instead (lookups fail closed)",
                    rule.path
                )));
            }
        }
        Ok(())
    }
}
