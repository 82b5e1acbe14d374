//! Configuration for the RBAC `AuthZ` module.
//!
//! Mirrors the shape of an RBAC policy set: a list of engines, each with an
//! action and an ordered map of named policies.
//!
//! ```json
//! { "engines": [
//!     { "action": "DENY",
//!       "policies": { "blockBadIP": { "condition": { "op": "call", "function": "in_cidr",
//!         "args": [ { "op": "attribute", "name": "source.address" },
//!                   { "op": "literal", "value": "203.0.113.0/24" } ] } } } },
//!     { "action": "ALLOW",
//!       "policies": { "allowAll": { "condition": { "op": "literal", "value": true } } } } ] }
//! ```

use indexmap::IndexMap;
use rbac_authz_sdk::{Action, Expr};
use serde::Deserialize;

use crate::domain::{Condition, DomainError, EngineRegistry, EvaluationEngine};

/// Module configuration.
///
/// The default has no engines, which denies every call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RbacAuthzConfig {
    /// Engines in evaluation order.
    pub engines: Vec<RbacPolicyConfig>,
}

/// One evaluation engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RbacPolicyConfig {
    /// What a matching policy does.
    pub action: Action,

    /// Named policies, evaluated in document order.
    #[serde(default)]
    pub policies: IndexMap<String, PolicyConfig>,
}

/// One named policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    pub condition: Expr,
}

impl RbacAuthzConfig {
    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// [`DomainError::InvalidConfig`] on malformed JSON, unknown fields or
    /// unknown expression nodes.
    pub fn from_json_str(json: &str) -> Result<Self, DomainError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check invariants that serde cannot express.
    ///
    /// Malformed conditions are not errors here; they become
    /// never-matching policies when the registry is built.
    ///
    /// # Errors
    ///
    /// [`DomainError::EmptyPolicyName`] when a policy name is blank.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (engine, cfg) in self.engines.iter().enumerate() {
            if cfg.policies.keys().any(|name| name.trim().is_empty()) {
                return Err(DomainError::EmptyPolicyName { engine });
            }
        }
        Ok(())
    }

    /// Validate and build the engine registry.
    ///
    /// # Errors
    ///
    /// Any error from [`validate`](Self::validate).
    pub fn build_registry(&self) -> Result<EngineRegistry, DomainError> {
        self.validate()?;
        Ok(self
            .engines
            .iter()
            .map(RbacPolicyConfig::build_engine)
            .collect())
    }
}

impl RbacPolicyConfig {
    /// Build the engine with the default evaluator.
    #[must_use]
    pub fn build_engine(&self) -> EvaluationEngine {
        EvaluationEngine::from_policy_source(
            self.action,
            self.policies
                .iter()
                .map(|(name, policy)| (name.as_str(), Condition::new(policy.condition.clone()))),
        )
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_no_engines() {
        let cfg = RbacAuthzConfig::default();
        assert!(cfg.engines.is_empty());
        assert!(cfg.build_registry().unwrap().is_empty());

        let cfg = RbacAuthzConfig::from_json_str("{}").unwrap();
        assert!(cfg.engines.is_empty());
    }

    #[test]
    fn parses_engines_in_order() {
        let cfg = RbacAuthzConfig::from_json_str(
            r#"{ "engines": [
                { "action": "DENY", "policies": {
                    "z": { "condition": { "op": "literal", "value": false } },
                    "a": { "condition": { "op": "literal", "value": true } } } },
                { "action": "ALLOW" }
            ] }"#,
        )
        .unwrap();

        assert_eq!(cfg.engines.len(), 2);
        assert_eq!(cfg.engines[0].action, Action::Deny);
        assert_eq!(
            cfg.engines[0].policies.keys().collect::<Vec<_>>(),
            ["z", "a"]
        );
        assert!(cfg.engines[1].policies.is_empty());
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = RbacAuthzConfig::from_json_str(r#"{ "engine": [] }"#).unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfig(_)));

        let err = RbacAuthzConfig::from_json_str(
            r#"{ "engines": [ { "action": "ALLOW", "shadow": true } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_unknown_action() {
        let err = RbacAuthzConfig::from_json_str(r#"{ "engines": [ { "action": "LOG" } ] }"#)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_blank_policy_name() {
        let cfg = RbacAuthzConfig::from_json_str(
            r#"{ "engines": [
                { "action": "ALLOW", "policies": {} },
                { "action": "DENY", "policies": {
                    " ": { "condition": { "op": "literal", "value": true } } } }
            ] }"#,
        )
        .unwrap();

        assert!(matches!(
            cfg.validate(),
            Err(DomainError::EmptyPolicyName { engine: 1 })
        ));
        assert!(cfg.build_registry().is_err());
    }

    #[test]
    fn malformed_condition_builds_never_matching_policy() {
        let cfg = RbacAuthzConfig::from_json_str(
            r#"{ "engines": [ { "action": "ALLOW", "policies": {
                "bad": { "condition": {
                    "op": "attribute", "name": "no.such.attribute" } } } } ] }"#,
        )
        .unwrap();

        let registry = cfg.build_registry().unwrap();
        let engine = &registry.engines()[0];
        assert_eq!(engine.len(), 1);
        assert!(!engine.policy("bad").unwrap().is_valid());
    }
}
