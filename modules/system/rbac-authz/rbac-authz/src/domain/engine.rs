//! Evaluation engine: one action, an ordered set of named policies.

use indexmap::IndexMap;
use rbac_authz_sdk::{Action, AuthorizationDecision, PeerContext};

use super::condition::Condition;

/// Evaluates peers against an ordered collection of named policies.
///
/// The first policy (in insertion order) whose condition matches decides:
/// the engine reports its [`Action`] with justification
/// `"Policy matched: <name>"`. When nothing matches the decision is
/// `UNKNOWN` with `"No policies matched"`.
///
/// Immutable after construction, so a single engine can be evaluated from
/// any number of threads at once.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    action: Action,
    policies: IndexMap<String, Condition>,
}

impl EvaluationEngine {
    /// Build an engine from `(policy name, condition)` pairs.
    ///
    /// A repeated name replaces the earlier condition but keeps the
    /// earlier position. Conditions that failed validation are kept and
    /// never match.
    #[must_use]
    pub fn from_policy_source<N, I>(action: Action, policies: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Condition)>,
    {
        let mut map: IndexMap<String, Condition> = IndexMap::new();
        for (name, condition) in policies {
            let name = name.into();
            if let Some(reason) = condition.rejection() {
                tracing::warn!(
                    policy = %name,
                    action = %action,
                    error = %reason,
                    "Policy condition rejected; policy will never match"
                );
            }
            if map.insert(name.clone(), condition).is_some() {
                tracing::debug!(
                    policy = %name,
                    "Duplicate policy name; later condition wins"
                );
            }
        }

        Self {
            action,
            policies: map,
        }
    }

    /// An engine with no policies. Always `UNKNOWN`.
    #[must_use]
    pub fn empty(action: Action) -> Self {
        Self {
            action,
            policies: IndexMap::new(),
        }
    }

    #[must_use]
    pub const fn action(&self) -> Action {
        self.action
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Policy names in evaluation order.
    pub fn policy_names(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    /// Condition registered under `name`.
    #[must_use]
    pub fn policy(&self, name: &str) -> Option<&Condition> {
        self.policies.get(name)
    }

    /// Name of the first policy matching `peer`, without allocating.
    #[must_use]
    pub fn first_match(&self, peer: &PeerContext) -> Option<&str> {
        self.policies
            .iter()
            .find(|(_, condition)| condition.matches(peer))
            .map(|(name, _)| name.as_str())
    }

    /// Evaluate `peer` against this engine's policies.
    #[must_use]
    pub fn evaluate(&self, peer: &PeerContext) -> AuthorizationDecision {
        match self.first_match(peer) {
            Some(name) => AuthorizationDecision::policy_matched(self.action, name),
            None => AuthorizationDecision::no_match(),
        }
    }
}
