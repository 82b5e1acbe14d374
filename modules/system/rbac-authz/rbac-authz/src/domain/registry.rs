//! Ordered engine collection and the deny-overrides combining rule.

use rbac_authz_sdk::{Action, AuthorizationReport, Decision, PeerContext};

use super::engine::EvaluationEngine;

/// An ordered, immutable set of evaluation engines.
///
/// Combining rule, applied in registry order:
///
/// - any engine deciding `DENY` refuses the call; later engines are not
///   evaluated
/// - otherwise at least one `ALLOW` permits it
/// - otherwise (all `UNKNOWN`, or no engines at all) the call is refused
#[derive(Debug, Clone, Default)]
pub struct EngineRegistry {
    engines: Vec<EvaluationEngine>,
}

impl EngineRegistry {
    #[must_use]
    pub fn new(engines: Vec<EvaluationEngine>) -> Self {
        Self { engines }
    }

    /// A registry with no engines. Denies everything.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn engines(&self) -> &[EvaluationEngine] {
        &self.engines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Final verdict for `peer`. `true` lets the RPC proceed.
    #[must_use]
    pub fn authorize(&self, peer: &PeerContext) -> bool {
        let mut allowed = false;
        for engine in &self.engines {
            if engine.first_match(peer).is_some() {
                match engine.action() {
                    Action::Deny => return false,
                    Action::Allow => allowed = true,
                }
            }
        }
        allowed
    }

    /// Same verdict as [`authorize`](Self::authorize), with the
    /// per-engine decisions that led to it.
    #[must_use]
    pub fn explain(&self, peer: &PeerContext) -> AuthorizationReport {
        let mut decisions = Vec::with_capacity(self.engines.len());
        let mut allowed = false;

        for engine in &self.engines {
            let decision = engine.evaluate(peer);
            let verdict = decision.decision;
            decisions.push(decision);
            match verdict {
                Decision::Deny => {
                    return AuthorizationReport {
                        allowed: false,
                        decisions,
                    };
                }
                Decision::Allow => allowed = true,
                Decision::Unknown => {}
            }
        }

        AuthorizationReport { allowed, decisions }
    }
}

impl FromIterator<EvaluationEngine> for EngineRegistry {
    fn from_iter<T: IntoIterator<Item = EvaluationEngine>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
