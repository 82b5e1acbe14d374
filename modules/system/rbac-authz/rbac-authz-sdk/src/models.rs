//! Decision models for the RBAC `AuthZ` module.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Justification prefix reported when a policy condition matched.
pub const POLICY_MATCHED_PREFIX: &str = "Policy matched: ";

/// Justification reported by an engine when none of its policies matched.
pub const NO_POLICIES_MATCHED: &str = "No policies matched";

/// Justification reported when the aggregate verdict is the default deny
/// (no engine denied, but none allowed either).
pub const NO_ENGINE_ALLOWED: &str = "No engine allowed the request";

/// Outcome of a single evaluation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// A policy of an `ALLOW` engine matched.
    Allow,
    /// A policy of a `DENY` engine matched.
    Deny,
    /// No policy matched; the engine has no opinion.
    Unknown,
}

impl Decision {
    /// Wire name of the decision (`ALLOW`, `DENY`, `UNKNOWN`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Deny => "DENY",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an engine does when one of its policies matches.
///
/// Fixed when the engine is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Matching policies grant access.
    Allow,
    /// Matching policies refuse access.
    Deny,
}

impl Action {
    /// The decision an engine with this action reports on a match.
    #[must_use]
    pub const fn decision(self) -> Decision {
        match self {
            Self::Allow => Decision::Allow,
            Self::Deny => Decision::Deny,
        }
    }

    /// Wire name of the action (`ALLOW`, `DENY`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "ALLOW",
            Self::Deny => "DENY",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one engine against a peer.
///
/// Created fresh on every evaluation and owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationDecision {
    /// The engine's verdict.
    pub decision: Decision,
    /// Diagnostic text: which policy matched, or that none did.
    pub justification: String,
}

impl AuthorizationDecision {
    /// Decision for an engine whose policy `policy_name` matched.
    #[must_use]
    pub fn policy_matched(action: Action, policy_name: &str) -> Self {
        Self {
            decision: action.decision(),
            justification: format!("{POLICY_MATCHED_PREFIX}{policy_name}"),
        }
    }

    /// Decision for an engine where no policy matched.
    #[must_use]
    pub fn no_match() -> Self {
        Self {
            decision: Decision::Unknown,
            justification: NO_POLICIES_MATCHED.to_owned(),
        }
    }

    /// Name of the matched policy, if any.
    #[must_use]
    pub fn matched_policy(&self) -> Option<&str> {
        match self.decision {
            Decision::Unknown => None,
            Decision::Allow | Decision::Deny => {
                self.justification.strip_prefix(POLICY_MATCHED_PREFIX)
            }
        }
    }
}

/// Audit view of one aggregate authorization check.
///
/// `decisions` holds the per-engine results in registry order, up to and
/// including the engine that short-circuited on `DENY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationReport {
    /// Final verdict. `true` lets the RPC proceed.
    pub allowed: bool,
    /// Per-engine decisions that were actually computed.
    #[serde(default)]
    pub decisions: Vec<AuthorizationDecision>,
}

impl AuthorizationReport {
    /// The justification that explains the final verdict.
    ///
    /// - allowed: the first `ALLOW` decision
    /// - denied by an engine: the `DENY` decision
    /// - default deny: [`NO_ENGINE_ALLOWED`]
    #[must_use]
    pub fn justification(&self) -> &str {
        let wanted = if self.allowed {
            Decision::Allow
        } else {
            Decision::Deny
        };
        self.decisions
            .iter()
            .find(|d| d.decision == wanted)
            .map_or(NO_ENGINE_ALLOWED, |d| d.justification.as_str())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn action_maps_to_decision() {
        assert_eq!(Action::Allow.decision(), Decision::Allow);
        assert_eq!(Action::Deny.decision(), Decision::Deny);
    }

    #[test]
    fn decision_wire_names() {
        assert_eq!(Decision::Allow.to_string(), "ALLOW");
        assert_eq!(Decision::Deny.to_string(), "DENY");
        assert_eq!(Decision::Unknown.to_string(), "UNKNOWN");

        let json = serde_json::to_string(&Decision::Unknown).unwrap();
        assert_eq!(json, r#""UNKNOWN""#);
        let action: Action = serde_json::from_str(r#""DENY""#).unwrap();
        assert_eq!(action, Action::Deny);
    }

    #[test]
    fn policy_matched_justification_names_policy() {
        let d = AuthorizationDecision::policy_matched(Action::Deny, "blockBadIP");
        assert_eq!(d.decision, Decision::Deny);
        assert_eq!(d.justification, "Policy matched: blockBadIP");
        assert_eq!(d.matched_policy(), Some("blockBadIP"));
    }

    #[test]
    fn no_match_is_unknown() {
        let d = AuthorizationDecision::no_match();
        assert_eq!(d.decision, Decision::Unknown);
        assert_eq!(d.justification, NO_POLICIES_MATCHED);
        assert!(d.matched_policy().is_none());
    }

    #[test]
    fn report_justification_follows_verdict() {
        let allowed = AuthorizationReport {
            allowed: true,
            decisions: vec![
                AuthorizationDecision::no_match(),
                AuthorizationDecision::policy_matched(Action::Allow, "allowAdmins"),
            ],
        };
        assert_eq!(allowed.justification(), "Policy matched: allowAdmins");

        let denied = AuthorizationReport {
            allowed: false,
            decisions: vec![
                AuthorizationDecision::policy_matched(Action::Allow, "allowAll"),
                AuthorizationDecision::policy_matched(Action::Deny, "blockBadIP"),
            ],
        };
        assert_eq!(denied.justification(), "Policy matched: blockBadIP");

        let defaulted = AuthorizationReport {
            allowed: false,
            decisions: vec![AuthorizationDecision::no_match()],
        };
        assert_eq!(defaulted.justification(), NO_ENGINE_ALLOWED);
    }
}
