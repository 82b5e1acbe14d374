//! Policy condition: an expression tree bound to an evaluator.

use std::sync::Arc;

use rbac_authz_sdk::{ConditionEvaluator, Expr, ExprError, PeerContext};

use super::interpreter::TreeWalkingEvaluator;

/// A boolean predicate over a [`PeerContext`].
///
/// The tree is validated once, at construction. A tree that fails
/// validation is kept (for diagnostics) but never matches any peer.
/// Evaluation is pure: no side effects, the same peer always yields the
/// same answer, and a runtime failure counts as "no match".
///
/// Cheap to clone; safe to share across threads.
#[derive(Clone)]
pub struct Condition {
    expr: Arc<Expr>,
    evaluator: Arc<dyn ConditionEvaluator>,
    rejected: Option<ExprError>,
}

impl Condition {
    /// Bind `expr` to the default [`TreeWalkingEvaluator`].
    #[must_use]
    pub fn new(expr: Expr) -> Self {
        Self::with_evaluator(expr, Arc::new(TreeWalkingEvaluator::new()))
    }

    /// Bind `expr` to a custom evaluator.
    #[must_use]
    pub fn with_evaluator(expr: Expr, evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        let rejected = evaluator.validate(&expr).err();
        Self {
            expr: Arc::new(expr),
            evaluator,
            rejected,
        }
    }

    /// A condition that never matches.
    #[must_use]
    pub fn never(reason: impl Into<String>) -> Self {
        Self::new(Expr::unsupported(reason))
    }

    /// Whether `peer` satisfies this condition.
    #[must_use]
    pub fn matches(&self, peer: &PeerContext) -> bool {
        self.rejected.is_none() && self.evaluator.evaluate(&self.expr, peer)
    }

    #[must_use]
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Why this condition can never match, if it was rejected.
    #[must_use]
    pub fn rejection(&self) -> Option<&ExprError> {
        self.rejected.as_ref()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.rejected.is_none()
    }
}

impl From<Expr> for Condition {
    fn from(expr: Expr) -> Self {
        Self::new(expr)
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition")
            .field("expr", &self.expr)
            .field("rejected", &self.rejected)
            .finish_non_exhaustive()
    }
}
