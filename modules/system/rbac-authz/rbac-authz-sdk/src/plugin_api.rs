//! Plugin API trait for condition evaluators.

use crate::error::ExprError;
use crate::expr::Expr;
use crate::peer::PeerContext;

/// Evaluates a parsed condition tree against a peer.
///
/// Any implementation satisfying this contract can back a condition.
///
/// Contract for `evaluate`:
/// - pure and deterministic for identical inputs, no side effects
/// - total: never panics, never blocks
/// - fail-closed: anything it cannot evaluate yields `false`
pub trait ConditionEvaluator: Send + Sync {
    /// One-time structural check, run when a condition is built.
    ///
    /// # Errors
    ///
    /// Returns [`ExprError`] if the tree uses nodes, attributes or functions
    /// this evaluator cannot handle. Such a condition never matches.
    fn validate(&self, expr: &Expr) -> Result<(), ExprError> {
        let _ = expr;
        Ok(())
    }

    /// Whether `expr` holds for `peer`.
    fn evaluate(&self, expr: &Expr, peer: &PeerContext) -> bool;
}
