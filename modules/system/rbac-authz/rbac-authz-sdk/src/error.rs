//! Error types for the RBAC `AuthZ` SDK.

use thiserror::Error;

/// Structural problems found in a condition tree.
///
/// Produced by [`ConditionEvaluator::validate`](crate::ConditionEvaluator::validate)
/// when a condition is built. A condition that fails validation is kept
/// as a never-matching sentinel; access denial is never expressed as an
/// error variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    /// The loader marked a node as untranslatable.
    #[error("unsupported expression: {0}")]
    Unsupported(String),

    /// The tree references an attribute the peer context never carries.
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),

    /// The tree calls a function the evaluator does not provide.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("function '{function}' expects {expected} argument(s), got {actual}")]
    Arity {
        function: String,
        expected: usize,
        actual: usize,
    },

    /// `and` / `or` without operands.
    #[error("'{0}' requires at least one operand")]
    EmptyOperands(&'static str),

    #[error("expression nesting exceeds {max} levels")]
    TooDeep { max: usize },

    /// A literal that can never be valid in its position (e.g. a bad CIDR).
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),
}
