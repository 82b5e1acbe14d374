//! Condition expression tree.
//!
//! Conditions arrive already parsed (by the policy loader) as an [`Expr`]
//! tree over [`PeerContext`](crate::PeerContext) attributes. This module
//! only defines the tree; evaluation is done by a
//! [`ConditionEvaluator`](crate::ConditionEvaluator) implementation.
//!
//! ## Wire shape
//!
//! Nodes are tagged by `op`:
//!
//! ```json
//! { "op": "and", "args": [
//!     { "op": "eq",
//!       "left":  { "op": "attribute", "name": "source.principal" },
//!       "right": { "op": "literal", "value": "spiffe://corp/admin" } },
//!     { "op": "call", "function": "in_cidr",
//!       "args": [ { "op": "attribute", "name": "source.address" },
//!                 { "op": "literal", "value": "10.0.0.0/8" } ] } ] }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum nesting depth accepted for a condition tree.
///
/// Bounds evaluation cost and recursion depth.
pub const MAX_EXPR_DEPTH: usize = 64;

/// Built-in function names usable in [`Expr::Call`].
pub mod functions {
    /// `starts_with(string, prefix) -> bool`
    pub const STARTS_WITH: &str = "starts_with";
    /// `ends_with(string, suffix) -> bool`
    pub const ENDS_WITH: &str = "ends_with";
    /// `contains(string, needle) -> bool`
    pub const CONTAINS: &str = "contains";
    /// `in_cidr(ip, cidr) -> bool`
    pub const IN_CIDR: &str = "in_cidr";
    /// `size(string | list | map) -> int`
    pub const SIZE: &str = "size";

    /// Number of arguments a built-in takes, or `None` for unknown names.
    #[must_use]
    pub fn arity(name: &str) -> Option<usize> {
        match name {
            STARTS_WITH | ENDS_WITH | CONTAINS | IN_CIDR => Some(2),
            SIZE => Some(1),
            _ => None,
        }
    }
}

/// A dynamically typed attribute or literal value.
///
/// Floats are intentionally absent: every value has total equality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short kind name, used in type-mismatch diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether both values are of the same kind (and thus comparable).
    #[must_use]
    pub fn same_kind(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "\"{}\"", s.escape_default()),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "\"{}\": {v}", k.escape_default())?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    #[inline]
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<u16> for Value {
    #[inline]
    fn from(n: u16) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Self::List(items.into_iter().map(Self::String).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    #[inline]
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Self::Map(entries)
    }
}

/// A boolean predicate over peer attributes, as a tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    /// A constant.
    Literal { value: Value },
    /// A peer attribute by well-known name (see [`attributes`](crate::attributes)).
    Attribute { name: String },
    /// `target[key]`: map lookup by string key or list lookup by int index.
    Index { target: Box<Expr>, key: Box<Expr> },
    Eq { left: Box<Expr>, right: Box<Expr> },
    Ne { left: Box<Expr>, right: Box<Expr> },
    Lt { left: Box<Expr>, right: Box<Expr> },
    Le { left: Box<Expr>, right: Box<Expr> },
    Gt { left: Box<Expr>, right: Box<Expr> },
    Ge { left: Box<Expr>, right: Box<Expr> },
    /// Set membership: element of a list, or key of a map.
    In { value: Box<Expr>, set: Box<Expr> },
    And { args: Vec<Expr> },
    Or { args: Vec<Expr> },
    Not { arg: Box<Expr> },
    /// Whether the peer carries the named attribute at all.
    Present { name: String },
    /// Built-in function call (see [`functions`]).
    Call {
        function: String,
        #[serde(default)]
        args: Vec<Expr>,
    },
    /// Sentinel produced by a loader for something it could not translate.
    /// Never matches.
    Unsupported {
        #[serde(default)]
        reason: String,
    },
}

impl Expr {
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    #[must_use]
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::Attribute { name: name.into() }
    }

    #[must_use]
    pub fn index(target: Self, key: impl Into<Value>) -> Self {
        Self::Index {
            target: Box::new(target),
            key: Box::new(Self::literal(key)),
        }
    }

    #[must_use]
    pub fn equals(left: Self, right: Self) -> Self {
        Self::Eq {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn not_equals(left: Self, right: Self) -> Self {
        Self::Ne {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn lt(left: Self, right: Self) -> Self {
        Self::Lt {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn ge(left: Self, right: Self) -> Self {
        Self::Ge {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[must_use]
    pub fn is_in(value: Self, set: Self) -> Self {
        Self::In {
            value: Box::new(value),
            set: Box::new(set),
        }
    }

    #[must_use]
    pub fn and(args: impl IntoIterator<Item = Self>) -> Self {
        Self::And {
            args: args.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn or(args: impl IntoIterator<Item = Self>) -> Self {
        Self::Or {
            args: args.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn negate(arg: Self) -> Self {
        Self::Not { arg: Box::new(arg) }
    }

    #[must_use]
    pub fn present(name: impl Into<String>) -> Self {
        Self::Present { name: name.into() }
    }

    #[must_use]
    pub fn call(function: impl Into<String>, args: impl IntoIterator<Item = Self>) -> Self {
        Self::Call {
            function: function.into(),
            args: args.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
        }
    }

    /// Short node name, matching the wire `op` tag.
    #[must_use]
    pub const fn op_name(&self) -> &'static str {
        match self {
            Self::Literal { .. } => "literal",
            Self::Attribute { .. } => "attribute",
            Self::Index { .. } => "index",
            Self::Eq { .. } => "eq",
            Self::Ne { .. } => "ne",
            Self::Lt { .. } => "lt",
            Self::Le { .. } => "le",
            Self::Gt { .. } => "gt",
            Self::Ge { .. } => "ge",
            Self::In { .. } => "in",
            Self::And { .. } => "and",
            Self::Or { .. } => "or",
            Self::Not { .. } => "not",
            Self::Present { .. } => "present",
            Self::Call { .. } => "call",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}
