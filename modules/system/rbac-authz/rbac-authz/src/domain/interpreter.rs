//! Tree-walking condition evaluator.
//!
//! ## Semantics
//!
//! - Structural problems (unsupported nodes, unknown attributes or
//!   functions, wrong arity, empty `and`/`or`, bad literal CIDR ranges,
//!   trees deeper than [`MAX_EXPR_DEPTH`]) are reported by `validate`.
//! - At run time, an absent attribute, a missing key, a type mismatch or an
//!   unparseable address is an evaluation error.
//! - `and`/`or` absorb an error only when another operand already decides
//!   the result: `false && err == false`, `true || err == true`.
//!   Every other node propagates errors.
//! - An error, or a non-boolean result, at the root is "no match".
//!
//! Comparing values of different kinds is an error, so `ne` can never turn
//! a type confusion into `true`.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::net::IpAddr;

use ipnetwork::IpNetwork;
use rbac_authz_sdk::{
    ConditionEvaluator, Expr, ExprError, MAX_EXPR_DEPTH, PeerContext, Value, attributes,
    functions,
};

/// Runtime evaluation failure. Never escapes the evaluator.
#[derive(Debug, thiserror::Error)]
enum EvalError {
    #[error("attribute '{0}' is not present")]
    MissingAttribute(String),

    #[error("key {0} not found")]
    MissingKey(String),

    #[error("'{op}' cannot combine {left} and {right}")]
    TypeMismatch {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },

    #[error("'{op}' expects {expected}, got {actual}")]
    UnexpectedType {
        op: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid IP address '{0}'")]
    InvalidAddress(String),

    #[error("invalid CIDR range '{0}'")]
    InvalidCidr(String),

    #[error(transparent)]
    Structural(#[from] ExprError),
}

type Eval<'a> = Result<Cow<'a, Value>, EvalError>;

/// Default [`ConditionEvaluator`]: interprets the [`Expr`] tree directly.
///
/// Stateless; one instance can be shared by every condition.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeWalkingEvaluator;

impl TreeWalkingEvaluator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ConditionEvaluator for TreeWalkingEvaluator {
    fn validate(&self, expr: &Expr) -> Result<(), ExprError> {
        check(expr, 1)
    }

    fn evaluate(&self, expr: &Expr, peer: &PeerContext) -> bool {
        match eval(expr, peer, 1).and_then(|v| truth(&v, "condition")) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::trace!(
                    op = expr.op_name(),
                    error = %e,
                    "condition not evaluable, treating as no match"
                );
                false
            }
        }
    }
}

// ── Structural validation ────────────────────────────────────────────

fn check(expr: &Expr, depth: usize) -> Result<(), ExprError> {
    if depth > MAX_EXPR_DEPTH {
        return Err(ExprError::TooDeep {
            max: MAX_EXPR_DEPTH,
        });
    }
    let next = depth + 1;

    match expr {
        Expr::Literal { .. } => Ok(()),
        Expr::Attribute { name } | Expr::Present { name } => {
            if attributes::is_known(name) {
                Ok(())
            } else {
                Err(ExprError::UnknownAttribute(name.clone()))
            }
        }
        Expr::Index {
            target: left,
            key: right,
        }
        | Expr::Eq { left, right }
        | Expr::Ne { left, right }
        | Expr::Lt { left, right }
        | Expr::Le { left, right }
        | Expr::Gt { left, right }
        | Expr::Ge { left, right }
        | Expr::In {
            value: left,
            set: right,
        } => {
            check(left, next)?;
            check(right, next)
        }
        Expr::And { args } => check_operands("and", args, next),
        Expr::Or { args } => check_operands("or", args, next),
        Expr::Not { arg } => check(arg, next),
        Expr::Call { function, args } => {
            check_call(function, args)?;
            args.iter().try_for_each(|arg| check(arg, next))
        }
        Expr::Unsupported { reason } => Err(ExprError::Unsupported(reason.clone())),
    }
}

fn check_operands(op: &'static str, args: &[Expr], depth: usize) -> Result<(), ExprError> {
    if args.is_empty() {
        return Err(ExprError::EmptyOperands(op));
    }
    args.iter().try_for_each(|arg| check(arg, depth))
}

fn check_call(function: &str, args: &[Expr]) -> Result<(), ExprError> {
    let expected = functions::arity(function)
        .ok_or_else(|| ExprError::UnknownFunction(function.to_owned()))?;
    if args.len() != expected {
        return Err(ExprError::Arity {
            function: function.to_owned(),
            expected,
            actual: args.len(),
        });
    }

    // A literal range that can never parse would silently never match.
    if function == functions::IN_CIDR
        && let Some(Expr::Literal { value }) = args.get(1)
    {
        let parses = value
            .as_str()
            .is_some_and(|cidr| cidr.parse::<IpNetwork>().is_ok());
        if !parses {
            return Err(ExprError::InvalidLiteral(format!(
                "{value} is not a CIDR range"
            )));
        }
    }
    Ok(())
}

// ── Evaluation ───────────────────────────────────────────────────────

fn eval<'a>(expr: &'a Expr, peer: &'a PeerContext, depth: usize) -> Eval<'a> {
    if depth > MAX_EXPR_DEPTH {
        return Err(ExprError::TooDeep {
            max: MAX_EXPR_DEPTH,
        }
        .into());
    }
    let next = depth + 1;

    match expr {
        Expr::Literal { value } => Ok(Cow::Borrowed(value)),
        Expr::Attribute { name } => peer
            .attribute(name)
            .map(Cow::Borrowed)
            .ok_or_else(|| EvalError::MissingAttribute(name.clone())),
        Expr::Index { target, key } => {
            let key = eval(key, peer, next)?;
            index(eval(target, peer, next)?, &key)
        }
        Expr::Eq { left, right } => {
            boolean(equals(&*eval(left, peer, next)?, &*eval(right, peer, next)?, "eq")?)
        }
        Expr::Ne { left, right } => {
            boolean(!equals(&*eval(left, peer, next)?, &*eval(right, peer, next)?, "ne")?)
        }
        Expr::Lt { left, right } => ordered(left, right, peer, next, "lt", Ordering::is_lt),
        Expr::Le { left, right } => ordered(left, right, peer, next, "le", Ordering::is_le),
        Expr::Gt { left, right } => ordered(left, right, peer, next, "gt", Ordering::is_gt),
        Expr::Ge { left, right } => ordered(left, right, peer, next, "ge", Ordering::is_ge),
        Expr::In { value, set } => {
            boolean(contains(&*eval(set, peer, next)?, &*eval(value, peer, next)?)?)
        }
        Expr::And { args } => junction(args, peer, next, "and", false),
        Expr::Or { args } => junction(args, peer, next, "or", true),
        Expr::Not { arg } => boolean(!truth(&*eval(arg, peer, next)?, "not")?),
        Expr::Present { name } => boolean(peer.has_attribute(name)),
        Expr::Call { function, args } => call(function, args, peer, next),
        Expr::Unsupported { reason } => Err(ExprError::Unsupported(reason.clone()).into()),
    }
}

#[allow(clippy::unnecessary_wraps)]
fn boolean<'a>(b: bool) -> Eval<'a> {
    Ok(Cow::Owned(Value::Bool(b)))
}

fn truth(value: &Value, op: &'static str) -> Result<bool, EvalError> {
    value.as_bool().ok_or(EvalError::UnexpectedType {
        op,
        expected: "bool",
        actual: value.kind(),
    })
}

/// `and` (`decisive = false`) and `or` (`decisive = true`).
///
/// Returns the decisive value as soon as one operand yields it; otherwise
/// the first error seen, or the neutral value.
fn junction<'a>(
    args: &'a [Expr],
    peer: &'a PeerContext,
    depth: usize,
    op: &'static str,
    decisive: bool,
) -> Eval<'a> {
    if args.is_empty() {
        return Err(ExprError::EmptyOperands(op).into());
    }

    let mut first_error = None;
    for arg in args {
        match eval(arg, peer, depth).and_then(|v| truth(&v, op)) {
            Ok(b) if b == decisive => return boolean(decisive),
            Ok(_) => {}
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    first_error.map_or_else(|| boolean(!decisive), Err)
}

fn index<'a>(target: Cow<'a, Value>, key: &Value) -> Eval<'a> {
    match target {
        Cow::Borrowed(t) => lookup(t, key).map(Cow::Borrowed),
        Cow::Owned(t) => lookup(&t, key).map(|found| Cow::Owned(found.clone())),
    }
}

fn lookup<'v>(target: &'v Value, key: &Value) -> Result<&'v Value, EvalError> {
    match (target, key) {
        (Value::Map(entries), Value::String(k)) => entries
            .get(k)
            .ok_or_else(|| EvalError::MissingKey(format!("'{k}'"))),
        (Value::List(items), Value::Int(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| items.get(i))
            .ok_or_else(|| EvalError::MissingKey(i.to_string())),
        (t, k) => Err(EvalError::TypeMismatch {
            op: "index",
            left: t.kind(),
            right: k.kind(),
        }),
    }
}

fn equals(left: &Value, right: &Value, op: &'static str) -> Result<bool, EvalError> {
    if left.same_kind(right) {
        Ok(left == right)
    } else {
        Err(EvalError::TypeMismatch {
            op,
            left: left.kind(),
            right: right.kind(),
        })
    }
}

fn ordered<'a>(
    left: &'a Expr,
    right: &'a Expr,
    peer: &'a PeerContext,
    depth: usize,
    op: &'static str,
    accept: fn(Ordering) -> bool,
) -> Eval<'a> {
    let left = eval(left, peer, depth)?;
    let right = eval(right, peer, depth)?;
    let ordering = match (&*left, &*right) {
        (Value::Int(a), Value::Int(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (l, r) => {
            return Err(EvalError::TypeMismatch {
                op,
                left: l.kind(),
                right: r.kind(),
            });
        }
    };
    boolean(accept(ordering))
}

/// Membership: list element (same kind required) or map key.
fn contains(set: &Value, value: &Value) -> Result<bool, EvalError> {
    match set {
        Value::List(items) => {
            if let Some(other) = items.iter().find(|item| !item.same_kind(value)) {
                return Err(EvalError::TypeMismatch {
                    op: "in",
                    left: value.kind(),
                    right: other.kind(),
                });
            }
            Ok(items.contains(value))
        }
        Value::Map(entries) => match value {
            Value::String(k) => Ok(entries.contains_key(k)),
            other => Err(EvalError::TypeMismatch {
                op: "in",
                left: other.kind(),
                right: "map",
            }),
        },
        other => Err(EvalError::UnexpectedType {
            op: "in",
            expected: "list or map",
            actual: other.kind(),
        }),
    }
}

/// Arity and names were checked by `validate`; a mismatch here falls
/// through to the unknown-function arm.
fn call<'a>(function: &str, args: &'a [Expr], peer: &'a PeerContext, depth: usize) -> Eval<'a> {
    let values = args
        .iter()
        .map(|arg| eval(arg, peer, depth))
        .collect::<Result<Vec<_>, _>>()?;

    match (function, values.as_slice()) {
        (functions::STARTS_WITH, [s, prefix]) => {
            boolean(string_arg(s, functions::STARTS_WITH)?.starts_with(string_arg(
                prefix,
                functions::STARTS_WITH,
            )?))
        }
        (functions::ENDS_WITH, [s, suffix]) => {
            boolean(string_arg(s, functions::ENDS_WITH)?.ends_with(string_arg(
                suffix,
                functions::ENDS_WITH,
            )?))
        }
        (functions::CONTAINS, [s, needle]) => boolean(
            string_arg(s, functions::CONTAINS)?
                .contains(string_arg(needle, functions::CONTAINS)?),
        ),
        (functions::IN_CIDR, [ip, cidr]) => boolean(in_cidr(
            string_arg(ip, functions::IN_CIDR)?,
            string_arg(cidr, functions::IN_CIDR)?,
        )?),
        (functions::SIZE, [v]) => size(v),
        _ => Err(ExprError::UnknownFunction(function.to_owned()).into()),
    }
}

fn string_arg<'v>(value: &'v Value, op: &'static str) -> Result<&'v str, EvalError> {
    value.as_str().ok_or(EvalError::UnexpectedType {
        op,
        expected: "string",
        actual: value.kind(),
    })
}

fn in_cidr(ip: &str, cidr: &str) -> Result<bool, EvalError> {
    // IPv4-mapped IPv6 peers must match IPv4 ranges.
    let addr = ip
        .parse::<IpAddr>()
        .map_err(|_| EvalError::InvalidAddress(ip.to_owned()))?
        .to_canonical();
    let network: IpNetwork = cidr
        .parse()
        .map_err(|_| EvalError::InvalidCidr(cidr.to_owned()))?;
    Ok(network.contains(addr))
}

fn size<'a>(value: &Value) -> Eval<'a> {
    let len = match value {
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(entries) => entries.len(),
        other => {
            return Err(EvalError::UnexpectedType {
                op: functions::SIZE,
                expected: "string, list or map",
                actual: other.kind(),
            });
        }
    };
    Ok(Cow::Owned(Value::Int(i64::try_from(len).unwrap_or(i64::MAX))))
}
