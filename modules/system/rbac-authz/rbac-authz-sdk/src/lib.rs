#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! RBAC `AuthZ` SDK
//!
//! This crate provides the public contract of the `rbac_authz` module:
//!
//! - [`RbacAuthzClient`] - Public API trait for server integrations
//! - [`ConditionEvaluator`] - Plugin API trait for expression evaluators
//! - [`Decision`], [`Action`], [`AuthorizationDecision`], [`AuthorizationReport`] - Decision models
//! - [`PeerContext`] - Per-call peer attributes, see [`attributes`]
//! - [`Expr`], [`Value`] - Condition expression tree
//! - [`ExprError`] - Structural condition errors
//! - [`PeerEnforcer`] - PEP helper turning verdicts into `Result`s
//!
//! ## Usage
//!
//! ```ignore
//! use rbac_authz_sdk::{PeerContext, PeerEnforcer, RbacAuthzClient};
//!
//! let enforcer = PeerEnforcer::new(authz);
//!
//! let peer = PeerContext::builder()
//!     .source(remote_addr)
//!     .principal(spiffe_id)
//!     .path("/helloworld.Greeter/SayHello")
//!     .build();
//!
//! enforcer.check(&peer)?;
//! ```

pub mod api;
pub mod enforcer;
pub mod error;
pub mod expr;
pub mod models;
pub mod peer;
pub mod plugin_api;

// Re-export main types at crate root
pub use api::RbacAuthzClient;
pub use enforcer::{EnforcerError, PeerEnforcer};
pub use error::ExprError;
pub use expr::{Expr, MAX_EXPR_DEPTH, Value, functions};
pub use models::{
    Action, AuthorizationDecision, AuthorizationReport, Decision, NO_ENGINE_ALLOWED,
    NO_POLICIES_MATCHED, POLICY_MATCHED_PREFIX,
};
pub use peer::{PeerContext, PeerContextBuilder, attributes};
pub use plugin_api::ConditionEvaluator;
