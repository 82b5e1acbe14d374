//! RBAC `AuthZ` Module
//!
//! Decides whether an incoming RPC may proceed, based on the caller's peer
//! attributes and an ordered set of RBAC engines. Any engine matching with
//! `DENY` refuses the call; otherwise one `ALLOW` match permits it;
//! otherwise the call is refused.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;

pub use config::{PolicyConfig, RbacAuthzConfig, RbacPolicyConfig};
pub use domain::{
    Condition, DomainError, EngineRegistry, EvaluationEngine, RbacAuthzLocalClient, Service,
    TreeWalkingEvaluator,
};
