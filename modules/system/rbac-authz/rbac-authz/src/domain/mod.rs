//! Domain layer for the RBAC `AuthZ` module.

pub mod condition;
pub mod engine;
pub mod error;
pub mod interpreter;
pub mod local_client;
pub mod registry;
pub mod service;

pub use condition::Condition;
pub use engine::EvaluationEngine;
pub use error::DomainError;
pub use interpreter::TreeWalkingEvaluator;
pub use local_client::RbacAuthzLocalClient;
pub use registry::EngineRegistry;
pub use service::Service;
