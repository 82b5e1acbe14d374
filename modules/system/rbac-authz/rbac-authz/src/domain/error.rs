//! Domain errors for the RBAC `AuthZ` module.
//!
//! These cover loading and reloading policies only. Evaluation never
//! fails: a denied call is a `false` verdict, not an error.

/// Internal domain errors.
#[derive(thiserror::Error, Debug)]
pub enum DomainError {
    #[error("invalid RBAC configuration: {0}")]
    InvalidConfig(String),

    #[error("engine #{engine} has a policy with an empty name")]
    EmptyPolicyName { engine: usize },
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidConfig(e.to_string())
    }
}
