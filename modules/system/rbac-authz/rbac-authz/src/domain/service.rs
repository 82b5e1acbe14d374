//! Decision aggregator for the RBAC `AuthZ` module.

use std::sync::Arc;

use arc_swap::ArcSwap;
use rbac_authz_sdk::{AuthorizationReport, PeerContext};
use tracing::info;

use super::error::DomainError;
use super::registry::EngineRegistry;
use crate::config::RbacAuthzConfig;

/// RBAC `AuthZ` service.
///
/// Holds the active [`EngineRegistry`] behind an [`ArcSwap`]. Every check
/// loads one snapshot and evaluates entirely against it, so a concurrent
/// reload is never observed half-applied.
#[derive(Debug)]
pub struct Service {
    registry: ArcSwap<EngineRegistry>,
}

impl Service {
    #[must_use]
    pub fn new(registry: EngineRegistry) -> Self {
        Self {
            registry: ArcSwap::from_pointee(registry),
        }
    }

    /// Build the service from configuration.
    ///
    /// # Errors
    ///
    /// Any configuration validation error.
    pub fn from_config(config: &RbacAuthzConfig) -> Result<Self, DomainError> {
        let registry = config.build_registry()?;
        info!(engines = registry.len(), "RBAC policies loaded");
        Ok(Self::new(registry))
    }

    /// Build the service from a JSON policy document.
    ///
    /// # Errors
    ///
    /// Parse or validation errors.
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        Self::from_config(&RbacAuthzConfig::from_json_str(json)?)
    }

    /// Final verdict for `peer`: deny overrides allow, default deny.
    #[must_use]
    pub fn authorize(&self, peer: &PeerContext) -> bool {
        let allowed = self.registry.load().authorize(peer);
        tracing::debug!(
            principal = peer.principal().unwrap_or("<none>"),
            path = peer.request_path().unwrap_or("<none>"),
            allowed,
            "RBAC check"
        );
        allowed
    }

    /// Verdict plus the per-engine decisions behind it.
    #[must_use]
    pub fn explain(&self, peer: &PeerContext) -> AuthorizationReport {
        self.registry.load().explain(peer)
    }

    /// The registry currently in force.
    #[must_use]
    pub fn snapshot(&self) -> Arc<EngineRegistry> {
        self.registry.load_full()
    }

    /// Atomically install `registry`, returning the one it replaced.
    ///
    /// In-flight checks finish against the registry they started with.
    #[must_use]
    pub fn replace_registry(&self, registry: EngineRegistry) -> Arc<EngineRegistry> {
        self.registry.swap(Arc::new(registry))
    }

    /// Rebuild the registry from `config` and swap it in.
    ///
    /// # Errors
    ///
    /// Validation errors. The active registry is left untouched.
    #[tracing::instrument(skip_all, fields(engines = config.engines.len()))]
    pub fn reload(&self, config: &RbacAuthzConfig) -> Result<(), DomainError> {
        let registry = config.build_registry().inspect_err(|e| {
            tracing::warn!(error = %e, "RBAC reload rejected; keeping current policies");
        })?;
        let previous = self.replace_registry(registry);
        info!(previous_engines = previous.len(), "RBAC policies reloaded");
        Ok(())
    }

    /// [`reload`](Self::reload) from a JSON policy document.
    ///
    /// # Errors
    ///
    /// Parse or validation errors. The active registry is left untouched.
    pub fn reload_json(&self, json: &str) -> Result<(), DomainError> {
        self.reload(&RbacAuthzConfig::from_json_str(json)?)
    }
}

impl Default for Service {
    fn default() -> Self {
        Self::new(EngineRegistry::empty())
    }
}
