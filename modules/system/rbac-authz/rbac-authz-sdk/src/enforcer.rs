//! Policy Enforcement Point (`PEP`) helper.
//!
//! [`PeerEnforcer`] turns the boolean verdict of an [`RbacAuthzClient`]
//! into a `Result`, the shape a server interceptor maps onto a
//! permission-denied status.

use std::sync::Arc;

use crate::api::RbacAuthzClient;
use crate::peer::PeerContext;

/// Error from the PEP enforcement flow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnforcerError {
    /// The policies did not permit the call.
    #[error("permission denied: {justification}")]
    PermissionDenied {
        /// Why the call was refused (matched deny policy or default deny).
        justification: String,
    },
}

/// Policy Enforcement Point for RPC peers.
///
/// Constructed once during server init; cheap to clone (`Arc` inside).
///
/// ```ignore
/// let enforcer = PeerEnforcer::new(authz.clone());
///
/// enforcer.check(&peer).map_err(|e| Status::permission_denied(e.to_string()))?;
/// ```
#[derive(Clone)]
pub struct PeerEnforcer {
    authz: Arc<dyn RbacAuthzClient>,
}

impl PeerEnforcer {
    /// Create a new enforcer.
    #[must_use]
    pub fn new(authz: Arc<dyn RbacAuthzClient>) -> Self {
        Self { authz }
    }

    /// Permit or refuse the call described by `peer`.
    ///
    /// # Errors
    ///
    /// [`EnforcerError::PermissionDenied`] when the verdict is deny. The
    /// justification comes from the engine that decided it.
    pub fn check(&self, peer: &PeerContext) -> Result<(), EnforcerError> {
        let report = self.authz.explain(peer);
        if report.allowed {
            return Ok(());
        }

        let justification = report.justification().to_owned();
        tracing::debug!(
            principal = peer.principal().unwrap_or("<none>"),
            path = peer.request_path().unwrap_or("<none>"),
            justification = %justification,
            "RPC rejected by RBAC policy"
        );
        Err(EnforcerError::PermissionDenied { justification })
    }

    /// Fast path: only the verdict, no justification.
    #[must_use]
    pub fn is_allowed(&self, peer: &PeerContext) -> bool {
        self.authz.authorize(peer)
    }
}

impl std::fmt::Debug for PeerEnforcer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeerEnforcer").finish_non_exhaustive()
    }
}
