//! Public API trait for the RBAC `AuthZ` engine.

use crate::models::AuthorizationReport;
use crate::peer::PeerContext;

/// Public API trait consumed by server integrations.
///
/// Evaluation is synchronous and bounded: no I/O, no suspension points.
/// Callers that need a deadline enforce it around the call.
///
/// ```ignore
/// let authz: Arc<dyn RbacAuthzClient> = Arc::new(RbacAuthzLocalClient::new(service));
///
/// if !authz.authorize(&peer) {
///     return Err(Status::permission_denied("unauthorized RPC"));
/// }
/// ```
pub trait RbacAuthzClient: Send + Sync {
    /// Final verdict for the call. `true` lets the RPC proceed; `false`
    /// must make the integration reject it.
    fn authorize(&self, peer: &PeerContext) -> bool;

    /// Same verdict as [`authorize`](Self::authorize), plus the per-engine
    /// decisions that produced it, for audit logging.
    fn explain(&self, peer: &PeerContext) -> AuthorizationReport;
}
