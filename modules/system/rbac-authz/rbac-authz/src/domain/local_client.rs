//! Local (in-process) client for the RBAC `AuthZ` module.

use std::sync::Arc;

use rbac_authz_sdk::{AuthorizationReport, PeerContext, RbacAuthzClient};

use super::Service;

/// Local client wrapping the service.
#[derive(Debug, Clone)]
pub struct RbacAuthzLocalClient {
    svc: Arc<Service>,
}

impl RbacAuthzLocalClient {
    #[must_use]
    pub fn new(svc: Arc<Service>) -> Self {
        Self { svc }
    }
}

impl RbacAuthzClient for RbacAuthzLocalClient {
    fn authorize(&self, peer: &PeerContext) -> bool {
        self.svc.authorize(peer)
    }

    fn explain(&self, peer: &PeerContext) -> AuthorizationReport {
        self.svc.explain(peer)
    }
}
