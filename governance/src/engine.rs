//! Wiring of every governance component over one shared context.

use std::sync::Arc;

use crate::attestation::AttestationStore;
use crate::audit::AuditExporter;
use crate::authz::{require, Role, Session};
use crate::context::GovernanceContext;
use crate::emergency::EmergencyReplacementCoordinator;
use crate::params::GovernanceParams;
use crate::proxy::ProxyDelegationStore;
use crate::quorum::QuorumPolicyEngine;
use crate::registry::{Trustee, TrusteeRegistry};
use crate::vote::VoteLifecycle;
use crate::GovernanceError;

/// The governance subsystem. Each component is reachable through an
/// accessor and every entry point takes the caller's [`Session`].
pub struct GovernanceEngine {
    ctx: GovernanceContext,
    params: GovernanceParams,
    registry: Arc<TrusteeRegistry>,
    quorum: Arc<QuorumPolicyEngine>,
    votes: Arc<VoteLifecycle>,
    proxies: Arc<ProxyDelegationStore>,
    attestations: Arc<AttestationStore>,
    emergency: EmergencyReplacementCoordinator,
    audit: AuditExporter,
}

impl GovernanceEngine {
    pub fn new(ctx: GovernanceContext, params: GovernanceParams) -> Self {
        let registry = Arc::new(TrusteeRegistry::new(ctx.clone()));
        let quorum = Arc::new(QuorumPolicyEngine::new(
            Arc::clone(&registry),
            params.policies.clone(),
        ));
        let votes = Arc::new(VoteLifecycle::new(
            ctx.clone(),
            Arc::clone(&quorum),
            params.default_vote_window_secs,
        ));
        let proxies = Arc::new(ProxyDelegationStore::new(
            ctx.clone(),
            params.default_proxy_ttl_secs,
        ));
        let attestations = Arc::new(AttestationStore::new(ctx.clone(), Arc::clone(&quorum)));
        let emergency = EmergencyReplacementCoordinator::new(
            ctx.clone(),
            Arc::clone(&registry),
            Arc::clone(&votes),
        );
        let audit = AuditExporter::new(
            ctx.clone(),
            Arc::clone(&registry),
            Arc::clone(&quorum),
            Arc::clone(&votes),
            Arc::clone(&proxies),
            Arc::clone(&attestations),
        );
        Self {
            ctx,
            params,
            registry,
            quorum,
            votes,
            proxies,
            attestations,
            emergency,
            audit,
        }
    }

    pub fn context(&self) -> &GovernanceContext {
        &self.ctx
    }

    pub fn params(&self) -> &GovernanceParams {
        &self.params
    }

    pub fn registry(&self) -> &Arc<TrusteeRegistry> {
        &self.registry
    }

    pub fn quorum(&self) -> &QuorumPolicyEngine {
        &self.quorum
    }

    pub fn votes(&self) -> &VoteLifecycle {
        &self.votes
    }

    pub fn proxies(&self) -> &ProxyDelegationStore {
        &self.proxies
    }

    pub fn attestations(&self) -> &AttestationStore {
        &self.attestations
    }

    pub fn emergency(&self) -> &EmergencyReplacementCoordinator {
        &self.emergency
    }

    pub fn audit(&self) -> &AuditExporter {
        &self.audit
    }

    /// Active voting trustees, for any authenticated caller.
    pub fn list_trustees(&self, session: &Session) -> Result<Vec<Trustee>, GovernanceError> {
        require(session, Role::ANY, "list trustees", self.ctx.now())?;
        self.registry.list_active()
    }
}
