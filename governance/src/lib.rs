//! Trustee governance for Custos.
//!
//! A small, trusted group of trustees decides by quorum vote, and changes to
//! that group are themselves gated by a supermajority vote.
//!
//! - [`TrusteeRegistry`]: who is seated; never deletes history
//! - [`QuorumPolicyEngine`]: policy + active count → required signatures
//! - [`VoteLifecycle`]: OPEN → APPROVED/REJECTED → EXECUTED, plus archive
//! - [`ProxyDelegationStore`]: scoped, expiring delegation
//! - [`AttestationStore`]: threshold multi-signature documents
//! - [`EmergencyReplacementCoordinator`]: approved vote → atomic registry swap
//! - [`AuditExporter`]: read-only report over all of the above
//!
//! Every mutation re-reads its aggregate under a per-record lock, applies a
//! pure transition and commits a single [`custos_store::WriteSet`].

pub mod attestation;
pub mod audit;
pub mod authz;
pub mod binding;
pub mod context;
pub mod emergency;
pub mod engine;
pub mod error;
mod locks;
pub mod params;
pub mod proxy;
pub mod quorum;
pub mod registry;
pub mod vote;

pub use attestation::{Attestation, AttestationSignature, AttestationStatus, AttestationStore};
pub use audit::{AuditExporter, AuditReport, ProxyEntry, VoteEntry};
pub use authz::{authorize, Role, Session};
pub use binding::SignedMessage;
pub use context::GovernanceContext;
pub use emergency::{EmergencyReplacementCoordinator, ReplacementOutcome, ReplacementRequest};
pub use engine::GovernanceEngine;
pub use error::{ErrorClass, GovernanceError};
pub use params::GovernanceParams;
pub use proxy::{NewProxy, Proxy, ProxyDelegationStore, ProxyScope, ProxyStatus};
pub use quorum::{
    required_signatures, ActionType, PolicyKind, QuorumPolicies, QuorumPolicy, QuorumPolicyEngine,
    QuorumSnapshot,
};
pub use registry::{Trustee, TrusteeRegistry, TrusteeSeed, TrusteeStatus};
pub use vote::{Ballot, Choice, ExecutionRecord, NewVote, Tally, Vote, VoteLifecycle, VoteStatus};

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use custos_crypto::{blake2b_256, derive_address, keypair_from_seed, Ed25519Verifier};
    use custos_nullables::{NullClock, NullStore};
    use custos_types::{KeyPair, Timestamp, WalletAddress};

    use crate::authz::{Role, Session};
    use crate::context::GovernanceContext;

    pub const START: u64 = 1_700_000_000;

    pub fn keypair(name: &str) -> KeyPair {
        keypair_from_seed(&blake2b_256(name.as_bytes()))
    }

    pub fn address(name: &str) -> WalletAddress {
        derive_address(&keypair(name).public)
    }

    pub fn session(name: &str, role: Role) -> Session {
        Session {
            address: address(name),
            role,
            trustee_id: name.to_string(),
            expires_at: Timestamp::new(START + 1_000_000),
        }
    }

    pub fn context() -> (GovernanceContext, Arc<NullClock>, Arc<NullStore>) {
        let clock = Arc::new(NullClock::new(START));
        let store = Arc::new(NullStore::new());
        let ctx = GovernanceContext::new(store.clone(), clock.clone(), Arc::new(Ed25519Verifier));
        (ctx, clock, store)
    }
}
