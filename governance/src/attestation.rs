//! Documents that become binding once enough trustees sign them.
//!
//! The threshold is the ATTESTATION quorum evaluated against the active
//! membership at the moment each signature lands, so an attestation
//! created under one membership completes under whatever membership is
//! seated when the deciding signature arrives.

use std::sync::Arc;

use custos_store::{Collection, WriteSet};
use custos_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::authz::{require, Role, Session};
use crate::binding::{attestation_tag, SignedMessage};
use crate::context::GovernanceContext;
use crate::locks::EntityLocks;
use crate::quorum::{ActionType, QuorumPolicyEngine};
use crate::GovernanceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttestationStatus {
    Pending,
    Complete,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttestationSignature {
    pub address: WalletAddress,
    pub message: String,
    pub signature: String,
    pub signed_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attestation {
    pub id: String,
    pub title: String,
    pub body: String,
    pub status: AttestationStatus,
    pub created_by: WalletAddress,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub signed_by: Vec<AttestationSignature>,
}

impl Attestation {
    pub fn has_signed(&self, address: &WalletAddress) -> bool {
        self.signed_by.iter().any(|s| &s.address == address)
    }
}

pub struct AttestationStore {
    ctx: GovernanceContext,
    quorum: Arc<QuorumPolicyEngine>,
    locks: EntityLocks,
}

impl AttestationStore {
    pub fn new(ctx: GovernanceContext, quorum: Arc<QuorumPolicyEngine>) -> Self {
        Self {
            ctx,
            quorum,
            locks: EntityLocks::default(),
        }
    }

    pub fn create_attestation(
        &self,
        session: &Session,
        title: &str,
        body: &str,
    ) -> Result<Attestation, GovernanceError> {
        let now = self.ctx.now();
        require(session, Role::ADMINS, "create attestations", now)?;
        if title.trim().is_empty() {
            return Err(GovernanceError::Validation("attestation title is empty".into()));
        }
        let attestation = Attestation {
            id: self.ctx.new_id("att")?,
            title: title.to_string(),
            body: body.to_string(),
            status: AttestationStatus::Pending,
            created_by: session.address.clone(),
            created_at: now,
            completed_at: None,
            signed_by: Vec::new(),
        };
        let mut writes = WriteSet::new();
        writes.put_record(Collection::Attestations, &attestation.id, &attestation)?;
        self.ctx.commit(writes)?;
        tracing::info!(attestation_id = %attestation.id, "attestation created");
        Ok(attestation)
    }

    /// Append a signature. A repeat signer is a no-op.
    pub fn sign_attestation(
        &self,
        session: &Session,
        attestation_id: &str,
        signed: SignedMessage,
    ) -> Result<Attestation, GovernanceError> {
        let now = self.ctx.now();
        require(session, Role::SIGNERS, "sign attestations", now)?;
        let _guard = self.locks.lock(attestation_id);

        let mut attestation = self.load(attestation_id)?;
        if attestation.status == AttestationStatus::Complete {
            return Err(GovernanceError::InvalidState {
                id: attestation.id,
                status: "COMPLETE".into(),
                action: "sign",
            });
        }
        self.ctx
            .check_signed(session, &signed, &attestation_tag(attestation_id))?;
        if attestation.has_signed(&signed.address) {
            tracing::debug!(attestation_id, address = %signed.address, "duplicate signature ignored");
            return Ok(attestation);
        }

        let required = self.quorum.quorum_required(&ActionType::attestation())?;
        attestation.signed_by.push(AttestationSignature {
            address: signed.address,
            message: signed.message,
            signature: signed.signature,
            signed_at: now,
        });
        let completed = attestation.signed_by.len() >= required;
        if completed {
            attestation.status = AttestationStatus::Complete;
            attestation.completed_at = Some(now);
        }

        let mut writes = WriteSet::new();
        writes.put_record(Collection::Attestations, &attestation.id, &attestation)?;
        self.ctx.commit(writes)?;
        tracing::debug!(
            attestation_id,
            signatures = attestation.signed_by.len(),
            required,
            "attestation signed"
        );
        if completed {
            tracing::info!(attestation_id, "attestation complete");
        }
        Ok(attestation)
    }

    pub fn get_attestation(
        &self,
        session: &Session,
        attestation_id: &str,
    ) -> Result<Attestation, GovernanceError> {
        require(session, Role::ANY, "view attestations", self.ctx.now())?;
        self.load(attestation_id)
    }

    pub fn list_attestations(&self, session: &Session) -> Result<Vec<Attestation>, GovernanceError> {
        require(session, Role::ANY, "list attestations", self.ctx.now())?;
        self.all()
    }

    pub(crate) fn all(&self) -> Result<Vec<Attestation>, GovernanceError> {
        let mut all: Vec<Attestation> = self.ctx.load_all(Collection::Attestations)?;
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    fn load(&self, attestation_id: &str) -> Result<Attestation, GovernanceError> {
        self.ctx
            .load(Collection::Attestations, attestation_id)?
            .ok_or_else(|| GovernanceError::not_found("attestation", attestation_id))
    }
}
