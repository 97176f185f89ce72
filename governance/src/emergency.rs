//! Two-phase emergency trustee replacement.
//!
//! Phase one is an ordinary vote of type EMERGENCY_REPLACEMENT, always held
//! under SUPERMAJORITY. Phase two, once that vote is APPROVED, retires one
//! trustee, seats another and marks the vote EXECUTED in a single commit.
//! If the retiring address has no active voting trustee (admins and counsel
//! hold no quorum seat to hand over) the whole replacement is refused;
//! nothing is written.

use std::sync::Arc;

use custos_store::{Collection, WriteSet};
use custos_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::authz::{require, Role, Session};
use crate::context::GovernanceContext;
use crate::quorum::ActionType;
use crate::registry::{Trustee, TrusteeRegistry, TrusteeStatus, EMERGENCY_REPLACEMENT_REASON};
use crate::vote::{ExecutionRecord, NewVote, Vote, VoteLifecycle, VoteStatus};
use crate::GovernanceError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementRequest {
    pub vote_id: String,
    pub remove_address: WalletAddress,
    pub add_address: WalletAddress,
    pub add_trustee_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementOutcome {
    pub vote: Vote,
    pub retired: Trustee,
    pub admitted: Trustee,
}

pub struct EmergencyReplacementCoordinator {
    ctx: GovernanceContext,
    registry: Arc<TrusteeRegistry>,
    votes: Arc<VoteLifecycle>,
}

impl EmergencyReplacementCoordinator {
    pub fn new(
        ctx: GovernanceContext,
        registry: Arc<TrusteeRegistry>,
        votes: Arc<VoteLifecycle>,
    ) -> Self {
        Self {
            ctx,
            registry,
            votes,
        }
    }

    /// Phase one: open the EMERGENCY_REPLACEMENT vote.
    pub fn propose_replacement(
        &self,
        session: &Session,
        title: &str,
        body: &str,
        closes_at: Option<Timestamp>,
    ) -> Result<Vote, GovernanceError> {
        self.votes.create_vote(
            session,
            NewVote {
                vote_type: ActionType::emergency_replacement(),
                title: title.to_string(),
                body: body.to_string(),
                closes_at,
            },
        )
    }

    /// Phase two: apply an approved replacement atomically.
    pub fn execute_replacement(
        &self,
        session: &Session,
        request: ReplacementRequest,
    ) -> Result<ReplacementOutcome, GovernanceError> {
        let now = self.ctx.now();
        require(session, Role::ADMINS, "execute emergency replacements", now)?;
        if request.add_trustee_id.trim().is_empty() {
            return Err(GovernanceError::Validation("addTrusteeId is empty".into()));
        }

        // Lock order: registry, then vote.
        let _registry_guard = self.registry.lock();
        let _vote_guard = self.votes.lock_vote(&request.vote_id);

        let mut vote = self.votes.load(&request.vote_id)?;
        if !vote.vote_type.is_emergency_replacement() {
            return Err(GovernanceError::WrongVoteType {
                id: vote.id,
                kind: vote.vote_type.to_string(),
                expected: ActionType::EMERGENCY_REPLACEMENT.into(),
            });
        }
        if vote.status != VoteStatus::Approved {
            return Err(GovernanceError::NotApproved {
                id: vote.id,
                status: vote.status.to_string(),
            });
        }

        let retiree = self
            .registry
            .find_active(&request.remove_address)?
            .filter(Trustee::is_voting_member);
        let Some(mut retired) = retiree else {
            tracing::warn!(
                vote_id = %vote.id,
                remove = %request.remove_address,
                "replacement aborted: no active voting trustee to retire"
            );
            return Err(GovernanceError::not_found(
                "trustee",
                request.remove_address.to_string(),
            ));
        };
        if self.registry.find_active(&request.add_address)?.is_some() {
            return Err(GovernanceError::AlreadyActive(request.add_address.to_string()));
        }
        if self.registry.get(&request.add_trustee_id)?.is_some() {
            return Err(GovernanceError::DuplicateId(request.add_trustee_id));
        }

        retired.status = TrusteeStatus::Retired;
        retired.retired_at = Some(now);
        retired.reason = Some(EMERGENCY_REPLACEMENT_REASON.into());
        let admitted = Trustee {
            id: request.add_trustee_id.clone(),
            address: request.add_address.clone(),
            role: Role::Trustee,
            status: TrusteeStatus::Active,
            created_at: now,
            retired_at: None,
            reason: Some(EMERGENCY_REPLACEMENT_REASON.into()),
        };
        vote.status = VoteStatus::Executed;
        vote.executed_at = Some(now);
        vote.execution = Some(ExecutionRecord {
            remove_address: request.remove_address,
            add_address: request.add_address,
            add_trustee_id: request.add_trustee_id,
        });

        let mut writes = WriteSet::new();
        writes.put_record(Collection::Trustees, &retired.id, &retired)?;
        writes.put_record(Collection::Trustees, &admitted.id, &admitted)?;
        writes.put_record(Collection::Votes, &vote.id, &vote)?;
        self.ctx.commit(writes)?;

        tracing::info!(
            vote_id = %vote.id,
            retired = %retired.address,
            admitted = %admitted.address,
            "emergency replacement executed"
        );
        Ok(ReplacementOutcome {
            vote,
            retired,
            admitted,
        })
    }
}
