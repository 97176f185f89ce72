//! The proposal state machine.
//!
//! ```text
//! OPEN ──tally──▶ APPROVED ──execute──▶ EXECUTED
//!   │                │
//!   └──tally──▶ REJECTED
//! any non-EXECUTED state ──archive──▶ ARCHIVED
//! ```
//!
//! Quorum is frozen on the record at creation. `closes_at` is enforced
//! lazily: an OPEN vote past its deadline stays OPEN in storage and refuses
//! further ballots with `EXPIRED`.

use std::fmt;
use std::sync::Arc;

use custos_store::{Collection, WriteSet};
use custos_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::authz::{require, Role, Session};
use crate::binding::{vote_tag, SignedMessage};
use crate::context::GovernanceContext;
use crate::locks::{EntityGuard, EntityLocks};
use crate::quorum::{vote_policy_key, ActionType, QuorumPolicyEngine};
use crate::GovernanceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteStatus {
    Open,
    Approved,
    Rejected,
    Executed,
    Archived,
}

impl VoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Executed => "EXECUTED",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl fmt::Display for VoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Choice {
    Approve,
    Reject,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ballot {
    pub address: WalletAddress,
    pub choice: Choice,
    pub message: String,
    pub signature: String,
    pub signed_at: Timestamp,
}

/// What an emergency replacement did, kept on the executed vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub remove_address: WalletAddress,
    pub add_address: WalletAddress,
    pub add_trustee_id: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub approvals: usize,
    pub rejects: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub id: String,
    #[serde(rename = "type")]
    pub vote_type: ActionType,
    pub title: String,
    pub body: String,
    pub status: VoteStatus,
    pub created_by: WalletAddress,
    pub created_at: Timestamp,
    pub closes_at: Timestamp,
    pub quorum_required: usize,
    pub ballots: Vec<Ballot>,
    pub executed_at: Option<Timestamp>,
    pub archived_at: Option<Timestamp>,
    pub execution: Option<ExecutionRecord>,
}

impl Vote {
    pub fn tally(&self) -> Tally {
        self.ballots.iter().fold(Tally::default(), |mut t, b| {
            match b.choice {
                Choice::Approve => t.approvals += 1,
                Choice::Reject => t.rejects += 1,
            }
            t
        })
    }

    pub fn ballot_of(&self, address: &WalletAddress) -> Option<&Ballot> {
        self.ballots.iter().find(|b| &b.address == address)
    }

    /// Archived votes live in history rather than the active list.
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }

    /// Re-evaluate an OPEN vote after a ballot. Approval is checked first.
    fn settle(&mut self) -> Option<VoteStatus> {
        if self.status != VoteStatus::Open {
            return None;
        }
        let tally = self.tally();
        let next = if tally.approvals >= self.quorum_required {
            VoteStatus::Approved
        } else if tally.rejects >= self.quorum_required {
            VoteStatus::Rejected
        } else {
            return None;
        };
        self.status = next;
        Some(next)
    }

    fn invalid(&self, action: &'static str) -> GovernanceError {
        GovernanceError::InvalidState {
            id: self.id.clone(),
            status: self.status.to_string(),
            action,
        }
    }
}

/// Input to [`VoteLifecycle::create_vote`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVote {
    #[serde(rename = "type")]
    pub vote_type: ActionType,
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// Defaults to now plus the configured voting window.
    #[serde(default)]
    pub closes_at: Option<Timestamp>,
}

pub struct VoteLifecycle {
    ctx: GovernanceContext,
    quorum: Arc<QuorumPolicyEngine>,
    locks: EntityLocks,
    default_window_secs: u64,
}

impl VoteLifecycle {
    pub fn new(
        ctx: GovernanceContext,
        quorum: Arc<QuorumPolicyEngine>,
        default_window_secs: u64,
    ) -> Self {
        Self {
            ctx,
            quorum,
            locks: EntityLocks::default(),
            default_window_secs,
        }
    }

    pub fn create_vote(&self, session: &Session, request: NewVote) -> Result<Vote, GovernanceError> {
        let now = self.ctx.now();
        require(session, Role::ADMINS, "create votes", now)?;
        if request.title.trim().is_empty() {
            return Err(GovernanceError::Validation("vote title is empty".into()));
        }
        let closes_at = request
            .closes_at
            .unwrap_or_else(|| now.plus_secs(self.default_window_secs));
        if closes_at <= now {
            return Err(GovernanceError::Validation(format!(
                "closesAt {closes_at} is not in the future"
            )));
        }

        let quorum_required = self
            .quorum
            .quorum_required(&vote_policy_key(&request.vote_type))?;
        let vote = Vote {
            id: self.ctx.new_id("vote")?,
            vote_type: request.vote_type,
            title: request.title,
            body: request.body,
            status: VoteStatus::Open,
            created_by: session.address.clone(),
            created_at: now,
            closes_at,
            quorum_required,
            ballots: Vec::new(),
            executed_at: None,
            archived_at: None,
            execution: None,
        };

        let mut writes = WriteSet::new();
        writes.put_record(Collection::Votes, &vote.id, &vote)?;
        self.ctx.commit(writes)?;
        tracing::info!(
            vote_id = %vote.id,
            vote_type = %vote.vote_type,
            quorum = quorum_required,
            "vote created"
        );
        Ok(vote)
    }

    /// Record a signed ballot. A second ballot from the same address is
    /// accepted as a no-op and returns the vote unchanged.
    pub fn cast_ballot(
        &self,
        session: &Session,
        vote_id: &str,
        choice: Choice,
        signed: SignedMessage,
    ) -> Result<Vote, GovernanceError> {
        require(session, Role::SIGNERS, "cast ballots", self.ctx.now())?;
        let _guard = self.locks.lock(vote_id);

        let mut vote = self.load(vote_id)?;
        if vote.status != VoteStatus::Open {
            return Err(vote.invalid("cast a ballot on"));
        }
        let now = self.ctx.now();
        if now > vote.closes_at {
            return Err(GovernanceError::Expired(format!("vote {vote_id}")));
        }
        self.ctx.check_signed(session, &signed, &vote_tag(vote_id))?;
        if vote.ballot_of(&signed.address).is_some() {
            tracing::debug!(vote_id, address = %signed.address, "duplicate ballot ignored");
            return Ok(vote);
        }

        vote.ballots.push(Ballot {
            address: signed.address,
            choice,
            message: signed.message,
            signature: signed.signature,
            signed_at: now,
        });
        let transition = vote.settle();

        let mut writes = WriteSet::new();
        writes.put_record(Collection::Votes, &vote.id, &vote)?;
        self.ctx.commit(writes)?;

        let tally = vote.tally();
        tracing::debug!(
            vote_id,
            approvals = tally.approvals,
            rejects = tally.rejects,
            quorum = vote.quorum_required,
            "ballot recorded"
        );
        if let Some(status) = transition {
            tracing::info!(vote_id, %status, "vote settled");
        }
        Ok(vote)
    }

    /// Mark an APPROVED vote EXECUTED. Emergency replacement votes are
    /// executed through the replacement coordinator instead.
    pub fn execute_vote(&self, session: &Session, vote_id: &str) -> Result<Vote, GovernanceError> {
        let now = self.ctx.now();
        require(session, Role::ADMINS, "execute votes", now)?;
        let _guard = self.locks.lock(vote_id);

        let mut vote = self.load(vote_id)?;
        if vote.vote_type.is_emergency_replacement() {
            return Err(GovernanceError::WrongVoteType {
                id: vote.id,
                kind: vote.vote_type.to_string(),
                expected: "a non-emergency type".into(),
            });
        }
        if vote.status != VoteStatus::Approved {
            return Err(vote.invalid("execute"));
        }
        vote.status = VoteStatus::Executed;
        vote.executed_at = Some(now);

        let mut writes = WriteSet::new();
        writes.put_record(Collection::Votes, &vote.id, &vote)?;
        self.ctx.commit(writes)?;
        tracing::info!(vote_id, "vote executed");
        Ok(vote)
    }

    /// Move a vote into history. Non-executed votes become ARCHIVED; an
    /// executed vote keeps its EXECUTED status. Archiving twice is a no-op.
    pub fn archive_vote(&self, session: &Session, vote_id: &str) -> Result<Vote, GovernanceError> {
        let now = self.ctx.now();
        require(session, Role::ANY, "archive votes", now)?;
        let _guard = self.locks.lock(vote_id);

        let mut vote = self.load(vote_id)?;
        if vote.is_archived() {
            tracing::debug!(vote_id, "vote already archived");
            return Ok(vote);
        }
        if vote.status != VoteStatus::Executed {
            vote.status = VoteStatus::Archived;
        }
        vote.archived_at = Some(now);

        let mut writes = WriteSet::new();
        writes.put_record(Collection::Votes, &vote.id, &vote)?;
        self.ctx.commit(writes)?;
        tracing::info!(vote_id, status = %vote.status, "vote archived");
        Ok(vote)
    }

    pub fn get_vote(&self, session: &Session, vote_id: &str) -> Result<Vote, GovernanceError> {
        require(session, Role::ANY, "view votes", self.ctx.now())?;
        self.load(vote_id)
    }

    /// Votes not yet archived, oldest first.
    pub fn list_active_votes(&self, session: &Session) -> Result<Vec<Vote>, GovernanceError> {
        require(session, Role::ANY, "list votes", self.ctx.now())?;
        Ok(self.all()?.into_iter().filter(|v| !v.is_archived()).collect())
    }

    /// Archived votes, oldest first.
    pub fn list_vote_history(&self, session: &Session) -> Result<Vec<Vote>, GovernanceError> {
        require(session, Role::ANY, "list votes", self.ctx.now())?;
        Ok(self.all()?.into_iter().filter(Vote::is_archived).collect())
    }

    pub(crate) fn all(&self) -> Result<Vec<Vote>, GovernanceError> {
        let mut votes: Vec<Vote> = self.ctx.load_all(Collection::Votes)?;
        votes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(votes)
    }

    pub(crate) fn load(&self, vote_id: &str) -> Result<Vote, GovernanceError> {
        self.ctx
            .load(Collection::Votes, vote_id)?
            .ok_or_else(|| GovernanceError::not_found("vote", vote_id))
    }

    /// The per-vote lock, for coordinators that mutate a vote alongside
    /// other aggregates.
    pub(crate) fn lock_vote(&self, vote_id: &str) -> EntityGuard<'_> {
        self.locks.lock(vote_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vote(quorum: usize) -> Vote {
        Vote {
            id: "vote_1".into(),
            vote_type: ActionType::standard(),
            title: "t".into(),
            body: String::new(),
            status: VoteStatus::Open,
            created_by: WalletAddress::new("cst_admin"),
            created_at: Timestamp::new(0),
            closes_at: Timestamp::new(100),
            quorum_required: quorum,
            ballots: Vec::new(),
            executed_at: None,
            archived_at: None,
            execution: None,
        }
    }

    fn ballot(who: &str, choice: Choice) -> Ballot {
        Ballot {
            address: WalletAddress::new(format!("cst_{who}")),
            choice,
            message: "VOTE:vote_1".into(),
            signature: String::new(),
            signed_at: Timestamp::new(1),
        }
    }

    #[test]
    fn settles_on_approval_quorum() {
        let mut v = vote(2);
        v.ballots.push(ballot("a", Choice::Approve));
        assert_eq!(v.settle(), None);
        v.ballots.push(ballot("b", Choice::Approve));
        assert_eq!(v.settle(), Some(VoteStatus::Approved));
        v.ballots.push(ballot("c", Choice::Reject));
        assert_eq!(v.settle(), None);
        assert_eq!(v.status, VoteStatus::Approved);
    }

    #[test]
    fn settles_on_rejection_quorum() {
        let mut v = vote(2);
        v.ballots.push(ballot("a", Choice::Reject));
        v.ballots.push(ballot("b", Choice::Approve));
        assert_eq!(v.settle(), None);
        v.ballots.push(ballot("c", Choice::Reject));
        assert_eq!(v.settle(), Some(VoteStatus::Rejected));
        assert_eq!(v.tally(), Tally { approvals: 1, rejects: 2 });
    }

    #[test]
    fn approval_is_checked_before_rejection() {
        let mut v = vote(1);
        v.ballots.push(ballot("a", Choice::Reject));
        v.ballots.push(ballot("b", Choice::Approve));
        assert_eq!(v.settle(), Some(VoteStatus::Approved));
    }

    #[test]
    fn vote_json_uses_type_key() {
        let json = serde_json::to_value(vote(2)).unwrap();
        assert_eq!(json["type"], "STANDARD");
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["quorumRequired"], 2);
    }
}
