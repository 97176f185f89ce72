//! Read-only projection of governance state for auditors.

use std::fmt::Write as _;
use std::sync::Arc;

use custos_types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::attestation::{Attestation, AttestationStore};
use crate::authz::{require, Role, Session};
use crate::context::GovernanceContext;
use crate::proxy::{Proxy, ProxyDelegationStore};
use crate::quorum::{QuorumPolicyEngine, QuorumSnapshot};
use crate::registry::{Trustee, TrusteeRegistry};
use crate::vote::{Tally, Vote, VoteLifecycle};
use crate::GovernanceError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEntry {
    pub vote: Vote,
    pub tally: Tally,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyEntry {
    pub proxy: Proxy,
    /// ACTIVE and unexpired at report time.
    pub effective: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub generated_at: Timestamp,
    pub generated_by: String,
    pub trustees: Vec<Trustee>,
    pub quorum: Vec<QuorumSnapshot>,
    pub active_votes: Vec<VoteEntry>,
    pub archived_votes: Vec<VoteEntry>,
    pub proxies: Vec<ProxyEntry>,
    pub attestations: Vec<Attestation>,
}

impl AuditReport {
    /// Plain-text rendering for humans.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "CUSTOS GOVERNANCE AUDIT REPORT");
        let _ = writeln!(out, "generated at {} by {}", self.generated_at, self.generated_by);

        let _ = writeln!(out, "\nTRUSTEES ({})", self.trustees.len());
        for t in &self.trustees {
            let _ = write!(out, "  {:<16} {:<16} {:?}  {}", t.id, t.role.as_str(), t.status, t.address);
            if let Some(reason) = &t.reason {
                let _ = write!(out, "  [{reason}]");
            }
            out.push('\n');
        }

        let _ = writeln!(out, "\nQUORUM");
        for q in &self.quorum {
            let _ = writeln!(
                out,
                "  {:<24} {:<14} {} of {}",
                q.action_type.as_str(),
                String::from(q.policy.kind.clone()),
                q.required,
                q.active_count
            );
        }

        for (heading, votes) in [("ACTIVE VOTES", &self.active_votes), ("VOTE HISTORY", &self.archived_votes)] {
            let _ = writeln!(out, "\n{heading} ({})", votes.len());
            for entry in votes {
                let v = &entry.vote;
                let _ = writeln!(
                    out,
                    "  {} [{}] {} \"{}\" approve {} / reject {} / need {}",
                    v.id,
                    v.vote_type,
                    v.status,
                    v.title,
                    entry.tally.approvals,
                    entry.tally.rejects,
                    v.quorum_required
                );
                if let Some(exec) = &v.execution {
                    let _ = writeln!(
                        out,
                        "    replaced {} with {} ({})",
                        exec.remove_address, exec.add_address, exec.add_trustee_id
                    );
                }
            }
        }

        let _ = writeln!(out, "\nPROXIES ({})", self.proxies.len());
        for entry in &self.proxies {
            let p = &entry.proxy;
            let scope: Vec<&str> = p.scope.iter().map(|s| s.as_str()).collect();
            let _ = writeln!(
                out,
                "  {} {} -> {} [{}] {:?}{}",
                p.id,
                p.grantor,
                p.delegate,
                scope.join(","),
                p.status,
                if entry.effective { "" } else { " (not effective)" }
            );
        }

        let _ = writeln!(out, "\nATTESTATIONS ({})", self.attestations.len());
        for a in &self.attestations {
            let _ = writeln!(
                out,
                "  {} {:?} \"{}\" signatures {}",
                a.id,
                a.status,
                a.title,
                a.signed_by.len()
            );
        }
        out
    }
}

pub struct AuditExporter {
    ctx: GovernanceContext,
    registry: Arc<TrusteeRegistry>,
    quorum: Arc<QuorumPolicyEngine>,
    votes: Arc<VoteLifecycle>,
    proxies: Arc<ProxyDelegationStore>,
    attestations: Arc<AttestationStore>,
}

impl AuditExporter {
    pub fn new(
        ctx: GovernanceContext,
        registry: Arc<TrusteeRegistry>,
        quorum: Arc<QuorumPolicyEngine>,
        votes: Arc<VoteLifecycle>,
        proxies: Arc<ProxyDelegationStore>,
        attestations: Arc<AttestationStore>,
    ) -> Self {
        Self {
            ctx,
            registry,
            quorum,
            votes,
            proxies,
            attestations,
        }
    }

    /// Snapshot every collection. Holds the registry lock while reading so
    /// an emergency replacement is seen either wholly or not at all; ballots
    /// and proxy writes may interleave between collections.
    pub fn export(&self, session: &Session) -> Result<AuditReport, GovernanceError> {
        let now = self.ctx.now();
        require(session, Role::ANY, "export audit reports", now)?;
        let _registry_guard = self.registry.lock();

        let (archived, active): (Vec<Vote>, Vec<Vote>) =
            self.votes.all()?.into_iter().partition(Vote::is_archived);
        let entry = |vote: Vote| VoteEntry {
            tally: vote.tally(),
            vote,
        };
        let report = AuditReport {
            generated_at: now,
            generated_by: session.address.to_string(),
            trustees: self.registry.list_all()?,
            quorum: self.quorum.snapshots()?,
            active_votes: active.into_iter().map(entry).collect(),
            archived_votes: archived.into_iter().map(entry).collect(),
            proxies: self
                .proxies
                .all()?
                .into_iter()
                .map(|proxy| ProxyEntry {
                    effective: proxy.is_effective(now),
                    proxy,
                })
                .collect(),
            attestations: self.attestations.all()?,
        };
        tracing::debug!(by = %session.address, "audit report exported");
        Ok(report)
    }
}
