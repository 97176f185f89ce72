//! Single-use login challenges.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use custos_crypto::random_hex;
use custos_governance::binding::{contains_tag, nonce_tag};
use custos_governance::{GovernanceContext, GovernanceError, TrusteeRegistry};
use custos_types::{Timestamp, WalletAddress};
use serde::Serialize;

use crate::session::{IssuedSession, SessionIssuer};

/// Five minutes.
pub const DEFAULT_NONCE_TTL_SECS: u64 = 5 * 60;

/// What the wallet is asked to sign.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    pub nonce: String,
    pub statement: String,
    pub expires_at: Timestamp,
}

struct PendingNonce {
    value: String,
    created_at: Timestamp,
}

pub struct ChallengeIssuer {
    ctx: GovernanceContext,
    registry: Arc<TrusteeRegistry>,
    sessions: Arc<SessionIssuer>,
    /// At most one outstanding nonce per address.
    pending: Mutex<HashMap<WalletAddress, PendingNonce>>,
    nonce_ttl_secs: u64,
}

pub fn statement(address: &WalletAddress, nonce: &str) -> String {
    format!("Sign in to Custos trustee governance.\nAddress: {address}\n{}", nonce_tag(nonce))
}

impl ChallengeIssuer {
    pub fn new(
        ctx: GovernanceContext,
        registry: Arc<TrusteeRegistry>,
        sessions: Arc<SessionIssuer>,
        nonce_ttl_secs: u64,
    ) -> Self {
        Self {
            ctx,
            registry,
            sessions,
            pending: Mutex::new(HashMap::new()),
            nonce_ttl_secs,
        }
    }

    /// Issue a fresh nonce for an active trustee, replacing any earlier one.
    pub fn issue_challenge(&self, address: &WalletAddress) -> Result<Challenge, GovernanceError> {
        if self.registry.find_active(address)?.is_none() {
            tracing::warn!(%address, "challenge requested by non-trustee");
            return Err(GovernanceError::NotAuthorized(address.to_string()));
        }
        let nonce = random_hex::<16>().map_err(|e| GovernanceError::Internal(e.to_string()))?;
        let now = self.ctx.now();
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                address.clone(),
                PendingNonce {
                    value: nonce.clone(),
                    created_at: now,
                },
            );
        tracing::debug!(%address, "challenge issued");
        Ok(Challenge {
            statement: statement(address, &nonce),
            nonce,
            expires_at: now.plus_secs(self.nonce_ttl_secs),
        })
    }

    /// Verify a signed challenge and open a session.
    ///
    /// The pending nonce is removed in the same critical section that checks
    /// it, so of two concurrent responses at most one succeeds.
    pub fn verify_response(
        &self,
        address: &WalletAddress,
        message: &str,
        signature: &str,
    ) -> Result<IssuedSession, GovernanceError> {
        let recovered = self.ctx.verifier().recover(message, signature).map_err(|e| {
            tracing::warn!(%address, error = %e, "login signature rejected");
            GovernanceError::AuthenticationFailed
        })?;
        if &recovered != address {
            tracing::warn!(%address, %recovered, "login signed by a different wallet");
            return Err(GovernanceError::AuthenticationFailed);
        }

        self.consume_nonce(address, message)?;

        let trustee = self
            .registry
            .find_active(address)?
            .ok_or_else(|| GovernanceError::NotAuthorized(address.to_string()))?;
        self.sessions.issue(&trustee)
    }

    fn consume_nonce(&self, address: &WalletAddress, message: &str) -> Result<(), GovernanceError> {
        let now = self.ctx.now();
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = pending.get(address) else {
            return Err(GovernanceError::NonceInvalid(address.to_string()));
        };
        if entry.created_at.has_expired(self.nonce_ttl_secs, now) {
            pending.remove(address);
            return Err(GovernanceError::NonceInvalid(address.to_string()));
        }
        if !contains_tag(message, &nonce_tag(&entry.value)) {
            return Err(GovernanceError::NonceInvalid(address.to_string()));
        }
        pending.remove(address);
        Ok(())
    }

    /// Number of outstanding challenges.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
