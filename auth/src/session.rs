//! HMAC-signed bearer tokens.
//!
//! A token is `hex(payload) "." hex(tag)` where `payload` is the JSON
//! session claims and `tag` is HMAC-SHA256 over the payload bytes under a
//! node-local secret. Tokens carry no server-side state; a node restarted
//! with a fresh random secret invalidates every outstanding token.

use std::sync::Arc;

use custos_crypto::{hmac_sha256, random_bytes, verify_hmac_sha256};
use custos_governance::{GovernanceContext, GovernanceError, Session, Trustee, TrusteeRegistry};
use serde::Serialize;
use zeroize::Zeroizing;

/// Eight hours.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 8 * 60 * 60;

/// A session plus the bearer token that proves it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedSession {
    pub token: String,
    pub session: Session,
}

pub struct SessionIssuer {
    ctx: GovernanceContext,
    registry: Arc<TrusteeRegistry>,
    secret: Zeroizing<Vec<u8>>,
    ttl_secs: u64,
}

impl SessionIssuer {
    pub fn new(
        ctx: GovernanceContext,
        registry: Arc<TrusteeRegistry>,
        secret: Vec<u8>,
        ttl_secs: u64,
    ) -> Self {
        Self {
            ctx,
            registry,
            secret: Zeroizing::new(secret),
            ttl_secs,
        }
    }

    /// An issuer keyed by a fresh random secret.
    pub fn with_random_secret(
        ctx: GovernanceContext,
        registry: Arc<TrusteeRegistry>,
        ttl_secs: u64,
    ) -> Result<Self, GovernanceError> {
        let secret = random_bytes::<32>().map_err(|e| GovernanceError::Internal(e.to_string()))?;
        Ok(Self::new(ctx, registry, secret.to_vec(), ttl_secs))
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Issue a session for `trustee` expiring `ttl_secs` from now.
    pub fn issue(&self, trustee: &Trustee) -> Result<IssuedSession, GovernanceError> {
        let session = Session {
            address: trustee.address.clone(),
            role: trustee.role,
            trustee_id: trustee.id.clone(),
            expires_at: self.ctx.now().plus_secs(self.ttl_secs),
        };
        let payload =
            serde_json::to_vec(&session).map_err(|e| GovernanceError::Internal(e.to_string()))?;
        let tag = hmac_sha256(&self.secret, &payload);
        let token = format!("{}.{}", hex::encode(&payload), hex::encode(tag));
        tracing::info!(
            address = %session.address,
            role = %session.role,
            expires_at = session.expires_at.as_secs(),
            "session issued"
        );
        Ok(IssuedSession { token, session })
    }

    /// Resolve a bearer token to its session.
    ///
    /// Fails `SESSION_INVALID` for a malformed or forged token,
    /// `SESSION_EXPIRED` past its expiry, and `NOT_AUTHORIZED` once the
    /// trustee behind it is no longer active.
    pub fn authenticate(&self, token: &str) -> Result<Session, GovernanceError> {
        let (payload_hex, tag_hex) = token
            .trim()
            .split_once('.')
            .ok_or(GovernanceError::SessionInvalid)?;
        let payload = hex::decode(payload_hex).map_err(|_| GovernanceError::SessionInvalid)?;
        let tag = hex::decode(tag_hex).map_err(|_| GovernanceError::SessionInvalid)?;
        if !verify_hmac_sha256(&self.secret, &payload, &tag) {
            tracing::warn!("session token with bad tag");
            return Err(GovernanceError::SessionInvalid);
        }
        let session: Session =
            serde_json::from_slice(&payload).map_err(|_| GovernanceError::SessionInvalid)?;
        if session.is_expired(self.ctx.now()) {
            return Err(GovernanceError::SessionExpired);
        }

        match self.registry.find_active(&session.address)? {
            Some(t) if t.id == session.trustee_id && t.role == session.role => Ok(session),
            _ => {
                tracing::warn!(address = %session.address, "session holder is no longer an active trustee");
                Err(GovernanceError::NotAuthorized(session.address.to_string()))
            }
        }
    }
}
