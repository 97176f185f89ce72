//! Scoped, time-bounded delegation from one address to another.
//!
//! Expiry is never swept: an expired proxy stays ACTIVE in storage and every
//! consumer checks `expires_at` at the point of use via
//! [`ProxyDelegationStore::check_scope`].

use std::fmt;

use custos_store::{Collection, WriteSet};
use custos_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::authz::{require, Role, Session};
use crate::context::GovernanceContext;
use crate::locks::EntityLocks;
use crate::GovernanceError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProxyScope {
    VoteView,
    DocView,
    VoteCast,
    DocSign,
}

impl ProxyScope {
    /// Read-only scopes granted when none are requested.
    pub const DEFAULT: [ProxyScope; 2] = [ProxyScope::VoteView, ProxyScope::DocView];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VoteView => "VOTE_VIEW",
            Self::DocView => "DOC_VIEW",
            Self::VoteCast => "VOTE_CAST",
            Self::DocSign => "DOC_SIGN",
        }
    }
}

impl fmt::Display for ProxyScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProxyStatus {
    Active,
    Revoked,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proxy {
    pub id: String,
    pub grantor: WalletAddress,
    pub delegate: WalletAddress,
    pub scope: Vec<ProxyScope>,
    pub status: ProxyStatus,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
}

impl Proxy {
    /// ACTIVE and not yet past `expires_at`.
    pub fn is_effective(&self, now: Timestamp) -> bool {
        self.status == ProxyStatus::Active && now < self.expires_at
    }

    pub fn covers(&self, scope: ProxyScope) -> bool {
        self.scope.contains(&scope)
    }
}

/// Input to [`ProxyDelegationStore::create_proxy`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProxy {
    pub delegate: WalletAddress,
    #[serde(default)]
    pub scope: Option<Vec<ProxyScope>>,
    #[serde(default)]
    pub expires_at: Option<Timestamp>,
}

pub struct ProxyDelegationStore {
    ctx: GovernanceContext,
    locks: EntityLocks,
    default_ttl_secs: u64,
}

impl ProxyDelegationStore {
    pub fn new(ctx: GovernanceContext, default_ttl_secs: u64) -> Self {
        Self {
            ctx,
            locks: EntityLocks::default(),
            default_ttl_secs,
        }
    }

    /// Grant a proxy from the caller to `request.delegate`.
    pub fn create_proxy(&self, session: &Session, request: NewProxy) -> Result<Proxy, GovernanceError> {
        let now = self.ctx.now();
        require(session, Role::SIGNERS, "manage proxies", now)?;
        if request.delegate == session.address {
            return Err(GovernanceError::Validation("cannot delegate to yourself".into()));
        }
        let mut scope = request.scope.unwrap_or_else(|| ProxyScope::DEFAULT.to_vec());
        scope.sort();
        scope.dedup();
        if scope.is_empty() {
            return Err(GovernanceError::Validation("proxy scope is empty".into()));
        }
        let expires_at = request
            .expires_at
            .unwrap_or_else(|| now.plus_secs(self.default_ttl_secs));
        if expires_at <= now {
            return Err(GovernanceError::Validation(format!(
                "expiresAt {expires_at} is not in the future"
            )));
        }

        let proxy = Proxy {
            id: self.ctx.new_id("proxy")?,
            grantor: session.address.clone(),
            delegate: request.delegate,
            scope,
            status: ProxyStatus::Active,
            created_at: now,
            expires_at,
            revoked_at: None,
        };
        let mut writes = WriteSet::new();
        writes.put_record(Collection::Proxies, &proxy.id, &proxy)?;
        self.ctx.commit(writes)?;
        tracing::info!(
            proxy_id = %proxy.id,
            grantor = %proxy.grantor,
            delegate = %proxy.delegate,
            "proxy granted"
        );
        Ok(proxy)
    }

    /// Revoke a proxy. Only its grantor may do so; revoking twice is a no-op.
    pub fn revoke_proxy(&self, session: &Session, proxy_id: &str) -> Result<Proxy, GovernanceError> {
        let now = self.ctx.now();
        require(session, Role::SIGNERS, "manage proxies", now)?;
        let _guard = self.locks.lock(proxy_id);

        let mut proxy: Proxy = self
            .ctx
            .load(Collection::Proxies, proxy_id)?
            .ok_or_else(|| GovernanceError::not_found("proxy", proxy_id))?;
        if proxy.grantor != session.address {
            tracing::warn!(proxy_id, caller = %session.address, "revoke by non-grantor refused");
            return Err(GovernanceError::Forbidden(format!(
                "only the grantor may revoke proxy {proxy_id}"
            )));
        }
        if proxy.status == ProxyStatus::Revoked {
            tracing::debug!(proxy_id, "proxy already revoked");
            return Ok(proxy);
        }
        proxy.status = ProxyStatus::Revoked;
        proxy.revoked_at = Some(now);

        let mut writes = WriteSet::new();
        writes.put_record(Collection::Proxies, &proxy.id, &proxy)?;
        self.ctx.commit(writes)?;
        tracing::info!(proxy_id, "proxy revoked");
        Ok(proxy)
    }

    /// Proxies the caller has granted.
    pub fn list_proxies(&self, session: &Session) -> Result<Vec<Proxy>, GovernanceError> {
        require(session, Role::SIGNERS, "manage proxies", self.ctx.now())?;
        Ok(self
            .all()?
            .into_iter()
            .filter(|p| p.grantor == session.address)
            .collect())
    }

    /// Proxies granted to the caller.
    pub fn proxies_granted_to(&self, session: &Session) -> Result<Vec<Proxy>, GovernanceError> {
        require(session, Role::ANY, "view proxies", self.ctx.now())?;
        Ok(self
            .all()?
            .into_iter()
            .filter(|p| p.delegate == session.address)
            .collect())
    }

    /// Whether `delegate` may currently act for `grantor` within `scope`.
    ///
    /// Returns the effective proxy, `EXPIRED` when the only matching grants
    /// have lapsed, or `FORBIDDEN` when none exists.
    pub fn check_scope(
        &self,
        grantor: &WalletAddress,
        delegate: &WalletAddress,
        scope: ProxyScope,
    ) -> Result<Proxy, GovernanceError> {
        let now = self.ctx.now();
        let candidates: Vec<Proxy> = self
            .all()?
            .into_iter()
            .filter(|p| {
                &p.grantor == grantor
                    && &p.delegate == delegate
                    && p.status == ProxyStatus::Active
                    && p.covers(scope)
            })
            .collect();
        if candidates.is_empty() {
            return Err(GovernanceError::Forbidden(format!(
                "{delegate} holds no {scope} proxy from {grantor}"
            )));
        }
        candidates
            .into_iter()
            .find(|p| p.is_effective(now))
            .ok_or_else(|| GovernanceError::Expired(format!("{scope} proxy from {grantor}")))
    }

    pub(crate) fn all(&self) -> Result<Vec<Proxy>, GovernanceError> {
        let mut proxies: Vec<Proxy> = self.ctx.load_all(Collection::Proxies)?;
        proxies.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(proxies)
    }
}
