//! Shared handler state and bearer-token extraction.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use custos_auth::{ChallengeIssuer, SessionIssuer};
use custos_governance::{GovernanceEngine, GovernanceError, Session};

use crate::error::RpcError;

/// Everything a handler needs. Cheap to clone.
#[derive(Clone)]
pub struct RpcState {
    pub engine: Arc<GovernanceEngine>,
    pub sessions: Arc<SessionIssuer>,
    pub challenges: Arc<ChallengeIssuer>,
}

impl RpcState {
    pub fn new(
        engine: Arc<GovernanceEngine>,
        sessions: Arc<SessionIssuer>,
        challenges: Arc<ChallengeIssuer>,
    ) -> Self {
        Self {
            engine,
            sessions,
            challenges,
        }
    }
}

/// The authenticated caller, taken from `Authorization: Bearer <token>`.
#[derive(Clone, Debug)]
pub struct Caller(pub Session);

#[axum::async_trait]
impl FromRequestParts<RpcState> for Caller {
    type Rejection = RpcError;

    async fn from_request_parts(parts: &mut Parts, state: &RpcState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(RpcError::MissingToken)?;
        let session = state.sessions.authenticate(token)?;
        Ok(Caller(session))
    }
}

/// Run a governance call off the async executor. Signature checks and store
/// commits block.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, RpcError>
where
    F: FnOnce() -> Result<T, GovernanceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| RpcError::Server(e.to_string()))?
        .map_err(RpcError::from)
}
