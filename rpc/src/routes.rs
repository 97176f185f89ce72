//! Route table and handlers.
//!
//! Handlers are thin: parse, authenticate, hand off to the governance engine
//! on the blocking pool, serialize.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use custos_auth::{Challenge, IssuedSession};
use custos_governance::{
    Attestation, AuditReport, Choice, NewProxy, NewVote, Proxy, ReplacementOutcome,
    ReplacementRequest, Session, SignedMessage, Trustee, Vote,
};
use custos_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::error::RpcError;
use crate::state::{blocking, Caller, RpcState};

pub fn router(state: RpcState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/nonce", post(request_nonce))
        .route("/auth/verify", post(verify_login))
        .route("/auth/session", get(current_session))
        .route("/trustees", get(list_trustees))
        .route("/votes", get(list_active_votes).post(create_vote))
        .route("/votes/history", get(list_vote_history))
        .route("/votes/:id", get(get_vote))
        .route("/votes/:id/ballots", post(cast_ballot))
        .route("/votes/:id/execute", post(execute_vote))
        .route("/votes/:id/archive", post(archive_vote))
        .route("/proxies", get(list_proxies).post(create_proxy))
        .route("/proxies/granted", get(proxies_granted_to))
        .route("/proxies/:id/revoke", post(revoke_proxy))
        .route("/attestations", get(list_attestations).post(create_attestation))
        .route("/attestations/:id", get(get_attestation))
        .route("/attestations/:id/sign", post(sign_attestation))
        .route("/emergency/propose", post(propose_replacement))
        .route("/emergency/replace", post(execute_replacement))
        .route("/audit", get(audit_json))
        .route("/audit/report", get(audit_text))
        .with_state(state)
}

// ── Requests ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NonceRequest {
    pub address: WalletAddress,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub address: WalletAddress,
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct BallotRequest {
    pub address: WalletAddress,
    pub choice: Choice,
    pub message: String,
    pub signature: String,
}

#[derive(Debug, Deserialize)]
pub struct AttestationRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeReplacementRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub closes_at: Option<Timestamp>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

fn extract_json<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, RpcError> {
    body.map(|Json(v)| v).map_err(RpcError::from)
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

async fn request_nonce(
    State(state): State<RpcState>,
    body: Result<Json<NonceRequest>, JsonRejection>,
) -> Result<Json<Challenge>, RpcError> {
    let req = extract_json(body)?;
    let challenge = blocking(move || state.challenges.issue_challenge(&req.address)).await?;
    Ok(Json(challenge))
}

async fn verify_login(
    State(state): State<RpcState>,
    body: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<IssuedSession>, RpcError> {
    let req = extract_json(body)?;
    let issued = blocking(move || {
        state
            .challenges
            .verify_response(&req.address, &req.message, &req.signature)
    })
    .await?;
    Ok(Json(issued))
}

async fn current_session(Caller(session): Caller) -> Json<Session> {
    Json(session)
}

async fn list_trustees(
    State(state): State<RpcState>,
    Caller(session): Caller,
) -> Result<Json<Vec<Trustee>>, RpcError> {
    let trustees = blocking(move || state.engine.list_trustees(&session)).await?;
    Ok(Json(trustees))
}

async fn create_vote(
    State(state): State<RpcState>,
    Caller(session): Caller,
    body: Result<Json<NewVote>, JsonRejection>,
) -> Result<(StatusCode, Json<Vote>), RpcError> {
    let req = extract_json(body)?;
    let vote = blocking(move || state.engine.votes().create_vote(&session, req)).await?;
    Ok((StatusCode::CREATED, Json(vote)))
}

async fn list_active_votes(
    State(state): State<RpcState>,
    Caller(session): Caller,
) -> Result<Json<Vec<Vote>>, RpcError> {
    let votes = blocking(move || state.engine.votes().list_active_votes(&session)).await?;
    Ok(Json(votes))
}

async fn list_vote_history(
    State(state): State<RpcState>,
    Caller(session): Caller,
) -> Result<Json<Vec<Vote>>, RpcError> {
    let votes = blocking(move || state.engine.votes().list_vote_history(&session)).await?;
    Ok(Json(votes))
}

async fn get_vote(
    State(state): State<RpcState>,
    Caller(session): Caller,
    Path(id): Path<String>,
) -> Result<Json<Vote>, RpcError> {
    let vote = blocking(move || state.engine.votes().get_vote(&session, &id)).await?;
    Ok(Json(vote))
}

async fn cast_ballot(
    State(state): State<RpcState>,
    Caller(session): Caller,
    Path(id): Path<String>,
    body: Result<Json<BallotRequest>, JsonRejection>,
) -> Result<Json<Vote>, RpcError> {
    let req = extract_json(body)?;
    let signed = SignedMessage {
        address: req.address,
        message: req.message,
        signature: req.signature,
    };
    let vote = blocking(move || {
        state
            .engine
            .votes()
            .cast_ballot(&session, &id, req.choice, signed)
    })
    .await?;
    Ok(Json(vote))
}

async fn execute_vote(
    State(state): State<RpcState>,
    Caller(session): Caller,
    Path(id): Path<String>,
) -> Result<Json<Vote>, RpcError> {
    let vote = blocking(move || state.engine.votes().execute_vote(&session, &id)).await?;
    Ok(Json(vote))
}

async fn archive_vote(
    State(state): State<RpcState>,
    Caller(session): Caller,
    Path(id): Path<String>,
) -> Result<Json<Vote>, RpcError> {
    let vote = blocking(move || state.engine.votes().archive_vote(&session, &id)).await?;
    Ok(Json(vote))
}

async fn create_proxy(
    State(state): State<RpcState>,
    Caller(session): Caller,
    body: Result<Json<NewProxy>, JsonRejection>,
) -> Result<(StatusCode, Json<Proxy>), RpcError> {
    let req = extract_json(body)?;
    let proxy = blocking(move || state.engine.proxies().create_proxy(&session, req)).await?;
    Ok((StatusCode::CREATED, Json(proxy)))
}

async fn list_proxies(
    State(state): State<RpcState>,
    Caller(session): Caller,
) -> Result<Json<Vec<Proxy>>, RpcError> {
    let proxies = blocking(move || state.engine.proxies().list_proxies(&session)).await?;
    Ok(Json(proxies))
}

async fn proxies_granted_to(
    State(state): State<RpcState>,
    Caller(session): Caller,
) -> Result<Json<Vec<Proxy>>, RpcError> {
    let proxies = blocking(move || state.engine.proxies().proxies_granted_to(&session)).await?;
    Ok(Json(proxies))
}

async fn revoke_proxy(
    State(state): State<RpcState>,
    Caller(session): Caller,
    Path(id): Path<String>,
) -> Result<Json<Proxy>, RpcError> {
    let proxy = blocking(move || state.engine.proxies().revoke_proxy(&session, &id)).await?;
    Ok(Json(proxy))
}

async fn create_attestation(
    State(state): State<RpcState>,
    Caller(session): Caller,
    body: Result<Json<AttestationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Attestation>), RpcError> {
    let req = extract_json(body)?;
    let attestation = blocking(move || {
        state
            .engine
            .attestations()
            .create_attestation(&session, &req.title, &req.body)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(attestation)))
}

async fn list_attestations(
    State(state): State<RpcState>,
    Caller(session): Caller,
) -> Result<Json<Vec<Attestation>>, RpcError> {
    let list = blocking(move || state.engine.attestations().list_attestations(&session)).await?;
    Ok(Json(list))
}

async fn get_attestation(
    State(state): State<RpcState>,
    Caller(session): Caller,
    Path(id): Path<String>,
) -> Result<Json<Attestation>, RpcError> {
    let attestation =
        blocking(move || state.engine.attestations().get_attestation(&session, &id)).await?;
    Ok(Json(attestation))
}

async fn sign_attestation(
    State(state): State<RpcState>,
    Caller(session): Caller,
    Path(id): Path<String>,
    body: Result<Json<SignedMessage>, JsonRejection>,
) -> Result<Json<Attestation>, RpcError> {
    let signed = extract_json(body)?;
    let attestation = blocking(move || {
        state
            .engine
            .attestations()
            .sign_attestation(&session, &id, signed)
    })
    .await?;
    Ok(Json(attestation))
}

async fn propose_replacement(
    State(state): State<RpcState>,
    Caller(session): Caller,
    body: Result<Json<ProposeReplacementRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Vote>), RpcError> {
    let req = extract_json(body)?;
    let vote = blocking(move || {
        state
            .engine
            .emergency()
            .propose_replacement(&session, &req.title, &req.body, req.closes_at)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(vote)))
}

async fn execute_replacement(
    State(state): State<RpcState>,
    Caller(session): Caller,
    body: Result<Json<ReplacementRequest>, JsonRejection>,
) -> Result<Json<ReplacementOutcome>, RpcError> {
    let req = extract_json(body)?;
    let outcome =
        blocking(move || state.engine.emergency().execute_replacement(&session, req)).await?;
    Ok(Json(outcome))
}

async fn audit_json(
    State(state): State<RpcState>,
    Caller(session): Caller,
) -> Result<Json<AuditReport>, RpcError> {
    let report = blocking(move || state.engine.audit().export(&session)).await?;
    Ok(Json(report))
}

async fn audit_text(
    State(state): State<RpcState>,
    Caller(session): Caller,
) -> Result<impl IntoResponse, RpcError> {
    let report = blocking(move || state.engine.audit().export(&session)).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        report.render_text(),
    ))
}
