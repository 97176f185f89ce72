use custos_store::StoreError;
use thiserror::Error;

/// Broad category of a [`GovernanceError`], used by transports to pick a
/// response class. Everything except `Internal` is caller-recoverable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Auth,
    State,
    Authorization,
    Validation,
    Internal,
}

#[derive(Debug, Error)]
pub enum GovernanceError {
    // ── Auth ────────────────────────────────────────────────────────────
    #[error("address {0} is not an active trustee")]
    NotAuthorized(String),

    #[error("no valid pending nonce for {0}")]
    NonceInvalid(String),

    #[error("signature does not recover to the claimed address")]
    AuthenticationFailed,

    #[error("address {claimed} does not match session address {session}")]
    AddressMismatch { claimed: String, session: String },

    #[error("signature verification failed: {0}")]
    BadSignature(String),

    #[error("signed message is not bound to {0}")]
    InvalidMessage(String),

    #[error("session token is invalid")]
    SessionInvalid,

    #[error("session has expired")]
    SessionExpired,

    // ── State ───────────────────────────────────────────────────────────
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("cannot {action} {id} in status {status}")]
    InvalidState {
        id: String,
        status: String,
        action: &'static str,
    },

    #[error("{0} is past its deadline")]
    Expired(String),

    #[error("vote {id} has type {kind}, expected {expected}")]
    WrongVoteType {
        id: String,
        kind: String,
        expected: String,
    },

    #[error("vote {id} is {status}, not APPROVED")]
    NotApproved { id: String, status: String },

    #[error("no active trustees: quorum for {0} cannot be met")]
    Ungovernable(String),

    // ── Authorization ───────────────────────────────────────────────────
    #[error("forbidden: {0}")]
    Forbidden(String),

    // ── Validation ──────────────────────────────────────────────────────
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("address {0} already belongs to an active trustee")]
    AlreadyActive(String),

    #[error("trustee id {0} is already registered")]
    DuplicateId(String),

    // ── Internal (fatal to the operation, nothing committed) ────────────
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GovernanceError {
    /// Stable wire code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotAuthorized(_) => "NOT_AUTHORIZED",
            Self::NonceInvalid(_) => "NONCE_INVALID",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::AddressMismatch { .. } => "ADDRESS_MISMATCH",
            Self::BadSignature(_) => "BAD_SIGNATURE",
            Self::InvalidMessage(_) => "INVALID_MESSAGE",
            Self::SessionInvalid => "SESSION_INVALID",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidState { .. } => "INVALID_STATE",
            Self::Expired(_) => "EXPIRED",
            Self::WrongVoteType { .. } => "WRONG_VOTE_TYPE",
            Self::NotApproved { .. } => "NOT_APPROVED",
            Self::Ungovernable(_) => "UNGOVERNABLE",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Validation(_) => "VALIDATION",
            Self::AlreadyActive(_) => "ALREADY_ACTIVE",
            Self::DuplicateId(_) => "DUPLICATE_ID",
            Self::Storage(_) => "STORAGE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotAuthorized(_)
            | Self::NonceInvalid(_)
            | Self::AuthenticationFailed
            | Self::AddressMismatch { .. }
            | Self::BadSignature(_)
            | Self::InvalidMessage(_)
            | Self::SessionInvalid
            | Self::SessionExpired => ErrorClass::Auth,
            Self::NotFound { .. }
            | Self::InvalidState { .. }
            | Self::Expired(_)
            | Self::WrongVoteType { .. }
            | Self::NotApproved { .. }
            | Self::Ungovernable(_) => ErrorClass::State,
            Self::Forbidden(_) => ErrorClass::Authorization,
            Self::Validation(_) | Self::AlreadyActive(_) | Self::DuplicateId(_) => {
                ErrorClass::Validation
            }
            Self::Storage(_) | Self::Internal(_) => ErrorClass::Internal,
        }
    }

    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_classes_line_up() {
        let cases = [
            (GovernanceError::NonceInvalid("a".into()), "NONCE_INVALID", ErrorClass::Auth),
            (GovernanceError::not_found("vote", "v1"), "NOT_FOUND", ErrorClass::State),
            (GovernanceError::Expired("vote v1".into()), "EXPIRED", ErrorClass::State),
            (GovernanceError::Forbidden("x".into()), "FORBIDDEN", ErrorClass::Authorization),
            (GovernanceError::Validation("x".into()), "VALIDATION", ErrorClass::Validation),
            (
                GovernanceError::Storage(StoreError::Backend("disk".into())),
                "STORAGE",
                ErrorClass::Internal,
            ),
        ];
        for (err, code, class) in cases {
            assert_eq!(err.code(), code);
            assert_eq!(err.class(), class);
        }
    }

    #[test]
    fn not_found_message_names_the_entity() {
        let err = GovernanceError::not_found("attestation", "att_1");
        assert_eq!(err.to_string(), "attestation att_1 not found");
    }
}
