//! Authentication for Custos trustees.
//!
//! Login is a challenge/response over a wallet signature:
//!
//! 1. [`ChallengeIssuer::issue_challenge`] hands an active trustee a random
//!    nonce and a statement to sign.
//! 2. [`ChallengeIssuer::verify_response`] recovers the signer, consumes the
//!    nonce exactly once and asks the [`SessionIssuer`] for a bearer token.
//! 3. [`SessionIssuer::authenticate`] turns that token back into a
//!    [`custos_governance::Session`] on every request.
//!
//! Failures are reported as [`custos_governance::GovernanceError`] auth
//! codes so transports map them in one place.

pub mod challenge;
pub mod session;

pub use challenge::{statement, Challenge, ChallengeIssuer, DEFAULT_NONCE_TTL_SECS};
pub use session::{IssuedSession, SessionIssuer, DEFAULT_SESSION_TTL_SECS};
