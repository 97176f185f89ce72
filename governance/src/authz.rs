//! Roles, sessions and the single capability check every entry point uses.

use custos_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::GovernanceError;

/// The closed set of principal roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Ballots, signs attestations, manages own proxies.
    Trustee,
    /// Everything a trustee can do, plus creating and executing votes and
    /// executing emergency replacements.
    TrustAdmin,
    /// Read-only access (lists, archive, audit export).
    CounselReadonly,
}

impl Role {
    /// Roles allowed to ballot, sign and delegate.
    pub const SIGNERS: &'static [Role] = &[Role::Trustee, Role::TrustAdmin];
    /// Roles allowed to create and execute decisions.
    pub const ADMINS: &'static [Role] = &[Role::TrustAdmin];
    /// Every authenticated role.
    pub const ANY: &'static [Role] = &[Role::Trustee, Role::TrustAdmin, Role::CounselReadonly];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trustee => "TRUSTEE",
            Self::TrustAdmin => "TRUST_ADMIN",
            Self::CounselReadonly => "COUNSEL_READONLY",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = GovernanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRUSTEE" => Ok(Self::Trustee),
            "TRUST_ADMIN" => Ok(Self::TrustAdmin),
            "COUNSEL_READONLY" => Ok(Self::CounselReadonly),
            other => Err(GovernanceError::Validation(format!("unknown role {other}"))),
        }
    }
}

/// An authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub address: WalletAddress,
    pub role: Role,
    pub trustee_id: String,
    pub expires_at: Timestamp,
}

impl Session {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}

/// Whether `session` holds one of `required_roles`.
pub fn authorize(session: &Session, required_roles: &[Role]) -> bool {
    required_roles.contains(&session.role)
}

/// Entry-point guard: the session must be live and carry a permitted role.
pub(crate) fn require(
    session: &Session,
    required_roles: &[Role],
    action: &str,
    now: Timestamp,
) -> Result<(), GovernanceError> {
    if session.is_expired(now) {
        return Err(GovernanceError::SessionExpired);
    }
    if !authorize(session, required_roles) {
        tracing::warn!(
            address = %session.address,
            role = %session.role,
            action,
            "role check failed"
        );
        return Err(GovernanceError::Forbidden(format!(
            "role {} may not {}",
            session.role, action
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(role: Role) -> Session {
        Session {
            address: WalletAddress::new("cst_alice"),
            role,
            trustee_id: "t1".into(),
            expires_at: Timestamp::new(1_000),
        }
    }

    #[test]
    fn authorize_checks_membership() {
        assert!(authorize(&session(Role::TrustAdmin), Role::ADMINS));
        assert!(!authorize(&session(Role::Trustee), Role::ADMINS));
        assert!(authorize(&session(Role::Trustee), Role::SIGNERS));
        assert!(!authorize(&session(Role::CounselReadonly), Role::SIGNERS));
        assert!(authorize(&session(Role::CounselReadonly), Role::ANY));
    }

    #[test]
    fn require_rejects_expired_sessions() {
        let s = session(Role::TrustAdmin);
        assert!(require(&s, Role::ADMINS, "create votes", Timestamp::new(999)).is_ok());
        assert!(matches!(
            require(&s, Role::ADMINS, "create votes", Timestamp::new(1_000)),
            Err(GovernanceError::SessionExpired)
        ));
    }

    #[test]
    fn require_reports_forbidden() {
        let err = require(&session(Role::CounselReadonly), Role::SIGNERS, "cast ballots", Timestamp::EPOCH)
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[test]
    fn role_parsing_and_wire_names() {
        assert_eq!("trust_admin".parse::<Role>().unwrap(), Role::TrustAdmin);
        assert!("owner".parse::<Role>().is_err());
        assert_eq!(
            serde_json::to_string(&Role::CounselReadonly).unwrap(),
            "\"COUNSEL_READONLY\""
        );
    }
}
