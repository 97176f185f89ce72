//! Tunable governance parameters.

use serde::{Deserialize, Serialize};

use crate::quorum::QuorumPolicies;

/// Default voting window: 24 hours.
pub const DEFAULT_VOTE_WINDOW_SECS: u64 = 24 * 60 * 60;

/// Default proxy lifetime: 30 days.
pub const DEFAULT_PROXY_TTL_SECS: u64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceParams {
    /// Applied when `create_vote` is called without `closes_at`.
    pub default_vote_window_secs: u64,
    /// Applied when `create_proxy` is called without `expires_at`.
    pub default_proxy_ttl_secs: u64,
    pub policies: QuorumPolicies,
}

impl Default for GovernanceParams {
    fn default() -> Self {
        Self {
            default_vote_window_secs: DEFAULT_VOTE_WINDOW_SECS,
            default_proxy_ttl_secs: DEFAULT_PROXY_TTL_SECS,
            policies: QuorumPolicies::default(),
        }
    }
}
