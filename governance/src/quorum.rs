//! Quorum policies and the arithmetic that turns them into signature counts.
//!
//! | policy        | required for `n` active trustees |
//! |---------------|----------------------------------|
//! | MAJORITY      | `floor(n/2) + 1`                 |
//! | SUPERMAJORITY | `ceil(2n/3)`                     |
//! | FIXED_N(k)    | `clamp(k, 1, n)`                 |
//!
//! Unrecognized policy names fall back to MAJORITY. With zero active
//! trustees every policy yields zero, which callers must surface as
//! [`GovernanceError::Ungovernable`] rather than treat as "no signatures
//! needed".

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::registry::TrusteeRegistry;
use crate::GovernanceError;

/// Key under which a quorum policy is configured, e.g. `STANDARD`.
/// Always stored uppercase.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ActionType(String);

impl ActionType {
    pub const STANDARD: &'static str = "STANDARD";
    pub const EMERGENCY_REPLACEMENT: &'static str = "EMERGENCY_REPLACEMENT";
    pub const ATTESTATION: &'static str = "ATTESTATION";

    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_uppercase())
    }

    pub fn standard() -> Self {
        Self::new(Self::STANDARD)
    }

    pub fn emergency_replacement() -> Self {
        Self::new(Self::EMERGENCY_REPLACEMENT)
    }

    pub fn attestation() -> Self {
        Self::new(Self::ATTESTATION)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_emergency_replacement(&self) -> bool {
        self.0 == Self::EMERGENCY_REPLACEMENT
    }
}

impl From<String> for ActionType {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ActionType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<ActionType> for String {
    fn from(a: ActionType) -> Self {
        a.0
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The rule family of a [`QuorumPolicy`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PolicyKind {
    Majority,
    Supermajority,
    FixedN,
    /// A name this build does not know; evaluated as MAJORITY.
    Unrecognized(String),
}

impl From<String> for PolicyKind {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "MAJORITY" => Self::Majority,
            "SUPERMAJORITY" => Self::Supermajority,
            "FIXED_N" => Self::FixedN,
            _ => Self::Unrecognized(s),
        }
    }
}

impl From<PolicyKind> for String {
    fn from(k: PolicyKind) -> Self {
        match k {
            PolicyKind::Majority => "MAJORITY".into(),
            PolicyKind::Supermajority => "SUPERMAJORITY".into(),
            PolicyKind::FixedN => "FIXED_N".into(),
            PolicyKind::Unrecognized(s) => s,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumPolicy {
    #[serde(rename = "type")]
    pub kind: PolicyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
}

impl QuorumPolicy {
    pub fn majority() -> Self {
        Self {
            kind: PolicyKind::Majority,
            n: None,
        }
    }

    pub fn supermajority() -> Self {
        Self {
            kind: PolicyKind::Supermajority,
            n: None,
        }
    }

    pub fn fixed(n: u32) -> Self {
        Self {
            kind: PolicyKind::FixedN,
            n: Some(n),
        }
    }

    /// Signatures required when `active` trustees are seated.
    pub fn required(&self, active: usize) -> usize {
        required_signatures(self, active)
    }
}

/// Required signature count for `policy` over `active` trustees.
pub fn required_signatures(policy: &QuorumPolicy, active: usize) -> usize {
    if active == 0 {
        return 0;
    }
    let majority = active / 2 + 1;
    match (&policy.kind, policy.n) {
        (PolicyKind::Supermajority, _) => (2 * active).div_ceil(3),
        (PolicyKind::FixedN, Some(n)) => (n as usize).clamp(1, active),
        // FIXED_N without a count is as unrecognized as an unknown name.
        (PolicyKind::FixedN, None) | (PolicyKind::Majority, _) | (PolicyKind::Unrecognized(_), _) => {
            majority
        }
    }
}

/// Configured policy per action type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuorumPolicies(BTreeMap<ActionType, QuorumPolicy>);

impl QuorumPolicies {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn insert(&mut self, action: impl Into<ActionType>, policy: QuorumPolicy) {
        self.0.insert(action.into(), policy);
    }

    /// Configured policy for `action`, falling back to STANDARD and then to
    /// MAJORITY.
    pub fn lookup(&self, action: &ActionType) -> QuorumPolicy {
        self.0
            .get(action)
            .or_else(|| self.0.get(&ActionType::standard()))
            .cloned()
            .unwrap_or_else(QuorumPolicy::majority)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ActionType, &QuorumPolicy)> {
        self.0.iter()
    }
}

impl Default for QuorumPolicies {
    fn default() -> Self {
        let mut policies = Self::new();
        policies.insert(ActionType::STANDARD, QuorumPolicy::majority());
        policies.insert(ActionType::EMERGENCY_REPLACEMENT, QuorumPolicy::supermajority());
        policies.insert(ActionType::ATTESTATION, QuorumPolicy::majority());
        policies
    }
}

/// A quorum evaluated against the registry at one instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuorumSnapshot {
    pub action_type: ActionType,
    pub policy: QuorumPolicy,
    pub active_count: usize,
    pub required: usize,
}

pub struct QuorumPolicyEngine {
    registry: Arc<TrusteeRegistry>,
    policies: QuorumPolicies,
}

impl QuorumPolicyEngine {
    pub fn new(registry: Arc<TrusteeRegistry>, policies: QuorumPolicies) -> Self {
        Self { registry, policies }
    }

    /// Effective policy for `action`. EMERGENCY_REPLACEMENT is always
    /// SUPERMAJORITY whatever the configuration says.
    pub fn policy_for(&self, action: &ActionType) -> QuorumPolicy {
        if action.is_emergency_replacement() {
            return QuorumPolicy::supermajority();
        }
        self.policies.lookup(action)
    }

    pub fn evaluate(&self, action: &ActionType) -> Result<QuorumSnapshot, GovernanceError> {
        let policy = self.policy_for(action);
        let active_count = self.registry.active_count()?;
        Ok(QuorumSnapshot {
            action_type: action.clone(),
            required: policy.required(active_count),
            policy,
            active_count,
        })
    }

    /// Required signatures for `action` against the current membership.
    /// Fails `UNGOVERNABLE` when no trustee is active.
    pub fn quorum_required(&self, action: &ActionType) -> Result<usize, GovernanceError> {
        let snapshot = self.evaluate(action)?;
        if snapshot.required == 0 {
            tracing::warn!(action = %action, "quorum evaluated with no active trustees");
            return Err(GovernanceError::Ungovernable(action.to_string()));
        }
        Ok(snapshot.required)
    }

    /// Snapshots for every configured action type, plus the forced
    /// emergency policy.
    pub fn snapshots(&self) -> Result<Vec<QuorumSnapshot>, GovernanceError> {
        let mut actions: Vec<ActionType> = self.policies.iter().map(|(a, _)| a.clone()).collect();
        if !actions.iter().any(ActionType::is_emergency_replacement) {
            actions.push(ActionType::emergency_replacement());
        }
        actions.iter().map(|a| self.evaluate(a)).collect()
    }
}

/// Policy key used to freeze the quorum of a vote of type `vote_type`.
pub fn vote_policy_key(vote_type: &ActionType) -> ActionType {
    if vote_type.is_emergency_replacement() {
        ActionType::emergency_replacement()
    } else {
        ActionType::standard()
    }
}
