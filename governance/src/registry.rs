//! The authoritative trustee list.
//!
//! Trustees are never deleted. Retirement flips `status` and stamps
//! `retired_at`/`reason`, so historical ballots always resolve to a record.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use custos_store::{Collection, WriteSet};
use custos_types::{Timestamp, WalletAddress};
use serde::{Deserialize, Serialize};

use crate::authz::Role;
use crate::context::GovernanceContext;
use crate::locks::acquire;
use crate::GovernanceError;

/// Reason recorded on both sides of an emergency replacement.
pub const EMERGENCY_REPLACEMENT_REASON: &str = "EMERGENCY_REPLACEMENT_APPROVED";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrusteeStatus {
    Active,
    Retired,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trustee {
    pub id: String,
    pub address: WalletAddress,
    pub role: Role,
    pub status: TrusteeStatus,
    pub created_at: Timestamp,
    pub retired_at: Option<Timestamp>,
    pub reason: Option<String>,
}

impl Trustee {
    pub fn is_active(&self) -> bool {
        self.status == TrusteeStatus::Active
    }

    /// Whether this record counts toward quorum denominators.
    pub fn is_voting_member(&self) -> bool {
        self.is_active() && self.role == Role::Trustee
    }
}

/// Initial membership supplied by configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrusteeSeed {
    pub id: String,
    pub address: WalletAddress,
    pub role: Role,
}

pub struct TrusteeRegistry {
    ctx: GovernanceContext,
    /// Serializes registry writers (bootstrap, emergency replacement).
    write_lock: Mutex<()>,
}

impl TrusteeRegistry {
    pub fn new(ctx: GovernanceContext) -> Self {
        Self {
            ctx,
            write_lock: Mutex::new(()),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, ()> {
        acquire(&self.write_lock)
    }

    pub fn get(&self, id: &str) -> Result<Option<Trustee>, GovernanceError> {
        self.ctx.load(Collection::Trustees, id)
    }

    /// Every trustee, oldest first.
    pub fn list_all(&self) -> Result<Vec<Trustee>, GovernanceError> {
        let mut all: Vec<Trustee> = self.ctx.load_all(Collection::Trustees)?;
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    /// ACTIVE trustees with role TRUSTEE, at most one per address.
    pub fn list_active(&self) -> Result<Vec<Trustee>, GovernanceError> {
        let mut seen = HashSet::new();
        Ok(self
            .list_all()?
            .into_iter()
            .filter(Trustee::is_voting_member)
            .filter(|t| seen.insert(t.address.clone()))
            .collect())
    }

    /// The quorum denominator.
    pub fn active_count(&self) -> Result<usize, GovernanceError> {
        Ok(self.list_active()?.len())
    }

    /// The record for `address`, preferring an ACTIVE one over retired history.
    pub fn find_by_address(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<Trustee>, GovernanceError> {
        let mut matches: Vec<Trustee> = self
            .list_all()?
            .into_iter()
            .filter(|t| &t.address == address)
            .collect();
        match matches.iter().position(Trustee::is_active) {
            Some(i) => Ok(Some(matches.swap_remove(i))),
            None => Ok(matches.pop()),
        }
    }

    /// The ACTIVE record for `address`, of any role.
    pub fn find_active(
        &self,
        address: &WalletAddress,
    ) -> Result<Option<Trustee>, GovernanceError> {
        Ok(self.find_by_address(address)?.filter(Trustee::is_active))
    }

    /// Seed an empty registry. Returns how many trustees were inserted; a
    /// registry that already holds records is left untouched.
    pub fn bootstrap(&self, seeds: &[TrusteeSeed]) -> Result<usize, GovernanceError> {
        let _guard = self.lock();
        if !self.list_all()?.is_empty() {
            tracing::debug!("registry already populated, skipping bootstrap");
            return Ok(0);
        }

        let mut ids = HashSet::new();
        let mut addresses = HashSet::new();
        for seed in seeds {
            if seed.id.trim().is_empty() {
                return Err(GovernanceError::Validation("trustee id is empty".into()));
            }
            if !ids.insert(seed.id.as_str()) {
                return Err(GovernanceError::DuplicateId(seed.id.clone()));
            }
            if !addresses.insert(&seed.address) {
                return Err(GovernanceError::AlreadyActive(seed.address.to_string()));
            }
        }

        let now = self.ctx.now();
        let mut writes = WriteSet::new();
        for seed in seeds {
            let trustee = Trustee {
                id: seed.id.clone(),
                address: seed.address.clone(),
                role: seed.role,
                status: TrusteeStatus::Active,
                created_at: now,
                retired_at: None,
                reason: None,
            };
            writes.put_record(Collection::Trustees, &trustee.id, &trustee)?;
        }
        self.ctx.commit(writes)?;
        tracing::info!(count = seeds.len(), "trustee registry bootstrapped");
        Ok(seeds.len())
    }
}
