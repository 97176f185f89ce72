#![allow(dead_code)]

use std::sync::Arc;

use custos_crypto::{blake2b_256, derive_address, keypair_from_seed, sign_wallet_message, Ed25519Verifier};
use custos_governance::{
    Choice, GovernanceContext, GovernanceEngine, GovernanceError, GovernanceParams, NewVote, Role,
    Session, SignedMessage, TrusteeSeed, Vote,
};
use custos_nullables::{NullClock, NullStore};
use custos_types::{KeyPair, Timestamp, WalletAddress};

pub const START: u64 = 1_700_000_000;

pub struct Harness {
    pub engine: GovernanceEngine,
    pub clock: Arc<NullClock>,
    pub store: Arc<NullStore>,
}

pub fn keypair(name: &str) -> KeyPair {
    keypair_from_seed(&blake2b_256(name.as_bytes()))
}

pub fn address(name: &str) -> WalletAddress {
    derive_address(&keypair(name).public)
}

pub fn signed(name: &str, message: &str) -> SignedMessage {
    SignedMessage {
        address: address(name),
        message: message.to_string(),
        signature: sign_wallet_message(message, &keypair(name)),
    }
}

impl Harness {
    /// Voting trustees named `trustees` plus an `admin` with TRUST_ADMIN.
    pub fn new(trustees: &[&str]) -> Self {
        Self::with_params(trustees, GovernanceParams::default())
    }

    pub fn with_params(trustees: &[&str], params: GovernanceParams) -> Self {
        let clock = Arc::new(NullClock::new(START));
        let store = Arc::new(NullStore::new());
        let ctx = GovernanceContext::new(store.clone(), clock.clone(), Arc::new(Ed25519Verifier));
        let engine = GovernanceEngine::new(ctx, params);

        let mut seeds: Vec<TrusteeSeed> = trustees
            .iter()
            .map(|name| TrusteeSeed {
                id: format!("t_{name}"),
                address: address(name),
                role: Role::Trustee,
            })
            .collect();
        seeds.push(TrusteeSeed {
            id: "admin".into(),
            address: address("admin"),
            role: Role::TrustAdmin,
        });
        engine.registry().bootstrap(&seeds).unwrap();
        Self {
            engine,
            clock,
            store,
        }
    }

    pub fn session(&self, name: &str) -> Session {
        let role = if name == "admin" {
            Role::TrustAdmin
        } else {
            Role::Trustee
        };
        self.session_as(name, role)
    }

    pub fn session_as(&self, name: &str, role: Role) -> Session {
        Session {
            address: address(name),
            role,
            trustee_id: format!("t_{name}"),
            expires_at: Timestamp::new(START + 10_000_000),
        }
    }

    pub fn admin(&self) -> Session {
        self.session("admin")
    }

    pub fn create_vote(&self, vote_type: &str) -> Vote {
        self.engine
            .votes()
            .create_vote(
                &self.admin(),
                NewVote {
                    vote_type: vote_type.into(),
                    title: format!("{vote_type} proposal"),
                    body: "details".into(),
                    closes_at: None,
                },
            )
            .unwrap()
    }

    pub fn ballot(&self, name: &str, vote_id: &str, choice: Choice) -> Result<Vote, GovernanceError> {
        let message = format!("I vote {choice:?} on VOTE:{vote_id}");
        self.engine
            .votes()
            .cast_ballot(&self.session(name), vote_id, choice, signed(name, &message))
    }
}
