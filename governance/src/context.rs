//! Collaborators shared by every governance component.

use std::sync::Arc;

use custos_crypto::{random_hex, SignatureVerifier};
use custos_store::{codec, Collection, DocumentStore, WriteSet};
use custos_types::{Clock, Timestamp, WalletAddress};
use serde::de::DeserializeOwned;

use crate::authz::Session;
use crate::binding::{contains_tag, SignedMessage};
use crate::GovernanceError;

/// Store, clock and signature verifier behind one cheaply cloneable handle.
#[derive(Clone)]
pub struct GovernanceContext {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn SignatureVerifier>,
}

impl GovernanceContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        clock: Arc<dyn Clock>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Self {
        Self {
            store,
            clock,
            verifier,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn verifier(&self) -> &dyn SignatureVerifier {
        self.verifier.as_ref()
    }

    pub(crate) fn load<T: DeserializeOwned>(
        &self,
        collection: Collection,
        key: &str,
    ) -> Result<Option<T>, GovernanceError> {
        match self.store.get(collection, key)? {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn load_all<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, GovernanceError> {
        self.store
            .list(collection)?
            .iter()
            .map(|(_, bytes)| codec::decode(bytes).map_err(GovernanceError::from))
            .collect()
    }

    /// Commit `writes` durably. On error nothing from the batch is visible.
    pub(crate) fn commit(&self, writes: WriteSet) -> Result<(), GovernanceError> {
        let ops = writes.len();
        self.store.commit(writes).map_err(|e| {
            tracing::error!(ops, error = %e, "governance commit failed");
            GovernanceError::Storage(e)
        })
    }

    /// Require that `signature` over `message` was produced by `expected`.
    pub(crate) fn verify_signer(
        &self,
        message: &str,
        signature: &str,
        expected: &WalletAddress,
    ) -> Result<(), GovernanceError> {
        let recovered = self
            .verifier
            .recover(message, signature)
            .map_err(|e| GovernanceError::BadSignature(e.to_string()))?;
        if &recovered != expected {
            return Err(GovernanceError::BadSignature(format!(
                "signed by {recovered}, not {expected}"
            )));
        }
        Ok(())
    }

    /// Checks shared by ballots and attestation signatures, in order: the
    /// signer is the session holder, the signature verifies, and the
    /// message is bound to `tag`.
    pub(crate) fn check_signed(
        &self,
        session: &Session,
        signed: &SignedMessage,
        tag: &str,
    ) -> Result<(), GovernanceError> {
        if signed.address != session.address {
            return Err(GovernanceError::AddressMismatch {
                claimed: signed.address.to_string(),
                session: session.address.to_string(),
            });
        }
        self.verify_signer(&signed.message, &signed.signature, &signed.address)?;
        if !contains_tag(&signed.message, tag) {
            return Err(GovernanceError::InvalidMessage(tag.to_string()));
        }
        Ok(())
    }

    /// A fresh random identifier such as `vote_1f2e3d4c5b6a7980`.
    pub(crate) fn new_id(&self, prefix: &str) -> Result<String, GovernanceError> {
        let suffix = random_hex::<8>().map_err(|e| GovernanceError::Internal(e.to_string()))?;
        Ok(format!("{prefix}_{suffix}"))
    }
}
