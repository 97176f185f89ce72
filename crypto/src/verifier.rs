//! Signer recovery for wallet-signed messages.
//!
//! Governance never inspects signature bytes itself: it asks a
//! [`SignatureVerifier`] which address produced a `(message, signature)`
//! pair and compares that with the address the caller claims.

use custos_types::{PublicKey, Signature, WalletAddress};

use crate::{derive_address, verify_signature, CryptoError};

/// Recovers the signer address of a wallet-signed text message.
pub trait SignatureVerifier: Send + Sync {
    /// Return the address that signed `message`, or an error when the
    /// signature is malformed or does not verify.
    fn recover(&self, message: &str, signature: &str) -> Result<WalletAddress, CryptoError>;
}

/// Verifier for `hex(public_key || ed25519_signature)` wallet signatures.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Verifier;

impl Ed25519Verifier {
    fn split(signature: &str) -> Result<(PublicKey, Signature), CryptoError> {
        let raw = signature.trim();
        let raw = raw.strip_prefix("0x").unwrap_or(raw);
        let bytes =
            hex::decode(raw).map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        if bytes.len() != 96 {
            return Err(CryptoError::MalformedSignature(format!(
                "expected 96 bytes, got {}",
                bytes.len()
            )));
        }
        let mut pk = [0u8; 32];
        pk.copy_from_slice(&bytes[..32]);
        let sig = Signature::from_slice(&bytes[32..])
            .map_err(|e| CryptoError::MalformedSignature(e.to_string()))?;
        Ok((PublicKey(pk), sig))
    }
}

impl SignatureVerifier for Ed25519Verifier {
    fn recover(&self, message: &str, signature: &str) -> Result<WalletAddress, CryptoError> {
        let (public_key, sig) = Self::split(signature)?;
        if !verify_signature(message.as_bytes(), &sig, &public_key) {
            return Err(CryptoError::BadSignature);
        }
        Ok(derive_address(&public_key))
    }
}
