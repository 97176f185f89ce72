//! Ed25519 message signing and verification.
//!
//! A *wallet signature* is what clients submit alongside a signed text
//! message: `hex(public_key || signature)`, 192 hex characters. Carrying the
//! public key lets the server recover the signer address without a key
//! directory.

use custos_types::{KeyPair, PrivateKey, PublicKey, Signature};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};

/// Sign a message with a private key, returning the signature.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    let sig = signing_key.sign(message);
    Signature(sig.to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Returns `true` if the signature is valid, `false` otherwise.
/// Also rejects non-canonical signatures and weak keys (malleability protection).
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify_strict(message, &dalek_sig).is_ok()
}

/// Sign a text message the way a client wallet does, producing the
/// hex-encoded wallet signature accepted by [`crate::Ed25519Verifier`].
pub fn sign_wallet_message(message: &str, keypair: &KeyPair) -> String {
    let sig = sign_message(message.as_bytes(), &keypair.private);
    let mut raw = Vec::with_capacity(96);
    raw.extend_from_slice(keypair.public.as_bytes());
    raw.extend_from_slice(sig.as_bytes());
    hex::encode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keypair_from_seed;

    #[test]
    fn sign_and_verify() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let msg = b"test message for custos";
        let sig = sign_message(msg, &kp.private);
        assert!(verify_signature(msg, &sig, &kp.public));
    }

    #[test]
    fn wrong_message_fails() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let sig = sign_message(b"correct message", &kp.private);
        assert!(!verify_signature(b"wrong message", &sig, &kp.public));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = keypair_from_seed(&[1u8; 32]);
        let kp2 = keypair_from_seed(&[2u8; 32]);
        let sig = sign_message(b"test", &kp1.private);
        assert!(!verify_signature(b"test", &sig, &kp2.public));
    }

    #[test]
    fn signature_deterministic() {
        let kp = keypair_from_seed(&[99u8; 32]);
        let sig1 = sign_message(b"deterministic test", &kp.private);
        let sig2 = sign_message(b"deterministic test", &kp.private);
        assert_eq!(sig1.0, sig2.0);
    }

    #[test]
    fn invalid_public_key() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let sig = sign_message(b"test", &kp.private);
        let bad_key = PublicKey([0xFF; 32]);
        assert!(!verify_signature(b"test", &sig, &bad_key));
    }

    #[test]
    fn wallet_signature_layout() {
        let kp = keypair_from_seed(&[4u8; 32]);
        let encoded = sign_wallet_message("hello", &kp);
        assert_eq!(encoded.len(), 192);
        assert!(encoded.starts_with(&hex::encode(kp.public.as_bytes())));
    }
}
