//! Cryptographic primitives for Custos.
//!
//! - **Ed25519** for wallet signatures over login challenges, ballots and attestations
//! - **Blake2b** for address checksums
//! - **HMAC-SHA256** for session token tags
//! - Address derivation with `cst_` prefix and base32 encoding
//! - [`SignatureVerifier`], the signer-recovery seam consumed by governance

pub mod address;
pub mod error;
pub mod hash;
pub mod keys;
pub mod mac;
pub mod random;
pub mod sign;
pub mod verifier;

pub use address::{decode_address, derive_address, validate_address};
pub use error::CryptoError;
pub use hash::blake2b_256;
pub use keys::{generate_keypair, keypair_from_seed, public_from_private};
pub use mac::{hmac_sha256, verify_hmac_sha256};
pub use random::{random_bytes, random_hex};
pub use sign::{sign_message, sign_wallet_message, verify_signature};
pub use verifier::{Ed25519Verifier, SignatureVerifier};
