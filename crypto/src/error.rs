use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("malformed wallet signature: {0}")]
    MalformedSignature(String),

    #[error("signature does not verify against the embedded public key")]
    BadSignature,

    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("operating system randomness unavailable: {0}")]
    RandomUnavailable(String),
}
