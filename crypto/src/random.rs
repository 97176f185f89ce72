//! Operating-system randomness for nonces, secrets and fresh keys.

use crate::CryptoError;

/// Fill an `N`-byte array from the OS CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut buf = [0u8; N];
    getrandom::getrandom(&mut buf).map_err(|e| CryptoError::RandomUnavailable(e.to_string()))?;
    Ok(buf)
}

/// `N` random bytes, hex encoded.
pub fn random_hex<const N: usize>() -> Result<String, CryptoError> {
    Ok(hex::encode(random_bytes::<N>()?))
}
