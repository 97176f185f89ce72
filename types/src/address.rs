//! Wallet address type with `cst_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

/// A Custos wallet address, always prefixed with `cst_`.
///
/// Derived from the wallet's public key via base32 encoding plus a Blake2b
/// checksum. Addresses are stored lowercase, so equality is case-insensitive
/// with respect to whatever the caller typed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    /// The standard prefix for all Custos wallet addresses.
    pub const PREFIX: &'static str = "cst_";

    /// Create a wallet address from a string produced by trusted code
    /// (e.g. address derivation).
    ///
    /// # Panics
    /// Panics if the string does not start with `cst_` (case-insensitive).
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into().to_ascii_lowercase();
        assert!(s.starts_with(Self::PREFIX), "address must start with cst_");
        Self(s)
    }

    /// Parse an address supplied by a caller. Surrounding whitespace is
    /// ignored and the result is normalised to lowercase.
    pub fn parse(raw: &str) -> Result<Self, TypesError> {
        let s = raw.trim().to_ascii_lowercase();
        if !s.starts_with(Self::PREFIX) || s.len() == Self::PREFIX.len() {
            return Err(TypesError::InvalidAddress(raw.to_string()));
        }
        if !s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(TypesError::InvalidAddress(raw.to_string()));
        }
        Ok(Self(s))
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against an unparsed string.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other.trim())
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl std::str::FromStr for WalletAddress {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
