//! Fundamental types for Custos trustee governance.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! wallet addresses, timestamps and the clock seam, and key material newtypes.

pub mod address;
pub mod error;
pub mod keys;
pub mod time;

pub use address::WalletAddress;
pub use error::TypesError;
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use time::{Clock, SystemClock, Timestamp};
