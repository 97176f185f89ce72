//! Abstract storage traits for Custos.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits.

pub mod codec;
pub mod document;
pub mod error;
pub mod meta;

pub use codec::{decode, encode};
pub use document::{Collection, DocumentStore, WriteOp, WriteSet};
pub use error::StoreError;
pub use meta::MetaStore;
