//! LMDB storage backend for Custos.
//!
//! Implements the `custos-store` traits using the `heed` LMDB bindings.
//! Each document collection maps to one named LMDB database within a single
//! environment; a [`custos_store::WriteSet`] is applied inside one LMDB write
//! transaction, so a commit is atomic and synced to disk before it returns.

pub mod document;
pub mod environment;
pub mod error;
pub mod meta;
pub mod migration;

pub use document::LmdbDocumentStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use meta::LmdbMetaStore;
