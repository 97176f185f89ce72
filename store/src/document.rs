//! Durable keyed document storage.
//!
//! Governance state lives in four collections of independently keyed
//! records. Reads are single lookups or full scans; writes are grouped in a
//! [`WriteSet`] that the backend applies all-or-nothing and makes durable
//! before `commit` returns.

use serde::Serialize;

use crate::{codec, StoreError};

/// The document collections governance persists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Trustees,
    Votes,
    Proxies,
    Attestations,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Trustees,
        Collection::Votes,
        Collection::Proxies,
        Collection::Attestations,
    ];

    /// Backend-facing name (LMDB database name, log field).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Trustees => "trustees",
            Self::Votes => "votes",
            Self::Proxies => "proxies",
            Self::Attestations => "attestations",
        }
    }
}

/// One pending mutation inside a [`WriteSet`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteOp {
    Put {
        collection: Collection,
        key: String,
        value: Vec<u8>,
    },
    Delete {
        collection: Collection,
        key: String,
    },
}

/// An ordered batch of writes committed as a single transaction.
///
/// Dropping a write set without committing it has no effect on the store.
#[derive(Clone, Debug, Default)]
pub struct WriteSet {
    ops: Vec<WriteOp>,
}

impl WriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, collection: Collection, key: impl Into<String>, value: Vec<u8>) {
        self.ops.push(WriteOp::Put {
            collection,
            key: key.into(),
            value,
        });
    }

    /// Encode `record` and queue it under `key`.
    pub fn put_record<T: Serialize>(
        &mut self,
        collection: Collection,
        key: impl Into<String>,
        record: &T,
    ) -> Result<(), StoreError> {
        let value = codec::encode(record)?;
        self.put(collection, key, value);
        Ok(())
    }

    pub fn delete(&mut self, collection: Collection, key: impl Into<String>) {
        self.ops.push(WriteOp::Delete {
            collection,
            key: key.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// A durable keyed document store.
pub trait DocumentStore: Send + Sync {
    /// Fetch one record.
    fn get(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// All `(key, value)` pairs of a collection, ordered by key.
    fn list(&self, collection: Collection) -> Result<Vec<(String, Vec<u8>)>, StoreError>;

    /// Apply every operation of `writes` atomically and durably.
    fn commit(&self, writes: WriteSet) -> Result<(), StoreError>;

    /// Fetch one record, or `fallback` when it is absent.
    fn read(
        &self,
        collection: Collection,
        key: &str,
        fallback: Vec<u8>,
    ) -> Result<Vec<u8>, StoreError> {
        Ok(self.get(collection, key)?.unwrap_or(fallback))
    }
}
