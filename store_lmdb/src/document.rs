//! LMDB implementation of DocumentStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use custos_store::{Collection, DocumentStore, StoreError, WriteOp, WriteSet};

use crate::LmdbError;

#[derive(Clone)]
pub struct LmdbDocumentStore {
    pub(crate) env: Arc<Env>,
    pub(crate) trustees_db: Database<Bytes, Bytes>,
    pub(crate) votes_db: Database<Bytes, Bytes>,
    pub(crate) proxies_db: Database<Bytes, Bytes>,
    pub(crate) attestations_db: Database<Bytes, Bytes>,
}

impl LmdbDocumentStore {
    fn db(&self, collection: Collection) -> Database<Bytes, Bytes> {
        match collection {
            Collection::Trustees => self.trustees_db,
            Collection::Votes => self.votes_db,
            Collection::Proxies => self.proxies_db,
            Collection::Attestations => self.attestations_db,
        }
    }
}

impl DocumentStore for LmdbDocumentStore {
    fn get(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .db(collection)
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(|v| v.to_vec()))
    }

    fn list(&self, collection: Collection) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut records = Vec::new();
        let iter = self.db(collection).iter(&rtxn).map_err(LmdbError::from)?;
        for result in iter {
            let (key, val) = result.map_err(LmdbError::from)?;
            let key = std::str::from_utf8(key)
                .map_err(|e| StoreError::Serialization(format!("non-UTF-8 key: {e}")))?;
            records.push((key.to_string(), val.to_vec()));
        }
        Ok(records)
    }

    fn commit(&self, writes: WriteSet) -> Result<(), StoreError> {
        if writes.is_empty() {
            return Ok(());
        }
        let count = writes.len();
        // Dropping `wtxn` on an early return aborts the transaction.
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        for op in writes.into_ops() {
            match op {
                WriteOp::Put {
                    collection,
                    key,
                    value,
                } => {
                    self.db(collection)
                        .put(&mut wtxn, key.as_bytes(), &value)
                        .map_err(LmdbError::from)?;
                }
                WriteOp::Delete { collection, key } => {
                    self.db(collection)
                        .delete(&mut wtxn, key.as_bytes())
                        .map_err(LmdbError::from)?;
                }
            }
        }
        wtxn.commit().map_err(LmdbError::from)?;
        tracing::trace!(ops = count, "write set committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    fn temp_store() -> (tempfile::TempDir, LmdbDocumentStore) {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).expect("open env");
        (dir, env.document_store())
    }

    #[test]
    fn put_get_roundtrip() {
        let (_dir, store) = temp_store();
        let mut ws = WriteSet::new();
        ws.put(Collection::Votes, "v1", b"hello".to_vec());
        store.commit(ws).unwrap();
        assert_eq!(
            store.get(Collection::Votes, "v1").unwrap(),
            Some(b"hello".to_vec())
        );
        assert_eq!(store.get(Collection::Proxies, "v1").unwrap(), None);
    }

    #[test]
    fn read_falls_back_when_absent() {
        let (_dir, store) = temp_store();
        let val = store.read(Collection::Trustees, "missing", b"[]".to_vec()).unwrap();
        assert_eq!(val, b"[]".to_vec());
    }

    #[test]
    fn list_is_ordered_by_key() {
        let (_dir, store) = temp_store();
        let mut ws = WriteSet::new();
        ws.put(Collection::Attestations, "b", vec![2]);
        ws.put(Collection::Attestations, "a", vec![1]);
        store.commit(ws).unwrap();
        let keys: Vec<_> = store
            .list(Collection::Attestations)
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn delete_removes_record() {
        let (_dir, store) = temp_store();
        let mut ws = WriteSet::new();
        ws.put(Collection::Proxies, "p1", vec![1]);
        store.commit(ws).unwrap();
        let mut ws = WriteSet::new();
        ws.delete(Collection::Proxies, "p1");
        store.commit(ws).unwrap();
        assert_eq!(store.get(Collection::Proxies, "p1").unwrap(), None);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        {
            let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
            let mut ws = WriteSet::new();
            ws.put(Collection::Trustees, "t1", vec![7]);
            env.document_store().commit(ws).unwrap();
        }
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        assert_eq!(
            env.document_store().get(Collection::Trustees, "t1").unwrap(),
            Some(vec![7])
        );
    }
}
