//! Nullable store: thread-safe in-memory document storage for testing.

use custos_store::{Collection, DocumentStore, StoreError, WriteOp, WriteSet};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// An in-memory [`DocumentStore`].
///
/// Commits apply all-or-nothing under one lock. Commit failures can be
/// injected to exercise the "nothing persisted" path of callers.
pub struct NullStore {
    docs: Mutex<BTreeMap<(Collection, String), Vec<u8>>>,
    fail_commits: AtomicBool,
    commits: AtomicUsize,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            docs: Mutex::new(BTreeMap::new()),
            fail_commits: AtomicBool::new(false),
            commits: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent commit fail with a backend error (or stop doing so).
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    /// Number of records in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.docs
            .lock()
            .unwrap()
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.lock().unwrap().is_empty()
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for NullStore {
    fn get(&self, collection: Collection, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .get(&(collection, key.to_string()))
            .cloned())
    }

    fn list(&self, collection: Collection) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|((_, k), v)| (k.clone(), v.clone()))
            .collect())
    }

    fn commit(&self, writes: WriteSet) -> Result<(), StoreError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        let mut docs = self.docs.lock().unwrap();
        for op in writes.into_ops() {
            match op {
                WriteOp::Put {
                    collection,
                    key,
                    value,
                } => {
                    docs.insert((collection, key), value);
                }
                WriteOp::Delete { collection, key } => {
                    docs.remove(&(collection, key));
                }
            }
        }
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_then_read() {
        let store = NullStore::new();
        let mut ws = WriteSet::new();
        ws.put(Collection::Votes, "v1", vec![1, 2]);
        ws.put(Collection::Votes, "v2", vec![3]);
        store.commit(ws).unwrap();
        assert_eq!(store.get(Collection::Votes, "v1").unwrap(), Some(vec![1, 2]));
        assert_eq!(store.list(Collection::Votes).unwrap().len(), 2);
        assert_eq!(store.len(Collection::Trustees), 0);
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn injected_failure_persists_nothing() {
        let store = NullStore::new();
        store.fail_commits(true);
        let mut ws = WriteSet::new();
        ws.put(Collection::Trustees, "t1", vec![1]);
        assert!(store.commit(ws).is_err());
        assert!(store.is_empty());
        assert_eq!(store.commit_count(), 0);
    }
}
