//! Per-aggregate mutual exclusion.
//!
//! Every read-modify-write of a vote, proxy or attestation runs while holding
//! the lock for that record's id, so concurrent writers to the same record
//! serialize while writers to different records proceed in parallel.
//!
//! Only ids that are currently held occupy an entry: the guard removes its id
//! on drop, so requests for ids that never existed leave nothing behind.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
pub(crate) struct EntityLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl EntityLocks {
    /// Block until no other guard holds `key`, then hold it.
    pub(crate) fn lock(&self, key: &str) -> EntityGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(key) {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        held.insert(key.to_string());
        EntityGuard {
            locks: self,
            key: key.to_string(),
        }
    }

    /// Non-blocking variant of [`lock`](Self::lock).
    #[cfg(test)]
    fn try_lock(&self, key: &str) -> Option<EntityGuard<'_>> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(key.to_string()) {
            return None;
        }
        Some(EntityGuard {
            locks: self,
            key: key.to_string(),
        })
    }

    /// Number of ids currently held.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.held.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[must_use = "the id is released as soon as the guard is dropped"]
pub(crate) struct EntityGuard<'a> {
    locks: &'a EntityLocks,
    key: String,
}

impl Drop for EntityGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        held.remove(&self.key);
        drop(held);
        self.locks.released.notify_all();
    }
}

/// Acquire a guard, ignoring poisoning: the protected state lives in the
/// store, which a panicking holder never partially committed.
pub(crate) fn acquire(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn same_key_is_exclusive() {
        let locks = EntityLocks::default();
        let guard = locks.lock("vote_1");
        assert!(locks.try_lock("vote_1").is_none());
        drop(guard);
        assert!(locks.try_lock("vote_1").is_some());
    }

    #[test]
    fn different_keys_do_not_block_each_other() {
        let locks = EntityLocks::default();
        let _a = locks.lock("a");
        assert!(locks.try_lock("b").is_some());
        assert!(locks.try_lock("a").is_none());
    }

    #[test]
    fn released_ids_leave_no_entry() {
        let locks = EntityLocks::default();
        for i in 0..10_000 {
            let _guard = locks.lock(&format!("vote_missing_{i}"));
        }
        assert_eq!(locks.len(), 0);
    }

    #[test]
    fn contended_key_serializes_holders() {
        let locks = Arc::new(EntityLocks::default());
        let inside = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                thread::spawn(move || {
                    for _ in 0..100 {
                        let _guard = locks.lock("vote_1");
                        assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                        inside.fetch_sub(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(locks.len(), 0);
    }
}
