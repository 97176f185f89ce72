//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use custos_store::Collection;

use crate::migration::Migrator;
use crate::{LmdbDocumentStore, LmdbError, LmdbMetaStore};

/// One database per collection plus the meta database.
const MAX_DBS: u32 = 8;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    trustees_db: Database<Bytes, Bytes>,
    votes_db: Database<Bytes, Bytes>,
    proxies_db: Database<Bytes, Bytes>,
    attestations_db: Database<Bytes, Bytes>,
    meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given directory, create the
    /// named databases and bring the schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process for this path and
        // the directory is not shared with another LMDB user in this process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let trustees_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some(Collection::Trustees.name()))?;
        let votes_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some(Collection::Votes.name()))?;
        let proxies_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some(Collection::Proxies.name()))?;
        let attestations_db: Database<Bytes, Bytes> =
            env.create_database(&mut wtxn, Some(Collection::Attestations.name()))?;
        let meta_db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let environment = Self {
            env: Arc::new(env),
            trustees_db,
            votes_db,
            proxies_db,
            attestations_db,
            meta_db,
        };
        Migrator::run(&environment.meta_store())?;
        tracing::info!(path = %path.display(), "LMDB environment opened");
        Ok(environment)
    }

    /// Document store over the governance collections.
    pub fn document_store(&self) -> LmdbDocumentStore {
        LmdbDocumentStore {
            env: Arc::clone(&self.env),
            trustees_db: self.trustees_db,
            votes_db: self.votes_db,
            proxies_db: self.proxies_db,
            attestations_db: self.attestations_db,
        }
    }

    /// Metadata store (schema version).
    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }
}
