//! Schema versioning for the LMDB environment.
//!
//! The meta store holds a monotonically increasing schema version. Opening
//! an older database runs each step up to [`CURRENT_SCHEMA_VERSION`]; a
//! database written by newer code is refused.

use custos_store::MetaStore;

use crate::LmdbError;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

pub struct Migrator;

impl Migrator {
    pub fn run(meta_store: &impl MetaStore) -> Result<(), LmdbError> {
        let found = meta_store.get_schema_version()?;
        if found == CURRENT_SCHEMA_VERSION {
            tracing::debug!(version = found, "database schema is up to date");
            return Ok(());
        }
        if found > CURRENT_SCHEMA_VERSION {
            return Err(LmdbError::SchemaTooNew {
                found,
                supported: CURRENT_SCHEMA_VERSION,
            });
        }

        for from in found..CURRENT_SCHEMA_VERSION {
            tracing::info!(from, to = from + 1, "running migration");
            step(from)?;
        }
        meta_store.set_schema_version(CURRENT_SCHEMA_VERSION)?;
        tracing::info!(version = CURRENT_SCHEMA_VERSION, "migration complete");
        Ok(())
    }
}

fn step(from: u32) -> Result<(), LmdbError> {
    match from {
        // 0 → 1: trustees, votes, proxies and attestations databases; they
        // are created on open, so there is nothing to rewrite.
        0 => Ok(()),
        _ => Err(LmdbError::UnknownMigration { from, to: from + 1 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    #[test]
    fn only_known_steps_run() {
        assert!(step(0).is_ok());
        assert!(matches!(
            step(99),
            Err(LmdbError::UnknownMigration { from: 99, to: 100 })
        ));
    }

    #[test]
    fn reopening_is_a_no_op() {
        let dir = tempfile::tempdir().expect("temp dir");
        drop(LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap());
        let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
        assert_eq!(
            env.meta_store().get_schema_version().unwrap(),
            CURRENT_SCHEMA_VERSION
        );
    }

    #[test]
    fn newer_schema_is_refused() {
        let dir = tempfile::tempdir().expect("temp dir");
        {
            let env = LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024).unwrap();
            env.meta_store()
                .set_schema_version(CURRENT_SCHEMA_VERSION + 1)
                .unwrap();
        }
        assert!(matches!(
            LmdbEnvironment::open(dir.path(), 16 * 1024 * 1024),
            Err(LmdbError::SchemaTooNew { .. })
        ));
    }
}
