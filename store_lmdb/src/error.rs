use thiserror::Error;

#[derive(Debug, Error)]
pub enum LmdbError {
    #[error("LMDB error: {0}")]
    Heed(String),

    #[error("cannot create data directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("database schema version {found} is newer than supported version {supported}")]
    SchemaTooNew { found: u32, supported: u32 },

    #[error("no migration from schema {from} to {to}")]
    UnknownMigration { from: u32, to: u32 },

    #[error(transparent)]
    Store(#[from] custos_store::StoreError),
}

impl From<heed::Error> for LmdbError {
    fn from(e: heed::Error) -> Self {
        LmdbError::Heed(e.to_string())
    }
}

impl From<LmdbError> for custos_store::StoreError {
    fn from(e: LmdbError) -> Self {
        match e {
            LmdbError::Store(inner) => inner,
            other => custos_store::StoreError::Backend(other.to_string()),
        }
    }
}
