use thiserror::Error;

/// Failure of a storage backend. Absence of a key is not an error; lookups
/// return `Option`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("record encoding error: {0}")]
    Serialization(String),
}
