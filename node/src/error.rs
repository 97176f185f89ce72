use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("governance error: {0}")]
    Governance(#[from] custos_governance::GovernanceError),

    #[error("store error: {0}")]
    Store(#[from] custos_store::StoreError),

    #[error("LMDB error: {0}")]
    Lmdb(#[from] custos_store_lmdb::LmdbError),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("RPC server error: {0}")]
    Rpc(String),
}
