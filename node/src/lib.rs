//! Custos node: configuration, LMDB wiring, trustee bootstrap and the
//! lifecycle of the RPC server.

pub mod config;
pub mod error;
pub mod node;
pub mod shutdown;

pub use config::NodeConfig;
pub use error::NodeError;
pub use node::CustosNode;
pub use shutdown::{ShutdownController, ShutdownSignal};
