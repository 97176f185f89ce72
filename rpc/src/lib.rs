//! HTTP/JSON surface for Custos trustee governance.
//!
//! Login is a two-step challenge: `POST /auth/nonce` then `POST /auth/verify`
//! with the wallet-signed statement. Every other route takes the returned
//! token as `Authorization: Bearer <token>`.

pub mod error;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ErrorBody, RpcError};
pub use routes::router;
pub use server::RpcServer;
pub use state::{Caller, RpcState};
