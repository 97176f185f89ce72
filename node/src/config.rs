//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use custos_auth::{DEFAULT_NONCE_TTL_SECS, DEFAULT_SESSION_TTL_SECS};
use custos_crypto::validate_address;
use custos_governance::params::{DEFAULT_PROXY_TTL_SECS, DEFAULT_VOTE_WINDOW_SECS};
use custos_governance::{GovernanceParams, QuorumPolicies, TrusteeSeed};
use custos_utils::LogFormat;

use crate::NodeError;

/// Configuration for a Custos node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// HTTP port for the governance API.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Interface the governance API binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Lifetime of a bearer session.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,

    /// Lifetime of an unanswered login challenge.
    #[serde(default = "default_nonce_ttl")]
    pub nonce_ttl_secs: u64,

    #[serde(default = "default_vote_window")]
    pub default_vote_window_secs: u64,

    #[serde(default = "default_proxy_ttl")]
    pub default_proxy_ttl_secs: u64,

    /// Hex HMAC key for session tokens. A random key is generated per
    /// process when absent, so tokens do not survive a restart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_secret_hex: Option<String>,

    #[serde(default = "default_lmdb_map_size")]
    pub lmdb_map_size: usize,

    /// Quorum policy per action type.
    #[serde(default)]
    pub policies: QuorumPolicies,

    /// Seeded into the registry on first start only.
    #[serde(default)]
    pub bootstrap_trustees: Vec<TrusteeSeed>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./custos_data")
}

fn default_rpc_port() -> u16 {
    7080
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_ttl() -> u64 {
    DEFAULT_SESSION_TTL_SECS
}

fn default_nonce_ttl() -> u64 {
    DEFAULT_NONCE_TTL_SECS
}

fn default_vote_window() -> u64 {
    DEFAULT_VOTE_WINDOW_SECS
}

fn default_proxy_ttl() -> u64 {
    DEFAULT_PROXY_TTL_SECS
}

fn default_lmdb_map_size() -> usize {
    64 * 1024 * 1024
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &std::path::Path) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject settings the node cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.bind_address
            .parse::<IpAddr>()
            .map_err(|e| NodeError::Config(format!("bind_address {}: {e}", self.bind_address)))?;
        for (name, value) in [
            ("session_ttl_secs", self.session_ttl_secs),
            ("nonce_ttl_secs", self.nonce_ttl_secs),
            ("default_vote_window_secs", self.default_vote_window_secs),
            ("default_proxy_ttl_secs", self.default_proxy_ttl_secs),
        ] {
            if value == 0 {
                return Err(NodeError::Config(format!("{name} must be positive")));
            }
        }
        if self.lmdb_map_size < 1024 * 1024 {
            return Err(NodeError::Config("lmdb_map_size must be at least 1 MiB".into()));
        }
        for seed in &self.bootstrap_trustees {
            if !validate_address(seed.address.as_str()) {
                return Err(NodeError::Config(format!(
                    "bootstrap trustee {}: {} is not a valid wallet address",
                    seed.id, seed.address
                )));
            }
        }
        self.session_secret()?;
        Ok(())
    }

    /// The configured session secret, decoded.
    pub fn session_secret(&self) -> Result<Option<Vec<u8>>, NodeError> {
        let Some(raw) = &self.session_secret_hex else {
            return Ok(None);
        };
        let secret = hex::decode(raw.trim())
            .map_err(|e| NodeError::Config(format!("session_secret_hex: {e}")))?;
        if secret.len() < 16 {
            return Err(NodeError::Config(
                "session_secret_hex must encode at least 16 bytes".into(),
            ));
        }
        Ok(Some(secret))
    }

    pub fn rpc_addr(&self) -> Result<SocketAddr, NodeError> {
        let ip: IpAddr = self
            .bind_address
            .parse()
            .map_err(|e| NodeError::Config(format!("bind_address {}: {e}", self.bind_address)))?;
        Ok(SocketAddr::new(ip, self.rpc_port))
    }

    pub fn governance_params(&self) -> GovernanceParams {
        GovernanceParams {
            default_vote_window_secs: self.default_vote_window_secs,
            default_proxy_ttl_secs: self.default_proxy_ttl_secs,
            policies: self.policies.clone(),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rpc_port: default_rpc_port(),
            bind_address: default_bind_address(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            session_ttl_secs: default_session_ttl(),
            nonce_ttl_secs: default_nonce_ttl(),
            default_vote_window_secs: default_vote_window(),
            default_proxy_ttl_secs: default_proxy_ttl(),
            session_secret_hex: None,
            lmdb_map_size: default_lmdb_map_size(),
            policies: QuorumPolicies::default(),
            bootstrap_trustees: Vec::new(),
        }
    }
}
