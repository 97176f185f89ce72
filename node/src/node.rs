//! The Custos node: wires storage, the governance engine, login and the RPC
//! server together.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use custos_auth::{ChallengeIssuer, SessionIssuer};
use custos_crypto::Ed25519Verifier;
use custos_governance::{GovernanceContext, GovernanceEngine};
use custos_rpc::{RpcServer, RpcState};
use custos_store_lmdb::LmdbEnvironment;
use custos_types::SystemClock;
use custos_utils::format_duration;
use tokio::task::JoinHandle;

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::shutdown::ShutdownController;

/// Upper bound on how long [`CustosNode::stop`] waits for the RPC server to
/// drain.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub struct CustosNode {
    config: NodeConfig,
    engine: Arc<GovernanceEngine>,
    sessions: Arc<SessionIssuer>,
    challenges: Arc<ChallengeIssuer>,
    shutdown: Arc<ShutdownController>,
    rpc_addr: Option<SocketAddr>,
    task_handles: Vec<JoinHandle<()>>,
}

impl CustosNode {
    /// Open the LMDB environment under `data_dir` and build the node on it.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let env = LmdbEnvironment::open(&config.data_dir, config.lmdb_map_size)?;
        let ctx = GovernanceContext::new(
            Arc::new(env.document_store()),
            Arc::new(SystemClock),
            Arc::new(Ed25519Verifier),
        );
        Self::with_context(config, ctx)
    }

    /// Build the node over an existing context. Seeds the trustee registry
    /// from `bootstrap_trustees` when it is empty.
    pub fn with_context(config: NodeConfig, ctx: GovernanceContext) -> Result<Self, NodeError> {
        config.validate()?;
        let engine = Arc::new(GovernanceEngine::new(ctx.clone(), config.governance_params()));

        let seeded = engine.registry().bootstrap(&config.bootstrap_trustees)?;
        if seeded == 0 && engine.registry().list_all()?.is_empty() {
            tracing::warn!("trustee registry is empty; no one can log in");
        }

        let registry = Arc::clone(engine.registry());
        let sessions = Arc::new(match config.session_secret()? {
            Some(secret) => {
                SessionIssuer::new(ctx.clone(), Arc::clone(&registry), secret, config.session_ttl_secs)
            }
            None => {
                tracing::info!("no session secret configured; sessions end with the process");
                SessionIssuer::with_random_secret(
                    ctx.clone(),
                    Arc::clone(&registry),
                    config.session_ttl_secs,
                )?
            }
        });
        let challenges = Arc::new(ChallengeIssuer::new(
            ctx,
            registry,
            Arc::clone(&sessions),
            config.nonce_ttl_secs,
        ));

        Ok(Self {
            config,
            engine,
            sessions,
            challenges,
            shutdown: Arc::new(ShutdownController::new()),
            rpc_addr: None,
            task_handles: Vec::new(),
        })
    }

    /// Bind the RPC server and serve it in the background. Returns the bound
    /// address, which differs from the configured one when `rpc_port` is 0.
    pub async fn start(&mut self) -> Result<SocketAddr, NodeError> {
        if let Some(addr) = self.rpc_addr {
            return Ok(addr);
        }
        let server = RpcServer::bind(self.config.rpc_addr()?, self.rpc_state())
            .await
            .map_err(|e| NodeError::Rpc(e.to_string()))?;
        let addr = server.local_addr().map_err(|e| NodeError::Rpc(e.to_string()))?;

        let signal = self.shutdown.subscribe();
        let rpc_handle = tokio::spawn(async move {
            match server.serve(signal.recv()).await {
                Ok(()) => tracing::info!("RPC server exited"),
                Err(e) => tracing::error!("RPC server error: {e}"),
            }
        });
        self.task_handles.push(rpc_handle);
        self.rpc_addr = Some(addr);

        let trustees = self.engine.registry().active_count()?;
        tracing::info!(
            %addr,
            trustees,
            session_ttl = %format_duration(self.config.session_ttl_secs),
            "Custos node started"
        );
        Ok(addr)
    }

    /// Run until SIGINT/SIGTERM, then stop.
    pub async fn run(&mut self) -> Result<(), NodeError> {
        self.start().await?;
        self.shutdown.wait_for_signal().await;
        self.stop().await
    }

    /// Signal background tasks and wait for them, bounded by a timeout.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("Custos node stopping");
        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all).await.is_err() {
            tracing::warn!("shutdown timeout ({SHUTDOWN_TIMEOUT:?}); RPC server may still be draining");
        }
        self.rpc_addr = None;

        tracing::info!("Custos node stopped");
        Ok(())
    }

    pub fn rpc_state(&self) -> RpcState {
        RpcState::new(
            Arc::clone(&self.engine),
            Arc::clone(&self.sessions),
            Arc::clone(&self.challenges),
        )
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn engine(&self) -> &Arc<GovernanceEngine> {
        &self.engine
    }

    pub fn sessions(&self) -> &Arc<SessionIssuer> {
        &self.sessions
    }

    pub fn challenges(&self) -> &Arc<ChallengeIssuer> {
        &self.challenges
    }

    pub fn shutdown_controller(&self) -> &Arc<ShutdownController> {
        &self.shutdown
    }

    /// Bound RPC address while the node is running.
    pub fn rpc_addr(&self) -> Option<SocketAddr> {
        self.rpc_addr
    }
}
