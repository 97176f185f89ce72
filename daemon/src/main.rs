//! Custos daemon: entry point for running a trustee governance node.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use custos_crypto::{derive_address, generate_keypair, keypair_from_seed, sign_wallet_message};
use custos_node::{CustosNode, NodeConfig};
use custos_types::KeyPair;
use custos_utils::{init_tracing, LogFormat};
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "custos-daemon", about = "Custos trustee governance daemon")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base; CLI
    /// flags and env vars override them.
    #[arg(long, env = "CUSTOS_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the LMDB environment.
    #[arg(long, env = "CUSTOS_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// RPC listen port.
    #[arg(long, env = "CUSTOS_RPC_PORT")]
    rpc_port: Option<u16>,

    /// RPC bind address.
    #[arg(long, env = "CUSTOS_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CUSTOS_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level or filter directive, e.g. "info" or "debug,custos_rpc=trace".
    #[arg(long, env = "CUSTOS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Hex-encoded session signing secret (at least 16 bytes).
    #[arg(long, env = "CUSTOS_SESSION_SECRET", hide_env_values = true)]
    session_secret: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the node until SIGINT/SIGTERM.
    Run,
    /// Print the effective configuration as TOML.
    Config,
    /// Generate a wallet key: prints the seed (hex) and its address.
    Keygen,
    /// Sign a message with a wallet seed; prints the wallet signature hex.
    Sign {
        /// 32-byte seed, hex.
        #[arg(long, env = "CUSTOS_SEED", hide_env_values = true)]
        seed: String,
        /// Message to sign, e.g. a login statement or "I approve VOTE:<id>".
        #[arg(long)]
        message: String,
    },
}

/// Load the config file (if any) and apply CLI/env overrides on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(port) = cli.rpc_port {
        config.rpc_port = port;
    }
    if let Some(addr) = &cli.bind_address {
        config.bind_address = addr.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = LogFormat::parse(format);
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(secret) = &cli.session_secret {
        config.session_secret_hex = Some(secret.clone());
    }
    config.validate()?;
    Ok(config)
}

fn keypair_from_hex(seed_hex: &str) -> anyhow::Result<KeyPair> {
    let bytes = Zeroizing::new(hex::decode(seed_hex.trim()).context("seed is not hex")?);
    let Ok(seed) = <[u8; 32]>::try_from(bytes.as_slice()) else {
        bail!("seed must be 32 bytes, got {}", bytes.len());
    };
    let seed = Zeroizing::new(seed);
    Ok(keypair_from_seed(&seed))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Keygen => {
            let kp = generate_keypair()?;
            println!("seed:    {}", hex::encode(kp.private.0));
            println!("address: {}", derive_address(&kp.public));
        }
        Command::Sign { seed, message } => {
            let kp = keypair_from_hex(seed)?;
            println!("{}", sign_wallet_message(message, &kp));
        }
        Command::Config => {
            let config = resolve_config(&cli)?;
            print!("{}", config.to_toml_string()?);
        }
        Command::Run => {
            let config = resolve_config(&cli)?;
            init_tracing(config.log_format, &config.log_level);
            tracing::info!(
                data_dir = %config.data_dir.display(),
                rpc = %config.rpc_addr()?,
                trustees = config.bootstrap_trustees.len(),
                "starting Custos node"
            );
            let mut node = CustosNode::new(config)?;
            node.run().await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use custos_crypto::Ed25519Verifier;
    use custos_crypto::SignatureVerifier;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("custos-daemon").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&["--rpc-port", "9000", "--log-format", "json", "run"]);
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.rpc_port, 9000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.bind_address, NodeConfig::default().bind_address);
    }

    #[test]
    fn flags_override_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custos.toml");
        std::fs::write(&path, "rpc_port = 7100\nlog_level = \"debug\"\n").unwrap();
        let path_str = path.to_str().unwrap();

        let config = resolve_config(&parse(&["--config", path_str, "config"])).unwrap();
        assert_eq!(config.rpc_port, 7100);
        assert_eq!(config.log_level, "debug");

        let config =
            resolve_config(&parse(&["--config", path_str, "--rpc-port", "7200", "config"])).unwrap();
        assert_eq!(config.rpc_port, 7200);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = parse(&["--config", "/nonexistent/custos.toml", "run"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn short_secret_fails_validation() {
        let cli = parse(&["--session-secret", "abcd", "run"]);
        assert!(resolve_config(&cli).is_err());
    }

    #[test]
    fn signing_with_a_seed_recovers_its_address() {
        let seed = hex::encode([7u8; 32]);
        let kp = keypair_from_hex(&seed).unwrap();
        let signature = sign_wallet_message("hello", &kp);
        let recovered = Ed25519Verifier.recover("hello", &signature).unwrap();
        assert_eq!(recovered, derive_address(&kp.public));
    }

    #[test]
    fn bad_seeds_are_rejected() {
        assert!(keypair_from_hex("zz").is_err());
        assert!(keypair_from_hex(&hex::encode([1u8; 16])).is_err());
    }
}
