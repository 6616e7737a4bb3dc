//! # CLI Interface
//!
//! Defines the command-line argument structure for `arbor-service` using
//! `clap` derive. Supports three subcommands: `run`, `keygen`, and
//! `version`.

use clap::{Parser, Subcommand};

/// Arboreum loan-log service.
///
/// A thin backend over a ledger: mints one-unit loan-log assets, appends
/// loan events as prefix-tagged notes, and maintains borrower credit
/// profiles in a registrar-gated contract.
#[derive(Parser, Debug)]
#[command(
    name = "arbor-service",
    about = "Arboreum loan-log service",
    version,
    propagate_version = true
)]
pub struct ArborServiceCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the service binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP service.
    Run(RunArgs),
    /// Generate a fresh master keypair and print it.
    Keygen,
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the REST API.
    #[arg(long, env = "ARBOR_PORT", default_value_t = 8477)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "ARBOR_METRICS_PORT", default_value_t = 8478)]
    pub metrics_port: u16,

    /// Ledger network: local, sandbox, testnet, or mainnet.
    #[arg(long, env = "ARBOR_NETWORK", default_value = "local")]
    pub network: String,

    /// Id of the profile contract. On the local network a contract with
    /// this id is seeded at startup with the master as registrar.
    #[arg(long, env = "ARBOR_PROFILE_APP_ID", default_value_t = 1)]
    pub profile_app_id: u64,

    /// Hex-encoded Ed25519 master secret key.
    ///
    /// When omitted on the local network a throwaway key is generated.
    /// **Never pass this flag in production** — use the environment
    /// variable or a secret manager instead.
    #[arg(long, env = "ARBOR_MASTER_KEY")]
    pub master_key: Option<String>,

    /// Bearer secret required on mutating endpoints. Unset means open
    /// access, which is only acceptable on the local network.
    #[arg(long, env = "ARBOR_API_SECRET")]
    pub api_secret: Option<String>,

    /// Log output format: pretty or json.
    #[arg(long, env = "ARBOR_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}
