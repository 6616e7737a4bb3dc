// Copyright (c) 2026 Arboreum. MIT License.
// See LICENSE for details.

//! # Arboreum Loan-Log Service
//!
//! Entry point for the `arbor-service` binary. Parses CLI arguments,
//! initializes logging and metrics, connects the loan-log service to a
//! ledger (refusing to start if the master key is not the registrar), and
//! serves the REST API.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — start the HTTP service
//! - `keygen`  — generate a master keypair and print it
//! - `version` — print build version information

mod api;
mod auth;
mod cli;
mod logging;
mod metrics;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use arbor_ledger::client::MemoryLedger;
use arbor_ledger::config::Network;
use arbor_ledger::{LoanLogService, ServiceConfig, UnlockedAccount};

use auth::AuthConfig;
use cli::{ArborServiceCli, Commands};
use logging::LogFormat;
use metrics::ServiceMetrics;

/// Seed balance for a throwaway local master, enough that funding
/// endpoints never run dry during development.
const LOCAL_MASTER_BALANCE: u64 = 100_000_000_000;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ArborServiceCli::parse();

    match cli.command {
        Commands::Run(args) => run_service(args).await,
        Commands::Keygen => {
            keygen();
            Ok(())
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full service: registrar check, API server, metrics endpoint.
async fn run_service(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "arbor_service=info,arbor_ledger=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    let network = Network::parse(&args.network)
        .with_context(|| format!("unknown network: {}", args.network))?;

    tracing::info!(
        port = args.port,
        metrics_port = args.metrics_port,
        network = %network,
        profile_app_id = args.profile_app_id,
        "starting arbor-service"
    );

    // --- Master key ---
    let master = match &args.master_key {
        Some(hex_key) => UnlockedAccount::from_hex(hex_key)
            .map_err(|e| anyhow::anyhow!("invalid master key: {e}"))?,
        None => {
            if network != Network::Local {
                bail!("--master-key is required on {network}");
            }
            let account = UnlockedAccount::generate();
            tracing::warn!(
                address = account.address().as_str(),
                "no master key supplied, generated a throwaway local key"
            );
            account
        }
    };

    // --- Ledger client ---
    // Only the in-process ledger is wired up today; pointing the service at
    // a networked node is a deployment concern behind the same trait.
    if network != Network::Local {
        bail!("network {network} requires an external ledger endpoint; this build supports local only");
    }
    let ledger = Arc::new(MemoryLedger::new());
    ledger.fund(&master.address(), LOCAL_MASTER_BALANCE);
    ledger
        .with_profile_app(args.profile_app_id, &master.address(), &master.address())
        .map_err(|e| anyhow::anyhow!("failed to seed profile contract: {e}"))?;
    tracing::info!(
        app_id = args.profile_app_id,
        "local ledger seeded with profile contract"
    );

    // --- Service (registrar check happens here) ---
    let config = ServiceConfig::new(master, args.profile_app_id, network);
    let service = LoanLogService::connect(ledger, config)
        .await
        .map_err(|e| anyhow::anyhow!("registrar check failed: {e}"))?;

    // --- Metrics ---
    let service_metrics = Arc::new(ServiceMetrics::new());

    // --- Auth ---
    let auth = AuthConfig::new(args.api_secret.as_deref());
    if auth.is_open() && network != Network::Local {
        bail!("refusing to run without --api-secret outside the local network");
    }
    if auth.is_open() {
        tracing::warn!("no API secret configured, mutating endpoints are open");
    }

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        service: Arc::new(service),
        metrics: Arc::clone(&service_metrics),
        auth,
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&service_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("arbor-service stopped");
    Ok(())
}

/// Generates a master keypair and prints it to stdout.
///
/// The secret line is the only place the key ever appears; pipe it
/// straight into a secret manager.
fn keygen() {
    let account = UnlockedAccount::generate();
    println!("address : {}", account.address().as_str());
    println!("secret  : {}", account.secret_hex());
}

/// Prints version information to stdout.
fn print_version() {
    println!("arbor-service {}", env!("CARGO_PKG_VERSION"));
    println!("rustc         {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
