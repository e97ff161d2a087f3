// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Meridian Vault Node
//!
//! Entry point for the `meridian-node` binary. Parses CLI arguments,
//! initializes logging and metrics, constructs the vault engine, and
//! serves the HTTP/WS API.
//!
//! The binary supports two subcommands:
//!
//! - `run`     — start the vault node
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;

use meridian_vault::account::{Collaborators, VaultAccount};
use meridian_vault::collaborators::{
    Allowlist, AssetBook, OperatorTable, PauseSwitch, Role, RoleTable,
};
use meridian_vault::config::{Timestamp, VaultParams};

use cli::{Commands, MeridianNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

/// Broadcast channel capacity for live event streaming.
/// 256 is large enough to absorb short bursts without dropping events
/// for connected WebSocket clients.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How often the background task refreshes the vault gauges, in seconds.
const GAUGE_PULSE_SECS: u64 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MeridianNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full vault node: engine, API server, and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(&args.log, LogFormat::from_str_lossy(&args.log_format));

    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        environment = %args.environment,
        custodian = %args.custodian,
        "starting meridian-node"
    );

    // --- Membership ---
    let allowlist = Allowlist::new();
    for member in &args.members {
        allowlist.add(member);
    }
    allowlist.add(&args.custodian);
    tracing::info!(members = args.members.len(), "allowlist seeded");

    // --- Roles ---
    let roles = RoleTable::new();
    roles.grant(&args.admin, Role::Approver);
    roles.grant(&args.admin, Role::Config);
    tracing::info!(admin = %args.admin, "granted approver and config roles");

    // --- Custody ledger ---
    let assets = AssetBook::new();
    for grant in &args.grants {
        let (account, amount) = parse_grant(grant)?;
        assets.deposit(account, amount);
        tracing::info!(account, amount = %amount, "funded ledger account");
    }

    // --- Pause flag ---
    let pause = PauseSwitch::new();

    // --- Engine ---
    let collaborators = Collaborators {
        allowlist: Box::new(allowlist.clone()),
        roles: Box::new(roles.clone()),
        assets: Box::new(assets.clone()),
        pause: Box::new(pause.clone()),
        operators: Box::new(OperatorTable::new()),
    };
    let params = VaultParams {
        min_investment: args.min_investment.into(),
        max_investment: args.max_investment.into(),
        min_withdrawal: args.min_withdrawal.into(),
        max_withdrawal: args.max_withdrawal.into(),
        daily_yield_rate: args.daily_yield_rate,
        growth_guard_factor: args.growth_guard,
        is_open: !args.closed,
    };
    let engine = VaultAccount::new(
        params,
        &args.custodian,
        args.share_decimals,
        args.asset_decimals,
        collaborators,
    )
    .context("failed to construct the vault engine")?;
    let engine = Arc::new(RwLock::new(engine));
    tracing::info!(
        share_decimals = args.share_decimals,
        asset_decimals = args.asset_decimals,
        open = !args.closed,
        "vault engine ready"
    );

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        environment: args.environment.clone(),
        engine: Arc::clone(&engine),
        pause: pause.clone(),
        roles: roles.clone(),
        event_tx: event_tx.clone(),
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state.clone());
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Gauge pulse ---
    // Counters move inside the request handlers; the gauges are refreshed
    // here on a fixed cadence so scrapes see accrual progress even while
    // no requests arrive.
    let engine_ref = Arc::clone(&engine);
    let metrics_ref = Arc::clone(&node_metrics);
    let pulse_loop = tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(GAUGE_PULSE_SECS));
        loop {
            interval.tick().await;
            let now = chrono::Utc::now().timestamp() as Timestamp;
            let view = engine_ref.read().vault_view(now);
            match view {
                Ok(view) => {
                    metrics_ref.total_shares.set(view.total_shares as f64);
                    metrics_ref.total_value.set(view.current_total_value as f64);
                    metrics_ref
                        .investment_requests
                        .set(view.investment_requests as i64);
                    metrics_ref
                        .withdrawal_requests
                        .set(view.withdrawal_requests as i64);
                }
                Err(e) => tracing::warn!("gauge pulse skipped: {}", e),
            }
        }
    });

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

    pulse_loop.abort();
    tracing::info!("meridian-node stopped");
    Ok(())
}

/// Splits an `account=amount` CLI grant into its parts.
fn parse_grant(grant: &str) -> Result<(&str, u128)> {
    let (account, amount) = grant
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("grant {:?} is not account=amount", grant))?;
    if account.is_empty() {
        anyhow::bail!("grant {:?} names no account", grant);
    }
    let amount = amount
        .parse::<u128>()
        .with_context(|| format!("grant {:?} has a bad amount", grant))?;
    Ok((account, amount))
}

/// Prints version information to stdout.
fn print_version() {
    println!("meridian-node {}", env!("CARGO_PKG_VERSION"));
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
