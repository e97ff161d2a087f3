//! # CLI Interface
//!
//! Defines the command-line argument structure for `meridian-node` using
//! `clap` derive. Supports two subcommands: `run` and `version`.
//!
//! Every `run` flag has a `MERIDIAN_*` environment fallback so the node
//! can be configured entirely through the environment in containerized
//! deployments.

use clap::{Parser, Subcommand};

/// Meridian tokenized vault node.
///
/// A service node for the Meridian permissioned vault. Hosts the
/// accounting engine behind a REST/WebSocket API, streams committed
/// events to subscribers, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "meridian-node",
    about = "Meridian tokenized vault node",
    version,
    propagate_version = true
)]
pub struct MeridianNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Meridian node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the vault service node.
    Run(RunArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the REST and WebSocket API.
    #[arg(long, env = "MERIDIAN_RPC_PORT", default_value_t = 9630)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "MERIDIAN_METRICS_PORT", default_value_t = 9631)]
    pub metrics_port: u16,

    /// Deployment label reported by `/status` (e.g. dev, staging, prod).
    #[arg(long, env = "MERIDIAN_ENVIRONMENT", default_value = "dev")]
    pub environment: String,

    /// Custody account the reference asset settles through.
    #[arg(long, env = "MERIDIAN_CUSTODIAN", default_value = "custody")]
    pub custodian: String,

    /// Identity granted the approver and config roles at boot.
    #[arg(long, env = "MERIDIAN_ADMIN", default_value = "admin")]
    pub admin: String,

    /// Initial allowlist member. Repeatable on the command line,
    /// comma-separated through the environment.
    #[arg(long = "member", env = "MERIDIAN_MEMBERS", value_delimiter = ',')]
    pub members: Vec<String>,

    /// Initial asset balance of the form `account=amount`. Repeatable on
    /// the command line, comma-separated through the environment.
    #[arg(long = "grant", env = "MERIDIAN_GRANTS", value_delimiter = ',')]
    pub grants: Vec<String>,

    /// Decimal places of the share token.
    #[arg(long, env = "MERIDIAN_SHARE_DECIMALS", default_value_t = 18)]
    pub share_decimals: u8,

    /// Decimal places of the reference asset.
    #[arg(long, env = "MERIDIAN_ASSET_DECIMALS", default_value_t = 6)]
    pub asset_decimals: u8,

    /// Smallest investment request accepted, in asset units.
    #[arg(long, env = "MERIDIAN_MIN_INVESTMENT", default_value_t = 1)]
    pub min_investment: u64,

    /// Largest investment request accepted, in asset units.
    #[arg(long, env = "MERIDIAN_MAX_INVESTMENT", default_value_t = u64::MAX)]
    pub max_investment: u64,

    /// Smallest withdrawal request accepted, in asset units.
    #[arg(long, env = "MERIDIAN_MIN_WITHDRAWAL", default_value_t = 1)]
    pub min_withdrawal: u64,

    /// Largest withdrawal request accepted, in asset units.
    #[arg(long, env = "MERIDIAN_MAX_WITHDRAWAL", default_value_t = u64::MAX)]
    pub max_withdrawal: u64,

    /// Daily yield rate in microbips (1e-10 per unit). 0 disables accrual.
    #[arg(long, env = "MERIDIAN_DAILY_YIELD_RATE", default_value_t = 0)]
    pub daily_yield_rate: u64,

    /// Growth-guard factor bounding TVL jumps. 0 disables the guard.
    #[arg(long, env = "MERIDIAN_GROWTH_GUARD", default_value_t = 0)]
    pub growth_guard: u64,

    /// Boot with the vault closed to new requests. Claims on requests
    /// already on the book still settle.
    #[arg(long, env = "MERIDIAN_CLOSED")]
    pub closed: bool,

    /// Log filter in tracing `EnvFilter` syntax. `RUST_LOG` overrides.
    #[arg(
        long,
        env = "MERIDIAN_LOG",
        default_value = "meridian_node=info,meridian_vault=info,tower_http=debug"
    )]
    pub log: String,

    /// Log output format: `pretty` or `json`.
    #[arg(long, env = "MERIDIAN_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        MeridianNodeCli::command().debug_assert();
    }

    #[test]
    fn run_defaults_are_sane() {
        let cli = MeridianNodeCli::try_parse_from(["meridian-node", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.rpc_port, 9630);
        assert_eq!(args.custodian, "custody");
        assert_eq!(args.share_decimals, 18);
        assert_eq!(args.asset_decimals, 6);
        assert!(!args.closed);
        assert!(args.members.is_empty());
    }

    #[test]
    fn members_and_grants_are_repeatable() {
        let cli = MeridianNodeCli::try_parse_from([
            "meridian-node",
            "run",
            "--member",
            "alice",
            "--member",
            "bob",
            "--grant",
            "alice=1000000",
            "--closed",
        ])
        .unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        assert_eq!(args.members, ["alice", "bob"]);
        assert_eq!(args.grants, ["alice=1000000"]);
        assert!(args.closed);
    }
}
