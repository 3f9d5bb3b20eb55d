//! # CLI Interface
//!
//! Defines the command-line argument structure for `wraplogin-server` using
//! `clap` derive. Supports three subcommands: `run`, `status`, and
//! `version`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use wraplogin_auth::config::DEFAULT_DIRECTORY_ENDPOINT;

/// Wrap Name sign-in service.
///
/// Issues challenge nonces and verifies personal-message signatures against
/// the holder addresses reported by the Wrap Name directory. Serves the
/// sign-in HTTP API and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "wraplogin-server",
    about = "Wrap Name sign-in service",
    version,
    propagate_version = true
)]
pub struct WrapLoginCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the server binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the sign-in service.
    Run(RunArgs),
    /// Query the health of a running instance via its HTTP endpoint.
    Status(StatusArgs),
    /// Print version information and exit.
    Version,
}

/// Which backend the nonce store runs on.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process map. Nonces vanish on restart; fine for a single replica.
    Memory,
    /// Persistent sled store under the data directory.
    Sled,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Port for the sign-in HTTP API.
    #[arg(long, env = "WRAPLOGIN_PORT", default_value_t = 8791)]
    pub port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "WRAPLOGIN_METRICS_PORT", default_value_t = 8792)]
    pub metrics_port: u16,

    /// GraphQL endpoint of the Wrap Name directory.
    #[arg(long, env = "WRAPLOGIN_DIRECTORY_URL", default_value = DEFAULT_DIRECTORY_ENDPOINT)]
    pub directory_url: String,

    /// Nonce store backend.
    #[arg(long, value_enum, env = "WRAPLOGIN_STORE", default_value_t = StoreBackend::Memory)]
    pub store: StoreBackend,

    /// Data directory for the sled backend. Created on first run.
    #[arg(long, short = 'd', env = "WRAPLOGIN_DATA_DIR", default_value = "~/.wraplogin")]
    pub data_dir: PathBuf,

    /// Nonce time-to-live in seconds.
    ///
    /// This is the replay window: a verified signature stays replayable
    /// until its nonce expires. Lower it if that keeps you up at night.
    #[arg(long, env = "WRAPLOGIN_NONCE_TTL", default_value_t = 60)]
    pub nonce_ttl: u64,
}

/// Arguments for the `status` subcommand.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// HTTP endpoint of the running service.
    #[arg(long, default_value = "http://127.0.0.1:8791")]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        WrapLoginCli::command().debug_assert();
    }

    #[test]
    fn run_defaults_match_protocol_defaults() {
        let cli = WrapLoginCli::parse_from(["wraplogin-server", "run"]);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.nonce_ttl, 60);
        assert_eq!(args.store, StoreBackend::Memory);
        assert_eq!(args.directory_url, DEFAULT_DIRECTORY_ENDPOINT);
    }
}
