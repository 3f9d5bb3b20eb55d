// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # wraplogin Server
//!
//! Entry point for the `wraplogin-server` binary. Parses CLI arguments,
//! initializes logging and metrics, wires the nonce store and the name
//! directory into the login service, and serves the sign-in HTTP API.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — start the sign-in service
//! - `status`  — query a running instance's health endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use wraplogin_auth::directory::Directory;
use wraplogin_auth::store::NonceKv;
use wraplogin_auth::{GraphDirectory, LoginService, MemoryKv, SledKv};

use cli::{Commands, StoreBackend, WrapLoginCli};
use logging::LogFormat;
use metrics::ServiceMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = WrapLoginCli::parse();

    match cli.command {
        Commands::Run(args) => run_server(args).await,
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the sign-in service: API server plus metrics endpoint.
async fn run_server(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "wraplogin_server=info,wraplogin_auth=info,tower_http=debug",
        LogFormat::Pretty,
    );

    tracing::info!(
        port = args.port,
        metrics_port = args.metrics_port,
        directory_url = %args.directory_url,
        store = ?args.store,
        nonce_ttl_secs = args.nonce_ttl,
        "starting wraplogin-server"
    );

    // --- Nonce store ---
    let kv: Arc<dyn NonceKv> = match args.store {
        StoreBackend::Memory => Arc::new(MemoryKv::new()),
        StoreBackend::Sled => {
            let db_path = args.data_dir.join("nonces");
            std::fs::create_dir_all(&args.data_dir).with_context(|| {
                format!("failed to create data directory: {}", args.data_dir.display())
            })?;
            let kv = SledKv::open(&db_path)
                .with_context(|| format!("failed to open nonce store at {}", db_path.display()))?;
            tracing::info!(path = %db_path.display(), "nonce store opened");
            Arc::new(kv)
        }
    };

    // --- Name directory ---
    let directory: Arc<dyn Directory> = Arc::new(GraphDirectory::new(args.directory_url));

    // --- Login service ---
    let service = LoginService::new(kv, directory, Duration::from_secs(args.nonce_ttl));

    // --- Metrics ---
    let service_metrics = Arc::new(ServiceMetrics::new());

    // --- Application state ---
    let app_state = api::AppState {
        service: Arc::new(service),
        metrics: Arc::clone(&service_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("sign-in API listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&service_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("metrics listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("wraplogin-server stopped");
    Ok(())
}

/// Queries a running instance's health endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/health", args.url.trim_end_matches('/'));
    let body = reqwest::get(&url)
        .await
        .with_context(|| format!("failed to reach {}", url))?
        .text()
        .await
        .context("failed to read health response body")?;
    println!("{}", body);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("wraplogin-server {}", env!("CARGO_PKG_VERSION"));
    println!(
        "challenge version {}",
        wraplogin_auth::config::CHALLENGE_VERSION
    );
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
