// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Dominique Chuo

// Event bus server binary.
//
// Wires the ambient collaborators (config loading, logging) together
// with the core subsystems (storage, bus, router, connection server) and
// runs until SIGINT/SIGTERM, then drives the two-phase shutdown.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use eventbus_auth::CredentialStore;
use eventbus_bus::Bus;
use eventbus_config::FileConfig;
use eventbus_router::Router;
use eventbus_server::{Server, ServerSettings};
use eventbus_storage::MemoryStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "eventbus-server")]
#[command(about = "Single-node event bus: durable streams of JSON events over newline-delimited TCP")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long = "config", default_value = "config/config.yaml")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match FileConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("could not load config from {}: {err}", cli.config.display());
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config);

    let store = Arc::new(MemoryStore::open());
    let bus = Arc::new(Bus::new(store.clone()));
    if let Err(err) = bus.init() {
        error!(error = %err, "could not initialize bus from store");
        return ExitCode::FAILURE;
    }

    let credentials = Arc::new(CredentialStore::new(config.credentials()));
    let router = Arc::new(Router::new(bus, credentials));

    let settings =
        ServerSettings { addr: config.bind_addr().to_string(), accept_deadline: config.accept_deadline() };
    let server = match Server::listen_and_serve(settings, router, store) {
        Ok(server) => server,
        Err(err) => {
            error!(error = %err, addr = config.bind_addr(), "could not bind event bus server");
            return ExitCode::FAILURE;
        }
    };

    wait_for_shutdown_signal();
    info!("shutdown signal received, stopping the event bus server");

    match server.stop() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "error while shutting down");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(config: &FileConfig) {
    for sink in &config.logger.output {
        if sink != "stdout" {
            eprintln!("unsupported logger output '{sink}', only 'stdout' is implemented");
        }
    }
    let filter = EnvFilter::try_new(&config.logger.level).unwrap_or_else(|_| EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Blocks until SIGINT, or (on unix) SIGTERM, is received.
///
/// Hosted on a small single-threaded tokio runtime used for nothing
/// else: the accept loop and connection handlers run on plain OS
/// threads, per the rest of this binary's concurrency model.
fn wait_for_shutdown_signal() {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(error = %err, "could not start signal-handling runtime");
            return;
        }
    };

    runtime.block_on(async {
        #[cfg(unix)]
        {
            let sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate());
            match sigterm {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
    });
}
