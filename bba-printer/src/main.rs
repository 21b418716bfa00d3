//! Best Bid/Ask Printer
//!
//! Streams Coinbase Prime level-2 data and logs the top of book for every
//! configured product until Ctrl-C or a fatal feed error.

use std::process::ExitCode;

use anyhow::Context;
use bba_core::{format_top_of_book, FeedResult};
use bba_prime::{ConnectionSupervisor, FeedConfig, FeedUpdate, Shutdown, WsTransport};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log a config error once; the caller exits without reporting it again
fn load_config(loaded: FeedResult<FeedConfig>) -> Option<FeedConfig> {
    match loaded {
        Ok(config) => Some(config),
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables from .env.local file
    if let Err(e) = dotenvy::from_filename(".env.local") {
        // Not an error if the file doesn't exist
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env.local: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,bba_prime=info")),
        )
        .init();

    info!("Starting Best Bid/Ask Printer");

    let Some(config) = load_config(FeedConfig::from_env()) else {
        return Ok(ExitCode::FAILURE);
    };
    info!(
        "Streaming {} for {}",
        config.channel,
        config.product_ids.join(", ")
    );

    let shutdown = Shutdown::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C");
                    shutdown.trigger();
                }
                Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
            }
        }
    });

    let (supervisor, mut updates) =
        ConnectionSupervisor::new(config, WsTransport::new(), shutdown);

    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            match update {
                FeedUpdate::TopOfBook { instrument_id, top } => {
                    info!("{}", format_top_of_book(&instrument_id, &top));
                }
                FeedUpdate::ConnectionState(phase) => {
                    debug!("Connection phase: {:?}", phase);
                }
            }
        }
    });

    let result = supervisor.run().await;
    // The supervisor owned the only sender, so the printer drains and exits.
    printer.await.context("Printer task failed")?;

    match result {
        Ok(()) => {
            info!("Shutdown complete");
            Ok(ExitCode::SUCCESS)
        }
        // Already logged by the supervisor
        Err(_) => Ok(ExitCode::FAILURE),
    }
}
