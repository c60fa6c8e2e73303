//! ws-relay server entry point.
//!
//! Loads configuration, initializes tracing, binds the listener and serves
//! until SIGINT/SIGTERM.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ws_relay::config::{LogFormat, RelayConfig};
use ws_relay::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RelayConfig::from_env().context("invalid LISTEN_ADDR")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }

    tracing::info!(
        addr = %config.listen_addr,
        ping_interval = ?config.ping_interval,
        write_timeout = ?config.write_timeout,
        queue_capacity = config.queue_capacity,
        "starting ws-relay"
    );

    let listener = match tokio::net::TcpListener::bind(config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %config.listen_addr, error = %e, "failed to bind listen address");
            return Err(e).context("failed to bind listen address");
        }
    };

    server::serve(listener, &config, shutdown_signal()).await
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
