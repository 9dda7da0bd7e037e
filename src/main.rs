#![cfg_attr(not(test), deny(clippy::panic))]

use std::net::SocketAddr;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use slidebot_server::api;
use slidebot_server::config::Config;
use slidebot_server::logging;
use slidebot_server::server::{maintenance, GameServer, ServerConfig};

/// Slidebot -- realtime room server for a sliding-robot puzzle game
#[derive(Parser, Debug)]
#[command(name = "slidebot-server")]
#[command(about = "An in-memory realtime room server for a sliding-robot puzzle game")]
#[command(version)]
struct Cli {
    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines and pre-deployment checks.
    #[arg(long, short = 'c', conflicts_with = "print_config")]
    validate_config: bool,

    /// Print the loaded configuration to stdout (as JSON) and exit.
    /// Useful for debugging configuration loading from multiple sources.
    #[arg(long, conflicts_with = "validate_config")]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration from config.json if present, then env overrides.
    let cfg = Config::load();

    if cli.print_config {
        let json = serde_json::to_string_pretty(&cfg)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    if cli.validate_config {
        println!("Configuration loaded");
        println!();
        println!("Configuration summary:");
        println!("  Port: {}", cfg.port);
        println!("  Data file: {}", cfg.data_file.display());
        println!("  Allowed origins: {}", cfg.allowed_origins.join(", "));
        println!("  Allow same host: {}", cfg.allow_same_host);
        println!("  Auto-save interval: {}s", cfg.auto_save_interval);
        println!("  Cleanup interval: {}s", cfg.cleanup_interval);
        println!("  Room max age: {}s", cfg.room_max_age);
        println!(
            "  Disconnect grace period: {}s",
            cfg.disconnect_grace_period
        );
        return Ok(());
    }

    logging::init_with_config(&cfg.logging);

    let server = GameServer::new(ServerConfig {
        disconnect_grace_period: cfg.disconnect_grace_period(),
        room_max_age: cfg.room_max_age(),
    });

    match server.load_snapshot(&cfg.data_file).await {
        Ok(0) => tracing::info!("No snapshot found, starting empty"),
        Ok(count) => tracing::info!(rooms = count, "Restored rooms from snapshot"),
        Err(err) => {
            tracing::warn!(
                path = %cfg.data_file.display(),
                error = %err,
                "Failed to load snapshot, starting empty"
            );
        }
    }

    // Background maintenance: periodic snapshots and stale-room cleanup.
    let shutdown = CancellationToken::new();
    let autosave = tokio::spawn(maintenance::autosave_task(
        server.clone(),
        cfg.data_file.clone(),
        cfg.auto_save_interval(),
        shutdown.clone(),
    ));
    let cleanup = tokio::spawn(maintenance::cleanup_task(
        server.clone(),
        cfg.cleanup_interval(),
        shutdown.clone(),
    ));

    let app = api::create_router(server.clone(), &cfg);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        %addr,
        "Server started - RPC under /v1/rooms, push channel at /v1/ws"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Shutdown: stop background tasks, then snapshot, stop timers, close
    // subscribers.
    shutdown.cancel();
    let _ = autosave.await;
    let _ = cleanup.await;
    server.shutdown(&cfg.data_file).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
