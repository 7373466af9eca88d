use std::sync::Arc;

use tokio::io::AsyncBufReadExt;
use tracing::info;

use classic_server::{Server, ServerConfig};

#[tokio::main]
async fn main() {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "server.toml".into());
    let config = match ServerConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "classic-rs v{} starting on {}:{}",
        env!("CARGO_PKG_VERSION"),
        config.server.address,
        config.server.port
    );
    info!("Name: {}", config.server.name);
    info!("MOTD: {}", config.server.motd);
    info!("Max players: {}", config.server.max_players);
    info!(
        "World: {} ({}x{}x{})",
        config.world.name, config.world.width, config.world.height, config.world.depth
    );

    let server = match Server::new(config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Startup failed: {e}");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    // Handle Ctrl+C
    let shutdown_tx_ctrlc = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown signal received");
        let _ = shutdown_tx_ctrlc.send(true);
    });

    // Console: read commands from stdin
    let console_server = server.clone();
    let console_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if !console_server.handle_console(&line, &console_shutdown) {
                break;
            }
        }
    });

    if let Err(e) = server.run(shutdown_rx).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
    info!("Server shut down.");
}
