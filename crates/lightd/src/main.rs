use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use lightd::Config;
use lightd::Engine;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Home lighting daemon for MagicLight BLE bulbs and RESTful lights
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "lightd.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(config.logging.targets())
        .init();

    tracing::info!("lightd starting");
    tracing::info!("Loaded config from: {}", args.config.display());

    let mut engine = Engine::new();
    engine.setup_from_config(&config).await;
    let engine = Arc::new(engine);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let api = if config.api.enabled {
        let engine = engine.clone();
        let listen = config.api.listen.clone();
        let port = config.api.port;
        Some(tokio::spawn(async move {
            if let Err(e) = lightd::api::serve(&listen, port, engine, shutdown_rx).await {
                tracing::error!("HTTP API server failed: {:#}", e);
            }
        }))
    } else {
        tracing::info!("HTTP API disabled");
        None
    };

    engine
        .run(config.engine.poll_interval(), async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received shutdown signal"),
                Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
            }
        })
        .await;

    if let Some(api) = api {
        let _ = shutdown_tx.send(());
        if let Err(e) = api.await {
            tracing::error!("HTTP API task failed: {}", e);
        }
    }

    tracing::info!("lightd shutdown complete");

    Ok(())
}
