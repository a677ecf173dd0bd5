//! dhtnet-service - HTTP REST API over a realtime sensor store.
//!
//! Run with: `cargo run -p dhtnet-service -- --store-url <url>`

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use dhtnet_service::{AppState, Config, api};
use dhtnet_store::RtdbClient;

/// dhtnet-service - REST API for DHT sensor networks.
#[derive(Parser, Debug)]
#[command(name = "dhtnet-service")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config).
    #[arg(short, long)]
    bind: Option<String>,

    /// Realtime store base URL (overrides config).
    #[arg(short, long)]
    store_url: Option<String>,

    /// Store auth secret (overrides config).
    #[arg(long)]
    auth: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dhtnet_service=info".parse()?)
                .add_directive("dhtnet_store=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(url) = args.store_url {
        config.store.url = url;
    }
    if let Some(auth) = args.auth {
        config.store.auth = Some(auth);
    }
    config.validate()?;

    info!("Connecting to store at {}", config.store.url);
    let client = RtdbClient::new(&config.store.url, config.store.auth.clone())?;
    let state = AppState::new(Arc::new(client));

    let app = Router::new()
        .merge(api::router())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = config.server.bind.parse()?;
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
