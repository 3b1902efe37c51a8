//! Parlance server binary — entry point for the voice relay.
//!
//! Starts an axum HTTP server with structured logging, pre-generated
//! fallback audio, and graceful shutdown on SIGTERM/SIGINT.

use parlance_server::{app, config, AppState};
use parlance_voice::{HistoryStore, HttpLlm, HttpStt, HttpTts, TurnPipeline};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("PARLANCE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    // Load configuration
    let config = config::load_config(selected_config_path)
        .expect("failed to load configuration — the server cannot start without valid config");

    // Initialize tracing
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    // Media directory must exist before the pipeline writes clips into it
    // and before ServeDir is mounted over it.
    std::fs::create_dir_all(&config.media.dir)
        .expect("failed to create media directory — check media.dir in config");

    // Build the adapters and the turn pipeline
    let client = reqwest::Client::new();
    let pipeline = TurnPipeline::new(
        Arc::new(HttpStt::new(client.clone(), config.voice.stt.clone())),
        Arc::new(HttpLlm::new(client.clone(), config.voice.llm.clone())),
        Arc::new(HttpTts::new(client, config.voice.tts.clone())),
        HistoryStore::new(),
        &config.media.dir,
    );

    // Cache the fallback clip so the degraded synthesis path never needs a
    // live engine call.
    if let Err(e) = pipeline.ensure_fallback_audio().await {
        tracing::warn!("could not cache fallback audio: {}", e);
    }

    // Build application
    let state = AppState {
        pipeline: Arc::new(pipeline),
        media_dir: config.media.dir.clone(),
    };
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, "starting parlance server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address — is another process using this port?");

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("parlance server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
