//! odk-daemon entry point.
//!
//! This file is intentionally thin: it sets up tracing, loads config,
//! connects the database pool, wires middleware, and starts the HTTP
//! server. All route handlers live in `routes.rs`; shared state lives in
//! `state.rs`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use odk_daemon::{routes, state};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let config = odk_config::load_from_env().context("load config")?;
    let config_hash = odk_config::config_hash(&odk_config::effective_json(&config)?);
    info!(config_hash = %config_hash, "config loaded");

    let pool = odk_db::connect_from_env(config.db_max_connections)
        .await
        .context("connect database")?;

    // Schema must already be in place (odk-cli db migrate); fail loudly at
    // boot rather than on the first request.
    let db_status = odk_db::status(&pool).await.context("db status check")?;
    if !db_status.has_orders_table {
        anyhow::bail!("database schema missing; run `odk-cli db migrate` first");
    }

    let addr: SocketAddr = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind_addr '{}'", config.bind_addr))?;

    let shared = Arc::new(state::AppState::new(pool, config));

    let app = routes::build_router(Arc::clone(&shared))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_localhost_only());

    info!("odk-daemon listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .await
        .context("server crashed")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// CORS: allow only localhost origins.
fn cors_localhost_only() -> CorsLayer {
    let allowed_origins = [
        "http://localhost",
        "http://127.0.0.1",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ];

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(tower_http::cors::Any)
}
