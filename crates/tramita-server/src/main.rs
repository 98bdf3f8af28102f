//! Tramita — RAG query service for municipal-procedure documents.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

mod routes;
mod state;

use state::AppState;

fn resolve_data_dir() -> PathBuf {
    std::env::var("TRAMITA_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let data_dir = resolve_data_dir();
    info!("Data directory: {}", data_dir.display());

    let config = tramita_core::TramitaConfig::from_env(&data_dir)?;
    let port = config.port;

    let store = tramita_store::SqliteStore::open(&config.data_dir, config.embedding_dim)
        .map_err(|e| anyhow::anyhow!("Failed to open store: {e}"))?;
    let store = Arc::new(store);

    let http_client = reqwest::Client::new();
    let embeddings = Arc::new(tramita_ai::GeminiEmbeddings::new(
        http_client.clone(),
        config.gemini_api_key.clone(),
        config.embedding_model.clone(),
    ));
    let chat = Arc::new(tramita_ai::GeminiChat::new(
        http_client,
        config.gemini_api_key.clone(),
        config.chat_model.clone(),
    ));

    let state = Arc::new(AppState::new(config, store, embeddings, chat));

    let app = routes::build_router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Tramita server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
