use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gateway::{router, AppState, GatewayConfig, MemoryImageStore, OpenAiBackend};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = GatewayConfig::from_env()?;

    let backend = OpenAiBackend::new(
        cfg.model_base_url.clone(),
        cfg.model_id.clone(),
        cfg.model_api_key.clone(),
        cfg.request_timeout,
    )?;
    let images = MemoryImageStore::new(cfg.image_cache_capacity, cfg.image_cache_ttl);
    let state = Arc::new(
        AppState::new(Arc::new(images), Arc::new(backend), cfg.max_candidates)
            .with_max_upload_bytes(cfg.max_upload_bytes),
    );

    let app = router(state);

    let addr = &cfg.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(model = %cfg.model_id, backend = %cfg.model_base_url, "gateway listening on http://{addr}");
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
