use std::sync::Arc;

use axum::http::HeaderValue;
use core_jse::common::env_or;
use core_jse::{get_api_base_url, get_db_pool, setup_logging};
use data_model_jse::PgLinkStore;

use api_jse::routes::{self, DEFAULT_CORS_ORIGIN};
use api_jse::{AppState, EnvPipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    setup_logging("api_jse=debug,worker_jse=debug,core_jse=debug,tower_http=debug");

    let pool = get_db_pool().await?;
    let state = AppState::new(Arc::new(PgLinkStore::new(pool)), Arc::new(EnvPipeline));

    let cors_origin: HeaderValue = env_or("CORS_ALLOWED_ORIGIN", DEFAULT_CORS_ORIGIN).parse()?;
    let app = routes::router(cors_origin).with_state(state);

    let addr = get_api_base_url()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
