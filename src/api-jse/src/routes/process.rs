use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use data_model_jse::Site;
use serde::{Deserialize, Serialize};
use worker_jse::{RunSummary, run_site};

use crate::errors::ApiError;
use crate::state::AppState;

pub const PROCESSED_MESSAGE: &str = "Job links processed successfully";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub message: String,
    #[serde(flatten)]
    pub summary: RunSummary,
}

/// POST /api/{site}/process - Run every unprocessed job of the site
///
/// Answers 200 however many jobs failed. The run continues on its own task if the
/// client goes away, so no job is left half recorded.
pub async fn post_process(
    State(state): State<AppState>,
    Path(site): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let site: Site = site.parse()?;
    let guard = state
        .run_lock
        .clone()
        .try_lock_owned()
        .map_err(|_| ApiError::RunInProgress)?;

    tracing::info!("Starting run for {}", site);
    let run = tokio::spawn(async move {
        let _guard = guard;
        let ctx = state.pipeline.connect(state.store.clone()).await?;
        run_site(Arc::new(ctx), site).await
    });

    let summary = run.await.map_err(|e| ApiError::RunAborted(e.to_string()))??;
    Ok((
        StatusCode::OK,
        Json(ProcessResponse {
            message: PROCESSED_MESSAGE.to_string(),
            summary,
        }),
    ))
}
