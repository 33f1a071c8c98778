use axum::extract::{Json, Path, State};
use data_model_jse::Site;
use data_model_jse::models::{ApplicationLink, FailedJob, JobDescriptionResponse, JobLink};

use crate::errors::ApiError;
use crate::state::AppState;

/// GET /api/{site}/application_links - Captured external application URLs
pub async fn get_application_links(
    State(state): State<AppState>,
    Path(site): Path<String>,
) -> Result<Json<Vec<ApplicationLink>>, ApiError> {
    let site: Site = site.parse()?;
    Ok(Json(state.store.list_application_links(site).await?))
}

/// GET /api/{site}/descriptions - Stored descriptions, skills as a list
pub async fn get_descriptions(
    State(state): State<AppState>,
    Path(site): Path<String>,
) -> Result<Json<Vec<JobDescriptionResponse>>, ApiError> {
    let site: Site = site.parse()?;
    let descriptions = state.store.list_descriptions(site).await?;
    Ok(Json(descriptions.into_iter().map(JobDescriptionResponse::from).collect()))
}

/// GET /api/{site}/failed_jobs
pub async fn get_failed_jobs(
    State(state): State<AppState>,
    Path(site): Path<String>,
) -> Result<Json<Vec<FailedJob>>, ApiError> {
    let site: Site = site.parse()?;
    Ok(Json(state.store.list_failed_jobs(site).await?))
}

/// GET /api/{site}/jobs - Every job link of the site, processed or not
pub async fn get_jobs(State(state): State<AppState>, Path(site): Path<String>) -> Result<Json<Vec<JobLink>>, ApiError> {
    let site: Site = site.parse()?;
    Ok(Json(state.store.list_jobs(site).await?))
}
