use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use data_model_jse::{StoreError, UnknownSite};

/// Errors answered as plain text. Per-job failures never surface here, only in `failed_jobs`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    UnknownSite(#[from] UnknownSite),
    #[error("A run is already in progress")]
    RunInProgress,
    #[error("Run failed: {0}")]
    Run(#[from] worker_jse::Error),
    #[error("Run aborted: {0}")]
    RunAborted(String),
    #[error("{0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::UnknownSite(_) => StatusCode::NOT_FOUND,
            ApiError::RunInProgress => StatusCode::CONFLICT,
            ApiError::Run(_) | ApiError::RunAborted(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("{}", self);
        }
        (status, self.to_string()).into_response()
    }
}
