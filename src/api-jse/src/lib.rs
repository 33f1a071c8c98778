pub mod errors;
pub mod routes;
pub mod state;

pub use errors::ApiError;
pub use state::{AppState, EnvPipeline, PipelineFactory};
