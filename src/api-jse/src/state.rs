use std::sync::Arc;

use async_trait::async_trait;
use data_model_jse::LinkStore;
use tokio::sync::Mutex;
use worker_jse::PipelineContext;

/// Builds the context of one orchestrator run.
#[async_trait]
pub trait PipelineFactory: Send + Sync {
    async fn connect(&self, store: Arc<dyn LinkStore>) -> Result<PipelineContext, worker_jse::Error>;
}

/// Connects to the browser and configures summarization from the environment, once per run.
pub struct EnvPipeline;

#[async_trait]
impl PipelineFactory for EnvPipeline {
    async fn connect(&self, store: Arc<dyn LinkStore>) -> Result<PipelineContext, worker_jse::Error> {
        PipelineContext::connect(store).await
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LinkStore>,
    pub pipeline: Arc<dyn PipelineFactory>,
    /// Held for the whole of a run: there is one browser, so one run at a time.
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: Arc<dyn LinkStore>, pipeline: Arc<dyn PipelineFactory>) -> Self {
        AppState {
            store,
            pipeline,
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}
