pub mod errors;
pub mod work;

pub use errors::Error;

pub use work::{JobOutcome, JobStage, PipelineContext, RunSummary, process_job, record_outcome, run_site};
