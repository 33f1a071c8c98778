//! Turns a normalized job description into a `StructuredSummary` using hosted or
//! local text models, trying each configured backend in order.

pub mod huggingface;
#[cfg(any(test, feature = "test-helpers"))]
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod parse;
pub mod prompts;

use std::time::Duration;

use async_trait::async_trait;

use crate::common::{ConfigError, TimeUnit, env_duration, env_opt, env_or};

pub use huggingface::HuggingFaceBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use parse::{SkillsField, StructuredSummary, fallback_summary, json_block, parse_summary};
pub use prompts::{PromptStyle, prompt_list_job_fields, prompt_summarize_job_posting};

/// Numbered env vars HF_MODEL_1 ..= HF_MODEL_10 each name one model endpoint.
const MAX_HF_MODELS: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Backend answered with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Backend returned no generated text")]
    EmptyResponse,
    #[error("Backend output has no recognizable summary")]
    Unstructured,
    #[error("No answer within {0:?}")]
    Timeout(Duration),
    #[error("OpenAI API error: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SummarizationError {
    #[error("All {attempted} summarization backends failed")]
    Exhausted { attempted: usize },
    #[error("Failed to create prompt: {0}")]
    PromptCreationFailure(#[from] subst::Error),
}

/// Interface to a text model that completes a prompt.
#[async_trait]
pub trait SummaryBackend: Send + Sync {
    /// Identifies the backend in logs.
    fn name(&self) -> &str;

    fn prompt_style(&self) -> PromptStyle {
        PromptStyle::Template
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

/// An ordered list of backends, tried until one produces a usable summary.
#[derive(Default)]
pub struct Summarizer {
    backends: Vec<Box<dyn SummaryBackend>>,
}

impl Summarizer {
    pub fn new(backends: Vec<Box<dyn SummaryBackend>>) -> Self {
        Summarizer { backends }
    }

    pub fn with_backend(mut self, backend: impl SummaryBackend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Builds the backend list from the environment, in this order:
    /// HF_MODEL_1..HF_MODEL_10 (sharing HF_API_KEY), then Ollama when OLLAMA_URL or
    /// OLLAMA_MODEL is set, then OpenAI when OPENAI_API_KEY is set.
    /// All HTTP backends share one client bounded by SUMMARIZER_TIMEOUT_SECS.
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout = env_duration(TimeUnit::Seconds, "SUMMARIZER_TIMEOUT_SECS", 60)?;
        let client = summarizer_http_client(timeout)?;

        let mut summarizer = Summarizer::default();

        let hf_key = env_or("HF_API_KEY", "");
        for i in 1..=MAX_HF_MODELS {
            if let Some(model_url) = env_opt(&format!("HF_MODEL_{}", i)) {
                summarizer = summarizer.with_backend(HuggingFaceBackend::new(client.clone(), &model_url, &hf_key));
            }
        }

        if env_opt("OLLAMA_URL").is_some() || env_opt("OLLAMA_MODEL").is_some() {
            summarizer = summarizer.with_backend(OllamaBackend::new(
                client.clone(),
                &env_or("OLLAMA_URL", ollama::DEFAULT_OLLAMA_URL),
                &env_or("OLLAMA_MODEL", ollama::DEFAULT_OLLAMA_MODEL),
            ));
        }

        if let Some(api_key) = env_opt("OPENAI_API_KEY") {
            summarizer = summarizer.with_backend(OpenAiBackend::new(
                &api_key,
                &env_or("OPENAI_MODEL", openai::DEFAULT_OPENAI_MODEL),
                timeout,
            ));
        }

        if summarizer.is_empty() {
            tracing::warn!("No summarization backends configured: descriptions will be stored unsummarized");
        } else {
            tracing::info!("Summarization backends: {:?}", summarizer.backend_names());
        }
        Ok(summarizer)
    }

    /// Summarizes a normalized job description.
    /// A backend whose output is empty or has no recognizable summary counts as failed.
    pub async fn summarize(&self, text: &str) -> Result<StructuredSummary, SummarizationError> {
        let template = PromptStyle::Template.prompt(text)?;
        let field_list = PromptStyle::FieldList.prompt(text)?;

        for backend in &self.backends {
            let prompt = match backend.prompt_style() {
                PromptStyle::Template => &template,
                PromptStyle::FieldList => &field_list,
            };
            match self.try_backend(backend.as_ref(), prompt).await {
                Ok(summary) => {
                    tracing::debug!("Summarized with {}", backend.name());
                    return Ok(summary);
                }
                Err(e) => tracing::warn!("Summarization with {} failed: {}", backend.name(), e),
            }
        }

        Err(SummarizationError::Exhausted {
            attempted: self.backends.len(),
        })
    }

    /// Only the text after an echoed prompt is the model's answer.
    async fn try_backend(&self, backend: &dyn SummaryBackend, prompt: &str) -> Result<StructuredSummary, BackendError> {
        let output = backend.generate(prompt).await?;
        let answer = output.strip_prefix(prompt).unwrap_or(&output);
        if answer.trim().is_empty() {
            return Err(BackendError::EmptyResponse);
        }
        parse_summary(answer).ok_or(BackendError::Unstructured)
    }
}

/// HTTP client for summarization calls. Its timeout is independent of the browser's.
pub fn summarizer_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::mock::MockSummaryBackend;
    use data_model_jse::models::JobType;

    const GOOD: &str = r#"{"job_type":"remote","skills":["Go","SQL"],"description":"Great role"}"#;

    #[tokio::test]
    async fn test_first_working_backend_wins() {
        let summarizer = Summarizer::default()
            .with_backend(MockSummaryBackend::with_failure())
            .with_backend(MockSummaryBackend::with_default(""))
            .with_backend(MockSummaryBackend::with_default("no structure here"))
            .with_backend(MockSummaryBackend::with_default(GOOD))
            .with_backend(MockSummaryBackend::with_default(r#"{"job_type":"hybrid"}"#));

        let summary = summarizer.summarize("Great role. Apply now.").await.unwrap();
        assert_eq!(summary.job_type, JobType::Remote);
        assert_eq!(summary.skills, vec!["Go", "SQL"]);
        assert_eq!(summary.description, "Great role");
    }

    #[tokio::test]
    async fn test_all_backends_exhausted() {
        let summarizer = Summarizer::default()
            .with_backend(MockSummaryBackend::with_failure())
            .with_backend(MockSummaryBackend::with_failure());

        match summarizer.summarize("text").await {
            Err(SummarizationError::Exhausted { attempted }) => assert_eq!(attempted, 2),
            other => panic!("Expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_backends_is_exhausted() {
        let summarizer = Summarizer::default();
        assert!(matches!(
            summarizer.summarize("text").await,
            Err(SummarizationError::Exhausted { attempted: 0 })
        ));
    }

    #[tokio::test]
    async fn test_echoed_prompt_is_not_taken_for_a_summary() {
        let summarizer = Summarizer::default().with_backend(MockSummaryBackend::echoing(""));
        assert!(matches!(
            summarizer.summarize("Great role. Apply now.").await,
            Err(SummarizationError::Exhausted { attempted: 1 })
        ));
    }

    #[tokio::test]
    async fn test_answer_after_echoed_prompt_is_parsed() {
        for style in [PromptStyle::Template, PromptStyle::FieldList] {
            let backend = MockSummaryBackend::echoing(&format!("\n{}", GOOD)).with_prompt_style(style);
            let summarizer = Summarizer::default().with_backend(backend);

            let summary = summarizer.summarize("Great role. Apply now.").await.unwrap();
            assert_eq!(summary.job_type, JobType::Remote);
            assert_eq!(summary.skills, vec!["Go", "SQL"]);
            assert_eq!(summary.description, "Great role");
        }
    }

    #[tokio::test]
    async fn test_backend_gets_the_prompt_it_asks_for() {
        let field_list = MockSummaryBackend::with_response("job_type (remote", GOOD).with_prompt_style(PromptStyle::FieldList);
        let summarizer = Summarizer::default().with_backend(field_list);
        assert!(summarizer.summarize("Great role").await.is_ok());

        let summarizer = Summarizer::default().with_backend(MockSummaryBackend::with_response("job_type (remote", GOOD));
        assert!(summarizer.summarize("Great role").await.is_err());
    }

    #[tokio::test]
    async fn test_backend_receives_prompt_with_posting() {
        let summarizer =
            Summarizer::default().with_backend(MockSummaryBackend::with_response("Distributed systems role", GOOD));
        assert!(summarizer.summarize("Distributed systems role").await.is_ok());
        assert!(summarizer.summarize("Something else").await.is_err());
    }
}
