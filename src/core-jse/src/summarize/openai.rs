use std::time::Duration;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;

use crate::summarize::{BackendError, SummaryBackend};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Chat-completion model on the OpenAI API.
pub struct OpenAiBackend {
    client: Client<OpenAIConfig>,
    model: String,
    timeout: Duration,
    name: String,
}

impl OpenAiBackend {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        OpenAiBackend {
            client: Client::with_config(config),
            model: model.to_string(),
            timeout,
            name: format!("openai:{}", model),
        }
    }
}

#[async_trait]
impl SummaryBackend for OpenAiBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(0.3)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content("You extract structured data from job postings and answer with JSON only.")
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = tokio::time::timeout(self.timeout, self.client.chat().create(request))
            .await
            .map_err(|_| BackendError::Timeout(self.timeout))??;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(BackendError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::common::is_env_set;

    #[tokio::test]
    async fn test_generate_with_live_api() {
        if is_env_set("OPENAI_API_KEY") {
            let key = std::env::var("OPENAI_API_KEY").unwrap();
            let backend = OpenAiBackend::new(&key, DEFAULT_OPENAI_MODEL, Duration::from_secs(60));
            let output = backend
                .generate("Return the JSON {\"job_type\": \"remote\", \"skills\": [\"Go\"], \"description\": \"x\"}")
                .await
                .unwrap();
            assert!(output.contains('{'), "Expected JSON in response: {}", output);
        } else {
            println!("[SKIP] OPENAI_API_KEY is not set");
        }
    }
}
