use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::summarize::{BackendError, SummaryBackend};

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "mistral";

/// A model served by a local Ollama daemon.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaBackend {
    pub fn new(client: reqwest::Client, base_url: &str, model: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        OllamaBackend {
            client,
            name: format!("ollama:{}@{}", model, base_url),
            base_url,
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl SummaryBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let generated: GenerateResponse = response.json().await?;
        Ok(generated.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_is_not_streamed() {
        let request = GenerateRequest {
            model: DEFAULT_OLLAMA_MODEL,
            prompt: "p",
            stream: false,
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"model":"mistral","prompt":"p","stream":false}"#
        );
    }

    #[test]
    fn test_name_includes_model_and_url() {
        let backend = OllamaBackend::new(reqwest::Client::new(), "http://localhost:11434/", "mistral");
        assert_eq!(backend.name(), "ollama:mistral@http://localhost:11434");
    }
}
