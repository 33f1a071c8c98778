use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::summarize::{BackendError, PromptStyle, SummaryBackend};

/// A hosted text-generation model on the Hugging Face inference API.
pub struct HuggingFaceBackend {
    client: reqwest::Client,
    model_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_length: u32,
    temperature: f32,
    /// Text generation repeats the prompt ahead of the answer unless told not to.
    return_full_text: bool,
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

impl HuggingFaceBackend {
    pub fn new(client: reqwest::Client, model_url: &str, api_key: &str) -> Self {
        HuggingFaceBackend {
            client,
            model_url: model_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl SummaryBackend for HuggingFaceBackend {
    fn name(&self) -> &str {
        &self.model_url
    }

    fn prompt_style(&self) -> PromptStyle {
        PromptStyle::FieldList
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let request = GenerationRequest {
            inputs: prompt,
            parameters: GenerationParameters {
                max_length: 1000,
                temperature: 0.3,
                return_full_text: false,
            },
        };

        let response = self
            .client
            .post(&self.model_url)
            .bearer_auth(&self.api_key)
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

        let generations: Vec<GeneratedText> = response.json().await?;
        generations
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or(BackendError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_payload_shape() {
        let request = GenerationRequest {
            inputs: "prompt text",
            parameters: GenerationParameters {
                max_length: 1000,
                temperature: 0.3,
                return_full_text: false,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["inputs"], "prompt text");
        assert_eq!(json["parameters"]["max_length"], 1000);
        assert!(json["parameters"]["temperature"].as_f64().unwrap() > 0.29);
        assert_eq!(json["parameters"]["return_full_text"], false);
    }

    #[test]
    fn test_asks_with_field_list_prompt() {
        let backend = HuggingFaceBackend::new(reqwest::Client::new(), "https://api-inference.example/models/m", "key");
        assert_eq!(backend.prompt_style(), PromptStyle::FieldList);
    }

    #[test]
    fn test_response_shape() {
        let parsed: Vec<GeneratedText> =
            serde_json::from_str(r#"[{"generated_text": "{\"job_type\": \"remote\"}"}]"#).unwrap();
        assert_eq!(parsed[0].generated_text, r#"{"job_type": "remote"}"#);
    }
}
