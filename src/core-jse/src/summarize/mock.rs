//! Mock summarization backend for testing
//!
//! Returns canned model output, or fails, without making any network calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::summarize::{BackendError, PromptStyle, SummaryBackend};

/// Mock summarization backend
///
/// Can be configured to:
/// - Return specific output when the prompt contains a given text
/// - Return a default output for any prompt
/// - Simulate backend failures
/// - Repeat the prompt ahead of its answer, like a completion endpoint
pub struct MockSummaryBackend {
    /// Prompt substrings mapped to outputs
    responses: HashMap<String, String>,
    default_response: Option<String>,
    should_fail: bool,
    echo_prompt: bool,
    prompt_style: PromptStyle,
    calls: AtomicUsize,
}

impl MockSummaryBackend {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            default_response: None,
            should_fail: false,
            echo_prompt: false,
            prompt_style: PromptStyle::Template,
            calls: AtomicUsize::new(0),
        }
    }

    /// Output `response` when the prompt contains `prompt_contains`
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut backend = Self::new();
        backend.add_response(prompt_contains, response);
        backend
    }

    pub fn with_responses(responses: Vec<(&str, &str)>) -> Self {
        let mut backend = Self::new();
        for (prompt_part, response) in responses {
            backend.add_response(prompt_part, response);
        }
        backend
    }

    /// Output `response` for any prompt
    pub fn with_default(response: &str) -> Self {
        let mut backend = Self::new();
        backend.set_default(response);
        backend
    }

    /// Always fail
    pub fn with_failure() -> Self {
        let mut backend = Self::new();
        backend.set_should_fail(true);
        backend
    }

    /// Output the prompt followed by `answer`
    pub fn echoing(answer: &str) -> Self {
        let mut backend = Self::with_default(answer);
        backend.echo_prompt = true;
        backend
    }

    pub fn with_prompt_style(mut self, style: PromptStyle) -> Self {
        self.prompt_style = style;
        self
    }

    /// Output a well-formed remote Go/SQL summary
    pub fn with_valid_summary() -> Self {
        Self::with_default(sample_summary_json())
    }

    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses.insert(prompt_contains.to_string(), response.to_string());
    }

    pub fn set_default(&mut self, response: &str) {
        self.default_response = Some(response.to_string());
    }

    pub fn set_should_fail(&mut self, should_fail: bool) {
        self.should_fail = should_fail;
    }

    /// Number of `generate` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSummaryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SummaryBackend for MockSummaryBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn prompt_style(&self) -> PromptStyle {
        self.prompt_style
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.should_fail {
            return Err(BackendError::Other("Mock backend configured to fail".to_string()));
        }

        if self.echo_prompt {
            return Ok(format!("{}{}", prompt, self.default_response.as_deref().unwrap_or_default()));
        }

        for (key, response) in &self.responses {
            if prompt.contains(key) {
                return Ok(response.clone());
            }
        }

        self.default_response
            .clone()
            .ok_or_else(|| BackendError::Other("Mock backend has no response configured for this prompt".to_string()))
    }
}

//
// Test Fixtures
//

/// Model output wrapping a complete summary in chatter
pub fn sample_summary_json() -> &'static str {
    r#"Here is the summary:
{"job_type": "remote", "skills": ["Go", "SQL"], "description": "Great role"}"#
}

/// Model output using the line markers instead of JSON
pub fn sample_marker_summary() -> &'static str {
    "Job Type: Hybrid\nSkills Required: Rust, Tokio\nDescription: Build backend services."
}

/// Model output with nothing to extract
pub fn sample_unstructured_output() -> &'static str {
    "I'm sorry, I can't summarize this posting."
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarize::parse_summary;

    #[tokio::test]
    async fn test_response_by_prompt_content() {
        let backend = MockSummaryBackend::with_responses(vec![("alpha", "A"), ("beta", "B")]);
        assert_eq!(backend.generate("prompt about alpha").await.unwrap(), "A");
        assert_eq!(backend.generate("prompt about beta").await.unwrap(), "B");
        assert!(backend.generate("prompt about gamma").await.is_err());
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_toggle() {
        let mut backend = MockSummaryBackend::with_default("ok");
        backend.set_should_fail(true);
        assert!(backend.generate("x").await.is_err());
        backend.set_should_fail(false);
        assert_eq!(backend.generate("x").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_echoing_repeats_prompt() {
        let backend = MockSummaryBackend::echoing(" answer");
        assert_eq!(backend.generate("question").await.unwrap(), "question answer");
    }

    #[test]
    fn test_fixtures_parse_as_intended() {
        assert!(parse_summary(sample_summary_json()).is_some());
        assert!(parse_summary(sample_marker_summary()).is_some());
        assert!(parse_summary(sample_unstructured_output()).is_none());
    }
}
