//! Shared setup for the orchestrator tests: an in-memory store, a fake browser and
//! mock summarization backends wired into a `PipelineContext`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use core_jse::summarize::mock::MockSummaryBackend;
use core_jse::testing::{FakeBrowser, FakePage};
use core_jse::{BrowserSettings, Summarizer, profile};
use data_model_jse::Site;
use data_model_jse::models::JobLink;
use data_model_jse::test_helpers::MemoryLinkStore;
use worker_jse::PipelineContext;

pub const SUMMARY_JSON: &str = r#"{"job_type":"remote","skills":["Go","SQL"],"description":"Great role"}"#;

pub fn linkedin_job(id: &str, title: &str, link: &str) -> JobLink {
    JobLink::with_id(id, Site::LinkedIn, title, link)
}

/// A LinkedIn posting with the given description and a visible apply button.
pub fn posting(description: &str) -> FakePage {
    let linkedin = profile(Site::LinkedIn);
    FakePage::new()
        .with_element(linkedin.container_selector, description)
        .with_element(linkedin.apply_selector, "Apply")
}

/// No settle pauses, and a short job timeout so hanging pages fail fast.
pub fn fast_settings() -> BrowserSettings {
    BrowserSettings {
        job_timeout: Duration::from_millis(500),
        connect_timeout: Duration::from_millis(500),
        settle_delay: Some(Duration::ZERO),
        apply_settle: Some(Duration::ZERO),
        ..Default::default()
    }
}

pub fn summarizer_with(backend: MockSummaryBackend) -> Summarizer {
    Summarizer::default().with_backend(backend)
}

pub fn context(store: &Arc<MemoryLinkStore>, browser: &FakeBrowser, summarizer: Summarizer) -> Arc<PipelineContext> {
    Arc::new(PipelineContext {
        store: store.clone(),
        browser: Arc::new(browser.clone()),
        summarizer: Arc::new(summarizer),
        settings: fast_settings(),
    })
}
