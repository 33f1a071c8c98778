pub mod browser;
pub mod capture;
pub mod common;
pub mod errors;
pub mod navigation;
pub mod site;
pub mod summarize;
pub mod text;

// Fakes for the browser seam, shared with the worker and api crates' tests
#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use browser::{BrowserDriver, BrowserSession, BrowserSettings, JobTab, TabInfo};
pub use capture::{TabSnapshot, capture_external_tab, select_candidate};
pub use common::{ConfigError, TimeUnit, get_api_base_url, get_db_pool, is_env_set, setup_logging};
pub use errors::{BrowserError, CaptureError, FailureReason};
pub use navigation::{attempt_apply, extract_description, wait_until_visible};
pub use site::{SiteProfile, profile};
pub use summarize::{StructuredSummary, SummarizationError, Summarizer, SummaryBackend};
pub use text::normalize_description;
