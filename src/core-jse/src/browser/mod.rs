//! The remote browser: one long-lived DevTools connection, one tab per job.

pub mod debugger;
pub mod process;
pub mod session;

use std::time::Duration;

use async_trait::async_trait;

use crate::common::{ConfigError, TimeUnit, env_duration, env_duration_opt, env_or};
use crate::errors::BrowserError;
use crate::site::SiteProfile;

pub use debugger::wait_for_debugger;
pub use process::{BrowserProcess, LaunchOptions};
pub use session::{BrowserSession, JobContext};

pub const DEFAULT_DEBUG_URL: &str = "http://localhost:9222";

/// A browser target as reported by `Target.getTargets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabInfo {
    pub id: String,
    pub url: String,
    /// Target type: `page`, `service_worker`, `background_page`, ...
    pub kind: String,
}

impl TabInfo {
    pub fn is_page(&self) -> bool {
        self.kind == "page"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSettings {
    /// Base URL of the DevTools HTTP endpoint.
    pub endpoint: String,
    /// Budget shared by all of a job's browser work. Summarizing does not count against
    /// it; that call is bounded by its own client timeout.
    pub job_timeout: Duration,
    /// Bound on connecting to the browser and on opening a job's tab.
    pub connect_timeout: Duration,
    /// Overrides the site's post-navigation pause.
    pub settle_delay: Option<Duration>,
    /// Overrides the site's post-click pause.
    pub apply_settle: Option<Duration>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        BrowserSettings {
            endpoint: DEFAULT_DEBUG_URL.to_string(),
            job_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            settle_delay: None,
            apply_settle: None,
        }
    }
}

impl BrowserSettings {
    /// Reads BROWSER_DEBUG_URL, JOB_TIMEOUT_SECS, BROWSER_CONNECT_TIMEOUT_SECS,
    /// PAGE_SETTLE_MS and APPLY_SETTLE_MS.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(BrowserSettings {
            endpoint: env_or("BROWSER_DEBUG_URL", DEFAULT_DEBUG_URL)
                .trim_end_matches('/')
                .to_string(),
            job_timeout: env_duration(TimeUnit::Seconds, "JOB_TIMEOUT_SECS", 30)?,
            connect_timeout: env_duration(TimeUnit::Seconds, "BROWSER_CONNECT_TIMEOUT_SECS", 10)?,
            settle_delay: env_duration_opt(TimeUnit::Milliseconds, "PAGE_SETTLE_MS")?,
            apply_settle: env_duration_opt(TimeUnit::Milliseconds, "APPLY_SETTLE_MS")?,
        })
    }

    pub fn settle_delay_for(&self, profile: &SiteProfile) -> Duration {
        self.settle_delay.unwrap_or(profile.settle_delay)
    }

    pub fn apply_settle_for(&self, profile: &SiteProfile) -> Duration {
        self.apply_settle.unwrap_or(profile.apply_settle)
    }
}

/// The shared browser session, from the orchestrator's point of view.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Fails when the shared connection is gone. Every later job would fail too.
    async fn check_health(&self) -> Result<(), BrowserError>;

    /// Opens a fresh tab owned by a single job.
    async fn open_job_context(&self) -> Result<Box<dyn JobTab>, BrowserError>;
}

/// One job's tab, plus the tab-level operations the pipeline needs.
#[async_trait]
pub trait JobTab: Send + Sync {
    /// Target id of this job's own tab.
    fn id(&self) -> &str;

    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    async fn is_visible(&self, selector: &str) -> Result<bool, BrowserError>;

    /// Rendered text of the first element matching `selector`, `None` when nothing matches.
    async fn text(&self, selector: &str) -> Result<Option<String>, BrowserError>;

    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    /// Every target of the browser, in the order the browser reports them.
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, BrowserError>;

    async fn close_tab(&self, tab_id: &str) -> Result<(), BrowserError>;

    /// Closes this job's tab. Calling it again is a no-op.
    async fn release(&mut self) -> Result<(), BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::profile;
    use data_model_jse::Site;

    #[test]
    fn test_settings_overrides_win_over_site_timings() {
        let linkedin = profile(Site::LinkedIn);
        let settings = BrowserSettings::default();
        assert_eq!(settings.settle_delay_for(linkedin), linkedin.settle_delay);
        assert_eq!(settings.apply_settle_for(linkedin), linkedin.apply_settle);

        let settings = BrowserSettings {
            settle_delay: Some(Duration::ZERO),
            apply_settle: Some(Duration::from_millis(10)),
            ..Default::default()
        };
        assert_eq!(settings.settle_delay_for(linkedin), Duration::ZERO);
        assert_eq!(settings.apply_settle_for(linkedin), Duration::from_millis(10));
    }

    #[test]
    fn test_only_page_targets_are_pages() {
        let tab = |kind: &str| TabInfo {
            id: "T".to_string(),
            url: "https://example.com".to_string(),
            kind: kind.to_string(),
        };
        assert!(tab("page").is_page());
        assert!(!tab("service_worker").is_page());
        assert!(!tab("background_page").is_page());
    }
}
