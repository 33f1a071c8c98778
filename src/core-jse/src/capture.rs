//! Finds the tab an apply click opened on the employer's site, records its URL
//! and closes it.

use std::collections::HashSet;

use data_model_jse::LinkStore;

use crate::browser::{JobTab, TabInfo};
use crate::errors::{BrowserError, CaptureError};
use crate::site::SiteProfile;

/// Tab ids that existed before a job's apply click. Owned by that job alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabSnapshot {
    ids: HashSet<String>,
}

impl TabSnapshot {
    pub async fn capture(tab: &dyn JobTab) -> Result<Self, BrowserError> {
        let tabs = tab.list_tabs().await?;
        Ok(Self::from_tabs(&tabs))
    }

    pub fn from_tabs(tabs: &[TabInfo]) -> Self {
        TabSnapshot {
            ids: tabs.iter().map(|t| t.id.clone()).collect(),
        }
    }

    pub fn contains(&self, tab_id: &str) -> bool {
        self.ids.contains(tab_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }
}

/// The first tab, in the browser's order, that is new since `before`, is a page,
/// and points outside the site.
pub fn select_candidate(tabs: &[TabInfo], before: &TabSnapshot, profile: &SiteProfile) -> Option<TabInfo> {
    tabs.iter()
        .filter(|t| !before.contains(&t.id))
        .filter(|t| t.is_page())
        .filter(|t| !t.url.trim().is_empty())
        .find(|t| profile.is_external(&t.url))
        .cloned()
}

/// Stores the URL of the external tab opened since `before` and closes that tab.
///
/// `Ok(None)` when no tab qualifies; nothing is closed then.
/// A link already stored for the job counts as captured. The tab is closed even when
/// storing its link fails; the store error is returned after closing.
pub async fn capture_external_tab(
    tab: &dyn JobTab,
    store: &dyn LinkStore,
    profile: &SiteProfile,
    job_id: &str,
    before: &TabSnapshot,
) -> Result<Option<String>, CaptureError> {
    let tabs = tab.list_tabs().await.map_err(CaptureError::ListTabs)?;

    let Some(candidate) = select_candidate(&tabs, before, profile) else {
        tracing::debug!(
            "[job: {}] No external tab opened ({} tabs before applying, {} now)",
            job_id,
            before.len(),
            tabs.len()
        );
        return Ok(None);
    };

    let url = candidate.url.trim();
    let stored = store.insert_application_link(profile.site, job_id, url).await;

    tab.close_tab(&candidate.id)
        .await
        .map_err(|source| CaptureError::CloseTab {
            tab_id: candidate.id.clone(),
            source,
        })?;

    if !stored? {
        tracing::debug!("[job: {}] Application link already stored: {}", job_id, url);
    }
    tracing::info!("[job: {}] Captured application link: {}", job_id, url);
    Ok(Some(url.to_string()))
}
