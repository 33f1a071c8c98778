use std::time::Duration;

use data_model_jse::models::JobLink;

use crate::browser::JobTab;
use crate::errors::{BrowserError, FailureReason};
use crate::site::SiteProfile;
use crate::text::normalize_description;

const VISIBILITY_POLL: Duration = Duration::from_millis(250);

/// Polls until the first match of `selector` is visible.
/// Evaluation errors (e.g. while the page is still swapping documents) are retried until `timeout`.
pub async fn wait_until_visible(tab: &dyn JobTab, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match tab.is_visible(selector).await {
            Ok(true) => return Ok(()),
            Ok(false) => {}
            Err(e) => tracing::debug!("Visibility check for '{}' failed: {}", selector, e),
        }
        let now = tokio::time::Instant::now();
        if now >= deadline {
            return Err(BrowserError::timeout(&format!("wait for '{}' to be visible", selector), timeout));
        }
        tokio::time::sleep(VISIBILITY_POLL.min(deadline - now)).await;
    }
}

/// Loads the job's page and returns its normalized description text.
/// `wait_timeout` bounds the wait for the container once the settle delay is over.
pub async fn extract_description(
    tab: &dyn JobTab,
    profile: &SiteProfile,
    job: &JobLink,
    settle_delay: Duration,
    wait_timeout: Duration,
) -> Result<String, FailureReason> {
    if let Err(e) = tab.navigate(&job.link).await {
        tracing::warn!("[job: {}] Failed to navigate to {}: {}", job.id, job.link, e);
        return Err(FailureReason::Navigation);
    }
    tokio::time::sleep(settle_delay).await;

    if let Err(e) = wait_until_visible(tab, profile.container_selector, wait_timeout).await {
        tracing::warn!("[job: {}] Page container never became visible: {}", job.id, e);
        return Err(FailureReason::Navigation);
    }

    let raw = match tab.text(profile.description_selector).await {
        Ok(Some(text)) => text,
        Ok(None) => {
            tracing::warn!("[job: {}] No element matches '{}'", job.id, profile.description_selector);
            return Err(FailureReason::DescriptionNotFound);
        }
        Err(e) => {
            tracing::warn!("[job: {}] Failed to read description text: {}", job.id, e);
            return Err(FailureReason::DescriptionNotFound);
        }
    };

    let description = normalize_description(&raw);
    if description.is_empty() {
        tracing::warn!("[job: {}] Description is empty", job.id);
        return Err(FailureReason::DescriptionNotFound);
    }
    tracing::debug!("[job: {}] Extracted description ({} chars)", job.id, description.len());
    Ok(description)
}

/// Clicks the site's apply control, then gives a new tab time to open.
/// The caller treats failure as non-fatal.
pub async fn attempt_apply(tab: &dyn JobTab, profile: &SiteProfile, apply_settle: Duration) -> Result<(), BrowserError> {
    tab.click(profile.apply_selector).await?;
    tokio::time::sleep(apply_settle).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::profile;
    use crate::testing::{FakeBrowser, FakePage};
    use data_model_jse::Site;

    fn job() -> JobLink {
        JobLink::with_id("J1", Site::LinkedIn, "Engineer", "https://site/job/123")
    }

    async fn extract(page: FakePage) -> Result<String, FailureReason> {
        let browser = FakeBrowser::new();
        browser.add_page(&job().link, page);
        let tab = browser.open_tab();
        extract_description(
            &tab,
            profile(Site::LinkedIn),
            &job(),
            Duration::ZERO,
            Duration::from_millis(300),
        )
        .await
    }

    #[tokio::test]
    async fn test_extract_description_normalizes() {
        let page = FakePage::new().with_element("#job-details", "  Great role.\n\nApply now.  ");
        assert_eq!(extract(page).await.unwrap(), "Great role. Apply now.");
    }

    #[tokio::test]
    async fn test_extract_description_container_never_visible() {
        let page = FakePage::new();
        assert_eq!(extract(page).await.unwrap_err(), FailureReason::Navigation);
    }

    #[tokio::test]
    async fn test_wait_until_visible_stops_at_its_timeout() {
        let browser = FakeBrowser::new();
        browser.add_page(&job().link, FakePage::new());
        let tab = browser.open_tab();
        tab.navigate(&job().link).await.unwrap();

        let started = std::time::Instant::now();
        let result = wait_until_visible(&tab, "#job-details", Duration::from_millis(100)).await;
        assert!(matches!(result, Err(BrowserError::Timeout { .. })));
        assert!(started.elapsed() < VISIBILITY_POLL, "Waited {:?}", started.elapsed());
    }

    #[tokio::test]
    async fn test_extract_description_navigation_error() {
        let page = FakePage::new().failing_navigation();
        assert_eq!(extract(page).await.unwrap_err(), FailureReason::Navigation);
    }

    #[tokio::test]
    async fn test_extract_description_blank_text() {
        let page = FakePage::new().with_element("#job-details", " \n\t\n ");
        assert_eq!(extract(page).await.unwrap_err(), FailureReason::DescriptionNotFound);
    }

    #[tokio::test]
    async fn test_attempt_apply_without_button_fails() {
        let browser = FakeBrowser::new();
        browser.add_page(&job().link, FakePage::new().with_element("#job-details", "text"));
        let tab = browser.open_tab();
        tab.navigate(&job().link).await.unwrap();

        let result = attempt_apply(&tab, profile(Site::LinkedIn), Duration::ZERO).await;
        assert!(matches!(result, Err(BrowserError::ElementNotFound(_))));
    }
}
