//! Per-site adapters: the selectors, timings and domain predicate that differ
//! between the recruiting sites. Everything else in the pipeline is shared.

use std::time::Duration;

use data_model_jse::Site;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    pub site: Site,
    /// Registered domain. The host and all of its subdomains count as same-site.
    pub domain: &'static str,
    /// Must become visible before the page is considered loaded.
    pub container_selector: &'static str,
    /// Holds the posting's description text.
    pub description_selector: &'static str,
    pub apply_selector: &'static str,
    /// Pause after navigation before waiting on the container.
    pub settle_delay: Duration,
    /// Pause after the apply click so a new tab has time to open.
    pub apply_settle: Duration,
}

const LINKEDIN: SiteProfile = SiteProfile {
    site: Site::LinkedIn,
    domain: "linkedin.com",
    container_selector: "#job-details",
    description_selector: "#job-details",
    apply_selector: "div.jobs-apply-button--top-card button",
    settle_delay: Duration::from_secs(5),
    apply_settle: Duration::from_secs(3),
};

const XING: SiteProfile = SiteProfile {
    site: Site::Xing,
    domain: "xing.com",
    container_selector: "div.main-actions__ActionsContainer-sc-68c89ebb-0",
    description_selector: "[data-testid=\"expandable-content\"]",
    apply_selector: "div.main-actions__ActionsContainer-sc-68c89ebb-0 button[data-testid=\"apply-button\"]",
    settle_delay: Duration::from_secs(2),
    apply_settle: Duration::from_secs(5),
};

pub fn profile(site: Site) -> &'static SiteProfile {
    match site {
        Site::LinkedIn => &LINKEDIN,
        Site::Xing => &XING,
    }
}

impl SiteProfile {
    /// True when the URL's host is the site's domain or one of its subdomains.
    /// Only the host is inspected: a query like `?source=linkedin` never matters.
    pub fn is_same_site(&self, url: &str) -> bool {
        match host_of(url) {
            Some(host) => host_matches(&host, self.domain),
            None => false,
        }
    }

    /// True for a parseable URL with a host that lies outside the site's domain.
    pub fn is_external(&self, url: &str) -> bool {
        match host_of(url) {
            Some(host) => !host_matches(&host, self.domain),
            None => false,
        }
    }
}

fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.trim_end_matches('.').to_lowercase();
    if host.is_empty() { None } else { Some(host) }
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.ends_with(&format!(".{}", domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_site_is_host_based() {
        let linkedin = profile(Site::LinkedIn);
        assert!(linkedin.is_same_site("https://www.linkedin.com/jobs/view/123"));
        assert!(linkedin.is_same_site("https://linkedin.com/"));
        assert!(linkedin.is_same_site("https://de.LinkedIn.com/jobs"));
        assert!(!linkedin.is_same_site("https://careers.example.com/apply?source=linkedin"));
        assert!(!linkedin.is_same_site("https://example.com/linkedin.com/jobs"));
        assert!(!linkedin.is_same_site("https://notlinkedin.com/jobs"));
    }

    #[test]
    fn test_source_query_param_does_not_reject() {
        let xing = profile(Site::Xing);
        let url = "https://jobs.acme.de/apply/42?source=xing&utm_medium=xing.com";
        assert!(!xing.is_same_site(url));
        assert!(xing.is_external(url));
        assert!(!xing.is_external("https://www.xing.com/jobs/berlin-engineer-42?source=xing"));
    }

    #[test]
    fn test_unparseable_urls_are_neither() {
        let xing = profile(Site::Xing);
        for url in ["", "   ", "about:blank", "not a url", "chrome://newtab/"] {
            assert!(!xing.is_external(url), "{url:?} should not be external");
        }
        assert!(!xing.is_same_site("not a url"));
    }

    #[test]
    fn test_profiles_are_keyed_by_site() {
        for site in Site::ALL {
            assert_eq!(profile(site).site, site);
        }
    }
}
