//! In-memory browser for exercising the pipeline without Chromium
//!
//! `FakeBrowser` keeps a list of open targets and a set of scripted pages keyed by URL.
//! Each `FakePage` declares which selectors are visible (and their text), whether
//! navigation fails, hangs or panics, how slow it is, and which tabs an apply click opens.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::browser::{BrowserDriver, JobTab, TabInfo};
use crate::errors::BrowserError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum NavigationBehavior {
    #[default]
    Load,
    Slow(Duration),
    Fail,
    Hang,
    Panic,
    Disconnect,
}

/// A scripted page.
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    elements: HashMap<String, String>,
    navigation: NavigationBehavior,
    popups: Vec<(String, String)>,
    read_delay: Duration,
    click_delay: Duration,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A visible element matching `selector` with the given text.
    pub fn with_element(mut self, selector: &str, text: &str) -> Self {
        self.elements.insert(selector.to_string(), text.to_string());
        self
    }

    /// Clicking any element of this page opens a new `page` target at `url`.
    pub fn with_popup(self, url: &str) -> Self {
        self.with_popup_of_kind(url, "page")
    }

    pub fn with_popup_of_kind(mut self, url: &str, kind: &str) -> Self {
        self.popups.push((url.to_string(), kind.to_string()));
        self
    }

    pub fn failing_navigation(mut self) -> Self {
        self.navigation = NavigationBehavior::Fail;
        self
    }

    /// Navigation completes after `delay`.
    pub fn slow_navigation(mut self, delay: Duration) -> Self {
        self.navigation = NavigationBehavior::Slow(delay);
        self
    }

    /// Reading text takes `delay`.
    pub fn slow_reads(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }

    /// Clicks take `delay` before anything opens.
    pub fn slow_clicks(mut self, delay: Duration) -> Self {
        self.click_delay = delay;
        self
    }

    /// Navigation never completes.
    pub fn hanging_navigation(mut self) -> Self {
        self.navigation = NavigationBehavior::Hang;
        self
    }

    /// The whole browser goes away while this page loads.
    pub fn disconnecting_navigation(mut self) -> Self {
        self.navigation = NavigationBehavior::Disconnect;
        self
    }

    /// Navigation panics, like a bug deep inside the browser client would.
    pub fn panicking_navigation(mut self) -> Self {
        self.navigation = NavigationBehavior::Panic;
        self
    }
}

#[derive(Default)]
struct FakeState {
    pages: HashMap<String, FakePage>,
    tabs: Vec<TabInfo>,
    next_id: usize,
    job_tabs_opened: Vec<String>,
    released: Vec<String>,
    dropped_unreleased: Vec<String>,
    closed: Vec<String>,
    disconnected: bool,
    fail_open: bool,
    fail_list_tabs: bool,
}

impl FakeState {
    fn new_tab(&mut self, url: &str, kind: &str) -> String {
        self.next_id += 1;
        let id = format!("T{}", self.next_id);
        self.tabs.push(TabInfo {
            id: id.clone(),
            url: url.to_string(),
            kind: kind.to_string(),
        });
        id
    }

    fn remove_tab(&mut self, id: &str) -> bool {
        let before = self.tabs.len();
        self.tabs.retain(|t| t.id != id);
        self.tabs.len() != before
    }
}

/// Shared handle to the fake browser. Clones see the same state.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&self, url: &str, page: FakePage) {
        self.state.lock().unwrap().pages.insert(url.to_string(), page);
    }

    /// A target that exists before any job runs, e.g. the tab the user logged in with.
    pub fn add_existing_tab(&self, url: &str, kind: &str) -> String {
        self.state.lock().unwrap().new_tab(url, kind)
    }

    /// Opens a job tab directly, bypassing the `BrowserDriver` failure switches.
    pub fn open_tab(&self) -> FakeTab {
        let id = {
            let mut state = self.state.lock().unwrap();
            let id = state.new_tab("about:blank", "page");
            state.job_tabs_opened.push(id.clone());
            id
        };
        FakeTab {
            id,
            state: self.state.clone(),
            current_url: Mutex::new(None),
            released: false,
        }
    }

    /// Drops the session: health checks and new contexts fail from now on.
    pub fn disconnect(&self) {
        self.state.lock().unwrap().disconnected = true;
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.state.lock().unwrap().fail_open = fail;
    }

    pub fn set_fail_list_tabs(&self, fail: bool) {
        self.state.lock().unwrap().fail_list_tabs = fail;
    }

    pub fn open_tabs(&self) -> Vec<TabInfo> {
        self.state.lock().unwrap().tabs.clone()
    }

    /// Ids of tabs closed through `close_tab`.
    pub fn closed_tabs(&self) -> Vec<String> {
        self.state.lock().unwrap().closed.clone()
    }

    pub fn job_tabs_opened(&self) -> Vec<String> {
        self.state.lock().unwrap().job_tabs_opened.clone()
    }

    /// Job tabs closed by an explicit `release`.
    pub fn released_contexts(&self) -> Vec<String> {
        self.state.lock().unwrap().released.clone()
    }

    /// Job tabs closed because their handle was dropped without `release`.
    pub fn dropped_contexts(&self) -> Vec<String> {
        self.state.lock().unwrap().dropped_unreleased.clone()
    }

    /// Job tabs that are still open.
    pub fn leaked_contexts(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .job_tabs_opened
            .iter()
            .filter(|id| state.tabs.iter().any(|t| &t.id == *id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl BrowserDriver for FakeBrowser {
    async fn check_health(&self) -> Result<(), BrowserError> {
        if self.state.lock().unwrap().disconnected {
            return Err(BrowserError::Disconnected);
        }
        Ok(())
    }

    async fn open_job_context(&self) -> Result<Box<dyn JobTab>, BrowserError> {
        {
            let state = self.state.lock().unwrap();
            if state.disconnected {
                return Err(BrowserError::Disconnected);
            }
            if state.fail_open {
                return Err(BrowserError::timeout("open a job context", Duration::ZERO));
            }
        }
        Ok(Box::new(self.open_tab()))
    }
}

pub struct FakeTab {
    id: String,
    state: Arc<Mutex<FakeState>>,
    current_url: Mutex<Option<String>>,
    released: bool,
}

impl FakeTab {
    fn current_page(&self) -> Option<FakePage> {
        let url = self.current_url.lock().unwrap().clone()?;
        self.state.lock().unwrap().pages.get(&url).cloned()
    }

    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.released {
            return Err(BrowserError::Released);
        }
        Ok(())
    }
}

#[async_trait]
impl JobTab for FakeTab {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        let page = self.state.lock().unwrap().pages.get(url).cloned();
        let Some(page) = page else {
            return Err(BrowserError::timeout(&format!("navigate to {}", url), Duration::ZERO));
        };
        match page.navigation {
            NavigationBehavior::Load => {}
            NavigationBehavior::Slow(delay) => tokio::time::sleep(delay).await,
            NavigationBehavior::Fail => {
                return Err(BrowserError::timeout(&format!("navigate to {}", url), Duration::ZERO));
            }
            NavigationBehavior::Hang => std::future::pending::<()>().await,
            NavigationBehavior::Panic => panic!("browser client fault while navigating to {}", url),
            NavigationBehavior::Disconnect => {
                self.state.lock().unwrap().disconnected = true;
                return Err(BrowserError::Disconnected);
            }
        }

        *self.current_url.lock().unwrap() = Some(url.to_string());
        let mut state = self.state.lock().unwrap();
        if let Some(tab) = state.tabs.iter_mut().find(|t| t.id == self.id) {
            tab.url = url.to_string();
        }
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool, BrowserError> {
        self.ensure_open()?;
        Ok(self
            .current_page()
            .map(|page| page.elements.contains_key(selector))
            .unwrap_or(false))
    }

    async fn text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        self.ensure_open()?;
        let Some(page) = self.current_page() else {
            return Ok(None);
        };
        tokio::time::sleep(page.read_delay).await;
        Ok(page.elements.get(selector).cloned())
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        let page = self
            .current_page()
            .filter(|page| page.elements.contains_key(selector))
            .ok_or_else(|| BrowserError::ElementNotFound(selector.to_string()))?;
        tokio::time::sleep(page.click_delay).await;
        let mut state = self.state.lock().unwrap();
        for (url, kind) in &page.popups {
            state.new_tab(url, kind);
        }
        Ok(())
    }

    async fn list_tabs(&self) -> Result<Vec<TabInfo>, BrowserError> {
        self.ensure_open()?;
        let state = self.state.lock().unwrap();
        if state.fail_list_tabs {
            return Err(BrowserError::Disconnected);
        }
        Ok(state.tabs.clone())
    }

    async fn close_tab(&self, tab_id: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        let mut state = self.state.lock().unwrap();
        if !state.remove_tab(tab_id) {
            return Err(BrowserError::ElementNotFound(tab_id.to_string()));
        }
        state.closed.push(tab_id.to_string());
        Ok(())
    }

    async fn release(&mut self) -> Result<(), BrowserError> {
        if !self.released {
            self.released = true;
            let mut state = self.state.lock().unwrap();
            state.remove_tab(&self.id);
            state.released.push(self.id.clone());
        }
        Ok(())
    }
}

impl Drop for FakeTab {
    fn drop(&mut self) {
        if !self.released {
            // A poisoned lock means a test already panicked while holding it.
            if let Ok(mut state) = self.state.lock() {
                state.remove_tab(&self.id);
                state.dropped_unreleased.push(self.id.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_click_opens_popups_and_release_is_idempotent() {
        let browser = FakeBrowser::new();
        browser.add_page(
            "https://site/job/1",
            FakePage::new()
                .with_element("button", "Apply")
                .with_popup("https://careers.example.com/apply"),
        );
        let mut tab = browser.open_tab();
        tab.navigate("https://site/job/1").await.unwrap();
        tab.click("button").await.unwrap();
        assert_eq!(tab.list_tabs().await.unwrap().len(), 2);

        tab.release().await.unwrap();
        tab.release().await.unwrap();
        assert_eq!(browser.released_contexts(), vec![tab.id().to_string()]);
        assert!(browser.leaked_contexts().is_empty());
        assert!(matches!(tab.list_tabs().await, Err(BrowserError::Released)));
    }

    #[tokio::test]
    async fn test_dropped_tab_is_closed() {
        let browser = FakeBrowser::new();
        {
            let _tab = browser.open_tab();
            assert_eq!(browser.leaked_contexts().len(), 1);
        }
        assert!(browser.leaked_contexts().is_empty());
        assert_eq!(browser.dropped_contexts().len(), 1);
    }
}
