use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::target::{CloseTargetParams, GetTargetsParams};
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::browser::{BrowserDriver, BrowserSettings, JobTab, TabInfo, wait_for_debugger};
use crate::errors::BrowserError;

/// Connection to an already running browser, shared by every job of a run.
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    connected: Arc<AtomicBool>,
    settings: BrowserSettings,
}

impl BrowserSession {
    /// Waits for the DevTools endpoint, then connects to it.
    /// The CDP event loop runs on its own task for the lifetime of the session.
    pub async fn connect(settings: BrowserSettings) -> Result<Self, BrowserError> {
        let ws_url = wait_for_debugger(&settings.endpoint, settings.connect_timeout).await?;

        let (browser, mut handler) = tokio::time::timeout(settings.connect_timeout, Browser::connect(ws_url))
            .await
            .map_err(|_| BrowserError::timeout("connect to the browser", settings.connect_timeout))??;

        let connected = Arc::new(AtomicBool::new(true));
        let handler_task = tokio::spawn({
            let connected = connected.clone();
            async move {
                while let Some(event) = handler.next().await {
                    if let Err(e) = event {
                        tracing::debug!("CDP handler error: {}", e);
                    }
                }
                connected.store(false, Ordering::SeqCst);
                tracing::warn!("Browser connection closed");
            }
        });

        tracing::info!("Connected to browser at {}", settings.endpoint);
        Ok(BrowserSession {
            browser,
            handler_task,
            connected,
            settings,
        })
    }

    pub fn settings(&self) -> &BrowserSettings {
        &self.settings
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Opens a blank tab in the browser's default context, so the job sees the
    /// profile's existing logins.
    pub async fn open_job_context(&self) -> Result<JobContext, BrowserError> {
        if !self.is_connected() {
            return Err(BrowserError::Disconnected);
        }
        let timeout = self.settings.connect_timeout;
        let page = tokio::time::timeout(timeout, self.browser.new_page("about:blank"))
            .await
            .map_err(|_| BrowserError::timeout("open a job context", timeout))??;
        Ok(JobContext::new(page))
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait]
impl BrowserDriver for BrowserSession {
    async fn check_health(&self) -> Result<(), BrowserError> {
        if !self.is_connected() {
            return Err(BrowserError::Disconnected);
        }
        let timeout = self.settings.connect_timeout;
        tokio::time::timeout(timeout, self.browser.version())
            .await
            .map_err(|_| BrowserError::timeout("query the browser version", timeout))??;
        Ok(())
    }

    async fn open_job_context(&self) -> Result<Box<dyn JobTab>, BrowserError> {
        let context = BrowserSession::open_job_context(self).await?;
        Ok(Box::new(context))
    }
}

/// A job's own tab. Closed by `release`, or in the background when dropped unreleased.
pub struct JobContext {
    page: Option<Page>,
    target_id: String,
    runtime_handle: tokio::runtime::Handle,
}

impl JobContext {
    fn new(page: Page) -> Self {
        let target_id = page.target_id().inner().clone();
        JobContext {
            page: Some(page),
            target_id,
            runtime_handle: tokio::runtime::Handle::current(),
        }
    }

    fn page(&self) -> Result<&Page, BrowserError> {
        self.page.as_ref().ok_or(BrowserError::Released)
    }
}

/// Script evaluating to whether the first match of `selector` is rendered and not hidden.
fn visibility_script(selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); if (!el) return false; \
         const style = window.getComputedStyle(el); const rect = el.getBoundingClientRect(); \
         return style.display !== 'none' && style.visibility !== 'hidden' && (rect.width > 0 || rect.height > 0); }})()",
        js_string(selector)
    )
}

fn text_script(selector: &str) -> String {
    format!(
        "(() => {{ const el = document.querySelector({}); return el ? el.innerText : null; }})()",
        js_string(selector)
    )
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[async_trait]
impl JobTab for JobContext {
    fn id(&self) -> &str {
        &self.target_id
    }

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.page()?.goto(url).await?;
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool, BrowserError> {
        let result = self.page()?.evaluate(visibility_script(selector)).await?;
        Ok(result.into_value::<bool>().unwrap_or(false))
    }

    async fn text(&self, selector: &str) -> Result<Option<String>, BrowserError> {
        let result = self.page()?.evaluate(text_script(selector)).await?;
        Ok(result.into_value::<Option<String>>().unwrap_or(None))
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        let element = self
            .page()?
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::ElementNotFound(selector.to_string()))?;
        element.click().await?;
        Ok(())
    }

    async fn list_tabs(&self) -> Result<Vec<TabInfo>, BrowserError> {
        let response = self.page()?.execute(GetTargetsParams::default()).await?;
        Ok(response
            .result
            .target_infos
            .iter()
            .map(|info| TabInfo {
                id: info.target_id.inner().clone(),
                url: info.url.clone(),
                kind: info.r#type.clone(),
            })
            .collect())
    }

    async fn close_tab(&self, tab_id: &str) -> Result<(), BrowserError> {
        self.page()?.execute(CloseTargetParams::new(tab_id.to_string())).await?;
        Ok(())
    }

    async fn release(&mut self) -> Result<(), BrowserError> {
        if let Some(page) = self.page.take() {
            page.close().await?;
            tracing::debug!("Released job context {}", self.target_id);
        }
        Ok(())
    }
}

impl Drop for JobContext {
    fn drop(&mut self) {
        if let Some(page) = self.page.take() {
            let target_id = std::mem::take(&mut self.target_id);
            self.runtime_handle.spawn(async move {
                if let Err(e) = page.close().await {
                    tracing::warn!("Failed to close dropped job context {}: {}", target_id, e);
                } else {
                    tracing::debug!("Closed dropped job context {}", target_id);
                }
            });
        }
    }
}
