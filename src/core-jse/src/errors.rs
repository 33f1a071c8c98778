use data_model_jse::StoreError;

/// Errors talking to the remote browser over the DevTools protocol.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("Browser debugger at {endpoint} is unreachable: {reason}")]
    DebuggerUnreachable { endpoint: String, reason: String },
    #[error("DevTools protocol error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),
    #[error("Debugger endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Timed out after {timeout_ms}ms while trying to {operation}")]
    Timeout { operation: String, timeout_ms: u128 },
    #[error("No element matches selector '{0}'")]
    ElementNotFound(String),
    #[error("Browser session is disconnected")]
    Disconnected,
    #[error("Job context was already released")]
    Released,
    #[error("Failed to launch browser process: {0}")]
    Launch(#[from] std::io::Error),
}

impl BrowserError {
    pub fn timeout(operation: &str, timeout: std::time::Duration) -> Self {
        BrowserError::Timeout {
            operation: operation.to_string(),
            timeout_ms: timeout.as_millis(),
        }
    }
}

/// Errors from the tab-capture step. None of them fail the job.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("Failed to list open tabs: {0}")]
    ListTabs(BrowserError),
    #[error("Failed to store application link: {0}")]
    Store(#[from] StoreError),
    #[error("Failed to close tab {tab_id}: {source}")]
    CloseTab {
        tab_id: String,
        #[source]
        source: BrowserError,
    },
}

/// Why a job ended in the failed state. The string forms are stored in `failed_jobs.reason`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    OpenContext,
    Navigation,
    DescriptionNotFound,
    StoreDescription,
    Timeout,
    UnexpectedFault,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::OpenContext => "failed to open job context",
            FailureReason::Navigation => "navigation or container wait failed",
            FailureReason::DescriptionNotFound => "description not found",
            FailureReason::StoreDescription => "failed to store description",
            FailureReason::Timeout => "timeout",
            FailureReason::UnexpectedFault => "unexpected fault",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
