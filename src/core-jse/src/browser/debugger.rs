use std::time::Duration;

use serde::Deserialize;

use crate::errors::BrowserError;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Subset of `GET /json/version`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionInfo {
    #[serde(rename = "Browser", default)]
    browser: String,
    web_socket_debugger_url: String,
}

/// Asks the DevTools HTTP endpoint for the browser's websocket URL.
pub async fn fetch_debugger_url(client: &reqwest::Client, endpoint: &str) -> Result<String, BrowserError> {
    let url = format!("{}/json/version", endpoint.trim_end_matches('/'));
    let version: VersionInfo = client.get(&url).send().await?.error_for_status()?.json().await?;
    tracing::debug!("Debugger at {} reports browser '{}'", endpoint, version.browser);
    Ok(version.web_socket_debugger_url)
}

/// Polls the DevTools endpoint until it answers or `timeout` expires.
/// Returns the websocket URL to connect to.
pub async fn wait_for_debugger(endpoint: &str, timeout: Duration) -> Result<String, BrowserError> {
    let client = reqwest::Client::builder().timeout(POLL_INTERVAL * 4).build()?;
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        match fetch_debugger_url(&client, endpoint).await {
            Ok(ws_url) => return Ok(ws_url),
            Err(error) => {
                if tokio::time::Instant::now() + POLL_INTERVAL > deadline {
                    return Err(BrowserError::DebuggerUnreachable {
                        endpoint: endpoint.to_string(),
                        reason: error.to_string(),
                    });
                }
                tracing::debug!("Debugger at {} not ready yet: {}", endpoint, error);
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
