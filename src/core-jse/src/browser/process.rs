use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::browser::wait_for_debugger;
use crate::common::{ConfigError, env_opt, env_or};
use crate::errors::BrowserError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    pub executable: PathBuf,
    pub debug_port: u16,
    /// Name of the profile holding the site logins, e.g. `Profile 2`.
    pub profile_directory: Option<String>,
    pub user_data_dir: Option<PathBuf>,
    /// Page opened on start.
    pub start_url: Option<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        LaunchOptions {
            executable: PathBuf::from("chromium"),
            debug_port: 9222,
            profile_directory: None,
            user_data_dir: None,
            start_url: None,
        }
    }
}

impl LaunchOptions {
    /// Reads CHROMIUM_PATH, BROWSER_DEBUG_PORT, CHROMIUM_PROFILE and CHROMIUM_USER_DATA_DIR.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = env_or("BROWSER_DEBUG_PORT", "9222");
        let debug_port = port.parse::<u16>().map_err(|e| ConfigError::InvalidNumber {
            var: "BROWSER_DEBUG_PORT".to_string(),
            value: port.clone(),
            source: e,
        })?;
        Ok(LaunchOptions {
            executable: PathBuf::from(env_or("CHROMIUM_PATH", "chromium")),
            debug_port,
            profile_directory: env_opt("CHROMIUM_PROFILE"),
            user_data_dir: env_opt("CHROMIUM_USER_DATA_DIR").map(PathBuf::from),
            start_url: None,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("http://localhost:{}", self.debug_port)
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--remote-debugging-port={}", self.debug_port),
            "--no-first-run".to_string(),
            "--no-default-browser-check".to_string(),
        ];
        if let Some(dir) = &self.user_data_dir {
            args.push(format!("--user-data-dir={}", dir.display()));
        }
        if let Some(profile) = &self.profile_directory {
            args.push(format!("--profile-directory={}", profile));
        }
        if let Some(url) = &self.start_url {
            args.push(url.clone());
        }
        args
    }
}

/// A locally launched browser. The process is killed on `stop`, or when dropped.
pub struct BrowserProcess {
    child: Option<Child>,
    endpoint: String,
}

impl BrowserProcess {
    pub fn start(options: &LaunchOptions) -> Result<Self, BrowserError> {
        let child = Command::new(&options.executable)
            .args(options.args())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        tracing::info!(
            "Launched {} (pid {:?}) with remote debugging on port {}",
            options.executable.display(),
            child.id(),
            options.debug_port
        );
        Ok(BrowserProcess {
            child: Some(child),
            endpoint: options.endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Blocks until the debugger answers. Returns its websocket URL.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<String, BrowserError> {
        wait_for_debugger(&self.endpoint, timeout).await
    }

    pub async fn stop(mut self) -> Result<(), BrowserError> {
        if let Some(mut child) = self.child.take() {
            child.kill().await?;
            tracing::info!("Stopped browser process");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_args() {
        let options = LaunchOptions {
            profile_directory: Some("Profile 2".to_string()),
            start_url: Some("https://www.linkedin.com/".to_string()),
            ..Default::default()
        };
        assert_eq!(
            options.args(),
            vec![
                "--remote-debugging-port=9222",
                "--no-first-run",
                "--no-default-browser-check",
                "--profile-directory=Profile 2",
                "https://www.linkedin.com/",
            ]
        );
        assert_eq!(options.endpoint(), "http://localhost:9222");
    }

    #[tokio::test]
    async fn test_start_missing_executable_fails() {
        let options = LaunchOptions {
            executable: PathBuf::from("/nonexistent/path/to/chromium"),
            ..Default::default()
        };
        assert!(matches!(BrowserProcess::start(&options), Err(BrowserError::Launch(_))));
    }
}
