use core_jse::{BrowserError, ConfigError};
use data_model_jse::StoreError;

/// Session-level failures that abort a whole run. Per-job failures never end up here.
#[derive(Debug)]
pub enum Error {
    Store(StoreError),
    Browser(BrowserError),
    Config(ConfigError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(store_error) => write!(f, "Link store error: {}", store_error),
            Self::Browser(browser_error) => write!(f, "Browser session error: {}", browser_error),
            Self::Config(config_error) => write!(f, "Configuration error: {}", config_error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Browser(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}

impl From<BrowserError> for Error {
    fn from(error: BrowserError) -> Self {
        Self::Browser(error)
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Self {
        Self::Config(error)
    }
}
