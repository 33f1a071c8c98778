pub mod db_env;
pub mod env;
pub mod hostname;
pub mod logging;

pub use db_env::{get_database_url, get_db_pool};
pub use env::{ConfigError, TimeUnit, env_duration, env_duration_opt, env_opt, env_or, is_env_set};
pub use hostname::{HostPortError, get_api_base_url};
pub use logging::setup_logging;
