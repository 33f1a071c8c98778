use data_model_jse::db::{DbPool, establish_connection_pool};

use crate::common::env::{ConfigError, env_opt};

/// Uses the env var DATABASE_URL to establish a database connection pool using diesel.
/// Fails if DATABASE_URL is not set or if the first connection cannot be made.
pub async fn get_db_pool() -> Result<DbPool, ConfigError> {
    let database_url = get_database_url()?;
    let pool = establish_connection_pool(&database_url).await?;
    Ok(pool)
}

/// Retrieves the value for the env var DATABASE_URL.
pub fn get_database_url() -> Result<String, ConfigError> {
    env_opt("DATABASE_URL").ok_or_else(|| ConfigError::Missing("DATABASE_URL".to_string()))
}
