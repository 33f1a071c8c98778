pub mod db;
pub mod models;
pub mod schema;
pub mod store;

// Make test_helpers available for tests in this crate and dependent crates
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use models::{Site, UnknownSite};
pub use store::{LinkStore, PgLinkStore, StoreError};
