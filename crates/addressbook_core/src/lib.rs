//! Core logic for the address book.
//! Contacts are persisted as objects in a docbase (content repository).

pub mod config;
pub mod docbase;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod setup;
pub mod store;

pub use config::{AppConfig, ConfigError, Credentials, LoggingConfig, RepositoryConfig};
pub use docbase::Session;
pub use logging::{default_log_level, init_logging, logging_status, LogLevel, LoggingError};
pub use model::contact::{Contact, ContactId, ContactValidationError};
pub use repo::contact_repo::{ContactRepository, RepoError, RepoResult, StoreContactRepository};
pub use repo::query::{ContactIter, ContactQuery};
pub use service::contact_service::ContactService;
pub use setup::{ContactRow, SetupError, DUMMY_DOMAINS};
pub use store::{ContentStore, ObjectId, StoreError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Wraps an open session in a contact repository using the configured page
/// size.
pub fn contact_repository<'s>(
    session: &'s Session,
    config: &RepositoryConfig,
) -> RepoResult<StoreContactRepository<'s>> {
    StoreContactRepository::try_new(session)?.with_page_size(config.page_size)
}
