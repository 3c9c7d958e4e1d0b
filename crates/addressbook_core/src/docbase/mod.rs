//! Local docbase: a SQLite-backed content repository.
//!
//! # Responsibility
//! - Open, migrate and authenticate docbase sessions.
//! - Implement [`crate::store::ContentStore`] over SQLite tables.
//!
//! # Invariants
//! - One docbase is one SQLite file named `<name>.docbase` under the data dir.
//! - No object data is read or written before the schema is current and the
//!   session is authenticated.

mod auth;
pub mod migrations;
mod objects;
mod session;

pub use session::Session;

use crate::store::{StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

pub const DOCBASE_FILE_EXTENSION: &str = "docbase";

static DOCBASE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Za-z][A-Za-z0-9_]{0,63}$").expect("valid docbase name regex"));

/// Rejects names that cannot be used as a docbase file stem.
pub fn validate_docbase_name(name: &str) -> StoreResult<()> {
    if DOCBASE_NAME_RE.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidDocbaseName(name.to_string()))
    }
}

/// Returns the file backing docbase `name` inside `data_dir`.
pub fn docbase_path(data_dir: &Path, name: &str) -> StoreResult<PathBuf> {
    validate_docbase_name(name)?;
    Ok(data_dir.join(format!("{name}.{DOCBASE_FILE_EXTENSION}")))
}
