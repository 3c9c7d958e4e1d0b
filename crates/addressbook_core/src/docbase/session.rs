//! Authenticated docbase sessions.
//!
//! # Responsibility
//! - Open file or in-memory docbases and bring their schema up to date.
//! - Authenticate the configured principal before any object access.
//!
//! # Invariants
//! - Returned sessions have `foreign_keys=ON` and a current schema.
//! - A session exists only for credentials the docbase accepted.
//! - The first principal of a docbase is the user that created it.
//! - A docbase file created by a failed connect is removed again.

use super::auth::{principal_count, register_principal, verify_principal};
use super::docbase_path;
use super::migrations::upgrade_schema;
use crate::config::{Credentials, RepositoryConfig};
use crate::store::{StoreError, StoreResult};
use log::{error, info, warn};
use rusqlite::Connection;
use std::io::ErrorKind;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
const IN_MEMORY_DOCBASE: &str = "memory";

/// Authenticated connection to one docbase.
pub struct Session {
    conn: Connection,
    docbase: String,
    username: String,
}

impl Session {
    /// Connects to the docbase described by `config`.
    ///
    /// # Side effects
    /// - Creates the data directory and docbase file when
    ///   `create_if_missing` is set and the docbase does not exist yet.
    /// - Emits `session_open` logging events with duration and status.
    ///
    /// # Errors
    /// - `DocbaseNotFound` when the file is absent and creation is disabled.
    /// - `AuthenticationFailed` when the credentials are not accepted.
    /// - `UnsupportedSchemaVersion` when a newer binary wrote the docbase.
    pub fn connect(config: &RepositoryConfig) -> StoreResult<Self> {
        let started_at = Instant::now();
        info!(
            "event=session_open module=docbase status=start mode=file docbase={}",
            config.name
        );

        let result = open_file_session(config);
        log_outcome(&result, "file", started_at);
        result
    }

    /// Creates a private in-memory docbase owned by `credentials`.
    pub fn connect_in_memory(credentials: &Credentials) -> StoreResult<Self> {
        let started_at = Instant::now();
        info!("event=session_open module=docbase status=start mode=memory");

        let result = Connection::open_in_memory()
            .map_err(StoreError::from)
            .and_then(|mut conn| {
                bootstrap_connection(&mut conn)?;
                register_principal(&conn, credentials)?;
                Ok(Self {
                    conn,
                    docbase: IN_MEMORY_DOCBASE.to_string(),
                    username: credentials.username.clone(),
                })
            });
        log_outcome(&result, "memory", started_at);
        result
    }

    pub fn docbase(&self) -> &str {
        &self.docbase
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Registers another principal, or resets the password of an existing one.
    pub fn add_principal(&self, credentials: &Credentials) -> StoreResult<()> {
        register_principal(&self.conn, credentials)?;
        info!("event=principal_add module=docbase status=ok docbase={}", self.docbase);
        Ok(())
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

fn open_file_session(config: &RepositoryConfig) -> StoreResult<Session> {
    let path = docbase_path(&config.data_dir, &config.name)?;
    let exists = path.exists();
    if !exists {
        if !config.create_if_missing {
            return Err(StoreError::DocbaseNotFound(path));
        }
        std::fs::create_dir_all(&config.data_dir)?;
    }

    let result = Connection::open(&path)
        .map_err(StoreError::from)
        .and_then(|conn| authenticate(conn, config, exists));
    if result.is_err() && !exists {
        discard_docbase_file(&path);
    }
    result
}

fn authenticate(
    mut conn: Connection,
    config: &RepositoryConfig,
    exists: bool,
) -> StoreResult<Session> {
    bootstrap_connection(&mut conn)?;

    let credentials = config.credentials();
    if principal_count(&conn)? == 0 {
        if exists && !config.create_if_missing {
            return Err(StoreError::AuthenticationFailed {
                docbase: config.name.clone(),
                username: credentials.username,
            });
        }
        register_principal(&conn, &credentials)?;
        info!(
            "event=docbase_create module=docbase status=ok docbase={}",
            config.name
        );
    }

    if !verify_principal(&conn, &credentials)? {
        return Err(StoreError::AuthenticationFailed {
            docbase: config.name.clone(),
            username: credentials.username,
        });
    }

    Ok(Session {
        conn,
        docbase: config.name.clone(),
        username: credentials.username,
    })
}

/// Removes a docbase file this call created but could not initialize.
fn discard_docbase_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => warn!(
            "event=docbase_discard module=docbase status=error path={} error={}",
            path.display(),
            err
        ),
    }
}

fn bootstrap_connection(conn: &mut Connection) -> StoreResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    upgrade_schema(conn)?;
    Ok(())
}

fn log_outcome(result: &StoreResult<Session>, mode: &str, started_at: Instant) {
    match result {
        Ok(_) => info!(
            "event=session_open module=docbase status=ok mode={} duration_ms={}",
            mode,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=session_open module=docbase status=error mode={} duration_ms={} error_code={} error={}",
            mode,
            started_at.elapsed().as_millis(),
            error_code(err),
            err
        ),
    }
}

fn error_code(err: &StoreError) -> &'static str {
    match err {
        StoreError::AuthenticationFailed { .. } => "auth_failed",
        StoreError::DocbaseNotFound(_) => "docbase_not_found",
        StoreError::InvalidDocbaseName(_) => "invalid_docbase_name",
        StoreError::UnsupportedSchemaVersion { .. } => "schema_too_new",
        _ => "session_open_failed",
    }
}
