//! Docbase schema steps.
//!
//! # Invariants
//! - Steps are listed in strictly increasing `version` order.
//! - The docbase schema version lives in `PRAGMA user_version`.
//! - Pending steps run inside one transaction; a failed step leaves the
//!   docbase at its previous version.

use crate::store::{StoreError, StoreResult};
use log::info;
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "objects",
        sql: include_str!("0001_objects.sql"),
    },
    SchemaStep {
        version: 2,
        name: "contents",
        sql: include_str!("0002_contents.sql"),
    },
    SchemaStep {
        version: 3,
        name: "principals",
        sql: include_str!("0003_principals.sql"),
    },
];

/// Schema version this binary writes.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Reads the schema version recorded in the docbase.
pub fn schema_version(conn: &Connection) -> StoreResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

/// Brings the docbase schema up to `latest_version()`.
///
/// Returns the number of steps applied.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the docbase was written by a newer binary.
pub fn upgrade_schema(conn: &mut Connection) -> StoreResult<usize> {
    let found = schema_version(conn)?;
    let latest = latest_version();
    if found > latest {
        return Err(StoreError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }

    let pending = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > found)
        .collect::<Vec<_>>();
    if pending.is_empty() {
        return Ok(0);
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        info!(
            "event=schema_step module=docbase status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    Ok(pending.len())
}
