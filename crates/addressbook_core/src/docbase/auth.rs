//! Docbase principals and password checks.
//!
//! # Invariants
//! - Passwords are stored only as salted SHA-256 digests.
//! - Every principal has its own random salt.

use crate::config::Credentials;
use crate::store::StoreResult;
use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};

const SALT_BYTES: usize = 16;

pub(crate) fn principal_count(conn: &Connection) -> StoreResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM principals;", [], |row| row.get(0))?)
}

/// Adds a principal, replacing the password of an existing one.
pub(crate) fn register_principal(conn: &Connection, credentials: &Credentials) -> StoreResult<()> {
    let salt = new_salt();
    let hash = hash_password(&salt, &credentials.password);
    conn.execute(
        "INSERT INTO principals (user_name, password_salt, password_hash)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (user_name) DO UPDATE SET
            password_salt = excluded.password_salt,
            password_hash = excluded.password_hash;",
        params![credentials.username, salt, hash],
    )?;
    Ok(())
}

/// Returns whether `credentials` match a registered principal.
pub(crate) fn verify_principal(conn: &Connection, credentials: &Credentials) -> StoreResult<bool> {
    let stored = conn
        .query_row(
            "SELECT password_salt, password_hash FROM principals WHERE user_name = ?1;",
            [credentials.username.as_str()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    let Some((salt, expected)) = stored else {
        return Ok(false);
    };

    let actual = hash_password(&salt, &credentials.password);
    Ok(digests_match(actual.as_bytes(), expected.as_bytes()))
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

fn new_salt() -> String {
    let mut bytes = [0_u8; SALT_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn digests_match(left: &[u8], right: &[u8]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .fold(0_u8, |diff, (a, b)| diff | (a ^ b))
            == 0
}
