//! Content-store boundary consumed by repositories.
//!
//! # Responsibility
//! - Define the object/attribute/content contract a docbase client provides.
//! - Define the store error type surfaced unchanged through repositories.
//!
//! # Invariants
//! - Object ids are assigned by the store and never reused.
//! - Queries page by ascending object id, so a cursor stays valid while
//!   earlier objects are deleted.
//! - Content is stored per object, independently of attributes.
//!
//! # See also
//! - `crate::docbase` for the SQLite-backed implementation.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use uuid::Uuid;

static OBJECT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[0-9a-f]{32}$").expect("valid object id regex"));

/// Attribute name to value map for one stored object.
pub type Attributes = BTreeMap<String, String>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Opaque store-assigned object identifier (32 lowercase hex characters).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Allocates a fresh id. Only stores should call this.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        if !OBJECT_ID_RE.is_match(&normalized) {
            return Err(StoreError::InvalidObjectId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

/// One object as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub id: ObjectId,
    pub object_type: String,
    pub attributes: Attributes,
}

/// Attribute predicate evaluated by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeFilter {
    /// Attribute value contains `value` as a case-sensitive substring.
    Contains { attribute: String, value: String },
}

/// Keyset-paginated query over objects of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectQuery {
    pub object_type: String,
    pub filter: Option<AttributeFilter>,
    /// Return only objects whose id sorts after this cursor.
    pub after: Option<ObjectId>,
    pub limit: u32,
}

/// Binary payload attached to an object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    /// Format tag, normally the file extension without the dot.
    pub format: String,
    pub data: Vec<u8>,
}

/// Errors raised by content-store implementations.
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Io(std::io::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    InvalidDocbaseName(String),
    DocbaseNotFound(PathBuf),
    AuthenticationFailed {
        docbase: String,
        username: String,
    },
    ObjectNotFound(ObjectId),
    InvalidObjectId(String),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "docbase schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::InvalidDocbaseName(name) => write!(f, "invalid docbase name `{name}`"),
            Self::DocbaseNotFound(path) => {
                write!(f, "docbase not found at `{}`", path.display())
            }
            Self::AuthenticationFailed { docbase, username } => {
                write!(f, "authentication failed for `{username}` on docbase `{docbase}`")
            }
            Self::ObjectNotFound(id) => write!(f, "object not found: {id}"),
            Self::InvalidObjectId(value) => write!(f, "invalid object id `{value}`"),
            Self::InvalidData(message) => write!(f, "invalid stored data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Client contract for a content repository.
///
/// Each call is one synchronous round trip. Implementations own consistency;
/// callers never retry.
pub trait ContentStore {
    /// Creates an object and returns its newly assigned id.
    fn create_object(&self, object_type: &str, attributes: &Attributes) -> StoreResult<ObjectId>;
    /// Overwrites the given attributes of an existing object of `object_type`.
    fn update_object(
        &self,
        object_type: &str,
        id: &ObjectId,
        attributes: &Attributes,
    ) -> StoreResult<()>;
    fn get_object(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;
    /// Destroys an object of `object_type` together with its content.
    fn delete_object(&self, object_type: &str, id: &ObjectId) -> StoreResult<()>;
    /// Returns at most `query.limit` objects ordered by ascending id.
    fn query_objects(&self, query: &ObjectQuery) -> StoreResult<Vec<StoredObject>>;
    /// Replaces the content attached to an object.
    fn set_content(&self, id: &ObjectId, format: &str, data: &[u8]) -> StoreResult<()>;
    fn get_content(&self, id: &ObjectId) -> StoreResult<Option<Content>>;
}

#[cfg(test)]
mod tests {
    use super::{ObjectId, StoreError};

    #[test]
    fn generated_ids_parse_back() {
        let id = ObjectId::generate();
        let parsed: ObjectId = id.as_str().parse().expect("generated id should parse");
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let parsed: ObjectId = " 0123456789ABCDEF0123456789abcdef "
            .parse()
            .expect("hex id should parse");
        assert_eq!(parsed.as_str(), "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn parse_rejects_non_hex() {
        let err = "not-an-id".parse::<ObjectId>().unwrap_err();
        assert!(matches!(err, StoreError::InvalidObjectId(value) if value == "not-an-id"));
    }
}
