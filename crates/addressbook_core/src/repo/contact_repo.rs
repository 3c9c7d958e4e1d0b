//! Contact repository contract and store-backed implementation.
//!
//! # Responsibility
//! - Provide CRUD, name search and picture content APIs for contacts.
//! - Translate between `Contact` and store objects via `CONTACT_MAPPING`.
//!
//! # Invariants
//! - Write paths call `Contact::validate()` before touching the store.
//! - Missing records are `Ok(None)` on reads and `NotFound` on writes.
//! - Store failures other than a missing object pass through as `Store`.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::model::contact::{Contact, ContactId, ContactValidationError};
use crate::model::mapping::{ContactField, EntityMapping, CONTACT_MAPPING};
use crate::repo::query::ContactQuery;
use crate::store::{AttributeFilter, ContentStore, StoreError};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contact persistence, search and content transfer.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContactValidationError),
    InvalidArgument(String),
    NotFound(String),
    InvalidData(String),
    Io(std::io::Error),
    Store(StoreError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidArgument(message) => write!(f, "invalid argument: {message}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::InvalidData(message) => write!(f, "invalid persisted contact data: {message}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::InvalidArgument(_) | Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::ObjectNotFound(id) => Self::NotFound(format!("contact {id}")),
            other => Self::Store(other),
        }
    }
}

/// Repository interface for contacts.
pub trait ContactRepository {
    /// Creates the contact when it has no id, otherwise overwrites it.
    fn save(&self, contact: &Contact) -> RepoResult<Contact>;
    fn find_one(&self, id: &ContactId) -> RepoResult<Option<Contact>>;
    /// Every stored contact, fetched page by page on iteration.
    fn find_all(&self) -> ContactQuery<'_>;
    /// Contacts whose name contains `substring` (case-sensitive).
    fn find_by_name_containing(&self, substring: &str) -> ContactQuery<'_>;
    fn delete(&self, contact: &Contact) -> RepoResult<()>;
    /// Attaches the file at `source_path` as the contact's content.
    fn set_content(
        &self,
        contact: &Contact,
        file_extension: &str,
        source_path: &Path,
    ) -> RepoResult<()>;
    /// Writes the contact's content to `destination_path` and returns the
    /// path actually written.
    fn get_content(&self, contact: &Contact, destination_path: &Path) -> RepoResult<PathBuf>;
}

/// Contact repository forwarding to any `ContentStore`.
pub struct StoreContactRepository<'store> {
    store: &'store dyn ContentStore,
    mapping: &'static EntityMapping,
    page_size: u32,
}

impl<'store> StoreContactRepository<'store> {
    /// Builds a repository after checking the contact mapping table.
    pub fn try_new(store: &'store dyn ContentStore) -> RepoResult<Self> {
        CONTACT_MAPPING.check().map_err(RepoError::InvalidData)?;
        Ok(Self {
            store,
            mapping: &CONTACT_MAPPING,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    /// Sets how many contacts each store call fetches during iteration.
    pub fn with_page_size(mut self, page_size: u32) -> RepoResult<Self> {
        if page_size == 0 {
            return Err(RepoError::InvalidArgument(
                "page size must be greater than zero".to_string(),
            ));
        }
        self.page_size = page_size;
        Ok(self)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn query(&self, filter: Option<AttributeFilter>) -> ContactQuery<'_> {
        ContactQuery::new(self.store, self.mapping, filter, self.page_size)
    }
}

impl ContactRepository for StoreContactRepository<'_> {
    fn save(&self, contact: &Contact) -> RepoResult<Contact> {
        contact.validate()?;
        let attributes = self.mapping.to_attributes(contact);

        let id = match &contact.id {
            Some(id) => {
                self.store
                    .update_object(self.mapping.object_type, id, &attributes)?;
                debug!("event=contact_save module=repo status=ok mode=update id={id}");
                id.clone()
            }
            None => {
                let id = self
                    .store
                    .create_object(self.mapping.object_type, &attributes)?;
                debug!("event=contact_save module=repo status=ok mode=create id={id}");
                id
            }
        };

        let mut saved = contact.clone();
        saved.id = Some(id);
        Ok(saved)
    }

    fn find_one(&self, id: &ContactId) -> RepoResult<Option<Contact>> {
        let Some(object) = self.store.get_object(id)? else {
            return Ok(None);
        };
        if object.object_type != self.mapping.object_type {
            return Ok(None);
        }
        self.mapping
            .from_object(&object)
            .map(Some)
            .map_err(RepoError::InvalidData)
    }

    fn find_all(&self) -> ContactQuery<'_> {
        self.query(None)
    }

    fn find_by_name_containing(&self, substring: &str) -> ContactQuery<'_> {
        self.query(Some(AttributeFilter::Contains {
            attribute: self.mapping.attribute_for(ContactField::Name).to_string(),
            value: substring.to_string(),
        }))
    }

    fn delete(&self, contact: &Contact) -> RepoResult<()> {
        let id = require_id(contact, "delete")?;
        self.store.delete_object(self.mapping.object_type, id)?;
        debug!("event=contact_delete module=repo status=ok id={id}");
        Ok(())
    }

    fn set_content(
        &self,
        contact: &Contact,
        file_extension: &str,
        source_path: &Path,
    ) -> RepoResult<()> {
        let id = require_id(contact, "set content for")?;
        let format = normalize_format(file_extension)?;
        let data = std::fs::read(source_path)?;

        self.store.set_content(id, &format, &data)?;
        debug!(
            "event=content_set module=repo status=ok id={} format={} bytes={}",
            id,
            format,
            data.len()
        );
        Ok(())
    }

    fn get_content(&self, contact: &Contact, destination_path: &Path) -> RepoResult<PathBuf> {
        let id = require_id(contact, "get content for")?;
        let content = self
            .store
            .get_content(id)?
            .ok_or_else(|| RepoError::NotFound(format!("content for contact {id}")))?;

        let target = if destination_path.extension().is_some() || content.format.is_empty() {
            destination_path.to_path_buf()
        } else {
            destination_path.with_extension(&content.format)
        };
        std::fs::write(&target, &content.data)?;
        debug!(
            "event=content_get module=repo status=ok id={} format={} bytes={}",
            id,
            content.format,
            content.data.len()
        );
        Ok(target)
    }
}

fn require_id<'c>(contact: &'c Contact, action: &str) -> RepoResult<&'c ContactId> {
    contact.id.as_ref().ok_or_else(|| {
        RepoError::InvalidArgument(format!("cannot {action} a contact without an id"))
    })
}

/// Lowercases the extension and strips a leading dot.
fn normalize_format(file_extension: &str) -> RepoResult<String> {
    let format = file_extension.trim().trim_start_matches('.').to_ascii_lowercase();
    if format.is_empty() {
        return Err(RepoError::InvalidArgument(
            "content file extension cannot be empty".to_string(),
        ));
    }
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::{normalize_format, require_id, RepoError};
    use crate::model::contact::Contact;
    use crate::store::{ObjectId, StoreError};

    #[test]
    fn normalize_format_strips_dot_and_lowercases() {
        assert_eq!(normalize_format(".PNG").unwrap(), "png");
        assert_eq!(normalize_format(" jpeg ").unwrap(), "jpeg");
        assert!(matches!(
            normalize_format("."),
            Err(RepoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn require_id_rejects_unsaved_contact() {
        let contact = Contact::new("Unsaved", "", "");
        let err = require_id(&contact, "delete").unwrap_err();
        assert!(err.to_string().contains("without an id"));
    }

    #[test]
    fn missing_object_becomes_not_found() {
        let id = ObjectId::generate();
        let err = RepoError::from(StoreError::ObjectNotFound(id.clone()));
        assert!(matches!(err, RepoError::NotFound(what) if what.contains(id.as_str())));
    }

    #[test]
    fn other_store_errors_pass_through() {
        let err = RepoError::from(StoreError::InvalidData("broken".to_string()));
        assert!(matches!(err, RepoError::Store(StoreError::InvalidData(_))));
    }
}
