//! Contact domain model.
//!
//! # Responsibility
//! - Define the only persisted entity of the address book.
//! - Validate scalar attributes before they reach the store.
//!
//! # Invariants
//! - `id` is assigned by the store on first save and never changes afterwards.
//! - `id == None` means the contact has not been persisted yet.
//! - Attribute widths never exceed the docbase column limits.

use crate::store::ObjectId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier of a persisted contact.
///
/// Contacts are plain store objects, so the id is the store object id.
pub type ContactId = ObjectId;

pub const NAME_MAX_CHARS: usize = 255;
/// Room for a full-width name used as a local part plus `@` and a domain.
pub const EMAIL_MAX_CHARS: usize = 320;
pub const TELEPHONE_MAX_CHARS: usize = 64;

/// Address book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Store-assigned id. `None` until the first save.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ContactId>,
    /// Display name. Used as the key for containment search.
    pub name: String,
    pub email: String,
    pub telephone: String,
}

/// Validation errors for contact attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    BlankName,
    TooLong {
        field: &'static str,
        max_chars: usize,
        actual_chars: usize,
    },
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "contact name cannot be blank"),
            Self::TooLong {
                field,
                max_chars,
                actual_chars,
            } => write!(
                f,
                "contact {field} is {actual_chars} characters long; at most {max_chars} allowed"
            ),
        }
    }
}

impl Error for ContactValidationError {}

impl Contact {
    /// Creates an unsaved contact.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        telephone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            telephone: telephone.into(),
        }
    }

    /// Returns whether the store already assigned an id.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Checks attribute constraints enforced before every write.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if self.name.trim().is_empty() {
            return Err(ContactValidationError::BlankName);
        }

        check_width("name", &self.name, NAME_MAX_CHARS)?;
        check_width("email", &self.email, EMAIL_MAX_CHARS)?;
        check_width("telephone", &self.telephone, TELEPHONE_MAX_CHARS)?;
        Ok(())
    }

    /// Returns `true` when both contacts carry the same scalar attributes.
    ///
    /// Ignores `id`, which is how round-trip checks compare saved records
    /// against their unsaved input.
    pub fn same_attributes(&self, other: &Contact) -> bool {
        self.name == other.name && self.email == other.email && self.telephone == other.telephone
    }
}

fn check_width(
    field: &'static str,
    value: &str,
    max_chars: usize,
) -> Result<(), ContactValidationError> {
    let actual_chars = value.chars().count();
    if actual_chars > max_chars {
        return Err(ContactValidationError::TooLong {
            field,
            max_chars,
            actual_chars,
        });
    }
    Ok(())
}
