//! Static field-to-attribute mapping for persisted entities.
//!
//! # Responsibility
//! - Bind each `Contact` field to a named docbase attribute.
//! - Convert between `Contact` and the store's attribute maps.
//!
//! # Invariants
//! - Every contact field has exactly one binding.
//! - Attribute names are unique within one mapping.

use crate::model::contact::Contact;
use crate::store::{Attributes, StoredObject};
use std::collections::BTreeSet;

/// Scalar fields of `Contact` that are persisted as attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactField {
    Name,
    Email,
    Telephone,
}

impl ContactField {
    pub const ALL: [ContactField; 3] = [Self::Name, Self::Email, Self::Telephone];

    fn read(self, contact: &Contact) -> &str {
        match self {
            Self::Name => &contact.name,
            Self::Email => &contact.email,
            Self::Telephone => &contact.telephone,
        }
    }

    fn slot(self, contact: &mut Contact) -> &mut String {
        match self {
            Self::Name => &mut contact.name,
            Self::Email => &mut contact.email,
            Self::Telephone => &mut contact.telephone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeBinding {
    pub field: ContactField,
    pub attribute: &'static str,
}

/// Object type plus attribute bindings for one entity.
#[derive(Debug, Clone, Copy)]
pub struct EntityMapping {
    pub object_type: &'static str,
    pub bindings: &'static [AttributeBinding],
}

/// Contacts live in `contact` objects; the name is the standard
/// `object_name` attribute so the docbase can search it like any other object.
pub const CONTACT_MAPPING: EntityMapping = EntityMapping {
    object_type: "contact",
    bindings: &[
        AttributeBinding {
            field: ContactField::Name,
            attribute: "object_name",
        },
        AttributeBinding {
            field: ContactField::Email,
            attribute: "email",
        },
        AttributeBinding {
            field: ContactField::Telephone,
            attribute: "telephone",
        },
    ],
};

impl EntityMapping {
    /// Checks that the table binds every field once and never reuses an
    /// attribute name.
    pub fn check(&self) -> Result<(), String> {
        if self.object_type.trim().is_empty() {
            return Err("mapping object type cannot be empty".to_string());
        }

        let mut attributes = BTreeSet::new();
        for binding in self.bindings {
            if !attributes.insert(binding.attribute) {
                return Err(format!(
                    "attribute `{}` is bound more than once in `{}`",
                    binding.attribute, self.object_type
                ));
            }
        }

        for field in ContactField::ALL {
            let count = self
                .bindings
                .iter()
                .filter(|binding| binding.field == field)
                .count();
            if count != 1 {
                return Err(format!(
                    "field {field:?} must be bound exactly once in `{}`, found {count}",
                    self.object_type
                ));
            }
        }

        Ok(())
    }

    /// Returns the attribute a field is stored under.
    ///
    /// Falls back to an empty name only for tables that failed `check()`.
    pub fn attribute_for(&self, field: ContactField) -> &'static str {
        self.bindings
            .iter()
            .find(|binding| binding.field == field)
            .map_or("", |binding| binding.attribute)
    }

    pub fn to_attributes(&self, contact: &Contact) -> Attributes {
        self.bindings
            .iter()
            .map(|binding| {
                (
                    binding.attribute.to_string(),
                    binding.field.read(contact).to_string(),
                )
            })
            .collect()
    }

    /// Rebuilds a contact from a stored object.
    ///
    /// # Errors
    /// - Returns a message when the object type differs or a bound attribute
    ///   is missing.
    pub fn from_object(&self, object: &StoredObject) -> Result<Contact, String> {
        if object.object_type != self.object_type {
            return Err(format!(
                "object {} has type `{}`, expected `{}`",
                object.id, object.object_type, self.object_type
            ));
        }

        let mut contact = Contact::new("", "", "");
        contact.id = Some(object.id.clone());
        for binding in self.bindings {
            let value = object.attributes.get(binding.attribute).ok_or_else(|| {
                format!(
                    "object {} is missing attribute `{}`",
                    object.id, binding.attribute
                )
            })?;
            *binding.field.slot(&mut contact) = value.clone();
        }
        Ok(contact)
    }
}

#[cfg(test)]
mod tests {
    use super::{AttributeBinding, ContactField, EntityMapping, CONTACT_MAPPING};
    use crate::model::contact::Contact;
    use crate::store::{ObjectId, StoredObject};

    #[test]
    fn contact_mapping_is_consistent() {
        CONTACT_MAPPING.check().expect("contact mapping should be valid");
        assert_eq!(CONTACT_MAPPING.attribute_for(ContactField::Name), "object_name");
    }

    #[test]
    fn duplicate_attribute_is_rejected() {
        let broken = EntityMapping {
            object_type: "contact",
            bindings: &[
                AttributeBinding {
                    field: ContactField::Name,
                    attribute: "object_name",
                },
                AttributeBinding {
                    field: ContactField::Email,
                    attribute: "object_name",
                },
                AttributeBinding {
                    field: ContactField::Telephone,
                    attribute: "telephone",
                },
            ],
        };
        let message = broken.check().expect_err("duplicate attribute must fail");
        assert!(message.contains("more than once"));
    }

    #[test]
    fn unbound_field_is_rejected() {
        let broken = EntityMapping {
            object_type: "contact",
            bindings: &[AttributeBinding {
                field: ContactField::Name,
                attribute: "object_name",
            }],
        };
        assert!(broken.check().is_err());
    }

    #[test]
    fn attributes_map_back_to_contact() {
        let mut contact = Contact::new("Alan Turing", "alan@example.com", "42");
        let id = ObjectId::generate();
        let object = StoredObject {
            id: id.clone(),
            object_type: "contact".to_string(),
            attributes: CONTACT_MAPPING.to_attributes(&contact),
        };

        let restored = CONTACT_MAPPING
            .from_object(&object)
            .expect("object should map back");
        contact.id = Some(id);
        assert_eq!(restored, contact);
    }

    #[test]
    fn foreign_object_type_is_rejected() {
        let object = StoredObject {
            id: ObjectId::generate(),
            object_type: "document".to_string(),
            attributes: Default::default(),
        };
        assert!(CONTACT_MAPPING.from_object(&object).is_err());
    }
}
