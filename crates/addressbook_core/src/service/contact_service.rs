//! Contact use-case service.
//!
//! # Responsibility
//! - Provide stable entry points for CLI and other core callers.
//! - Orchestrate bulk setup (import, purge) on top of the repository.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - Service layer remains store-agnostic.

use crate::model::contact::{Contact, ContactId};
use crate::repo::contact_repo::{ContactRepository, RepoError, RepoResult};
use crate::repo::query::ContactQuery;
use crate::setup::{generate_email_address, ContactRow};
use log::{error, info};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Use-case wrapper around a contact repository.
pub struct ContactService<R: ContactRepository> {
    repo: R,
}

impl<R: ContactRepository> ContactService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates a contact from its three attributes.
    pub fn create_contact(
        &self,
        name: impl Into<String>,
        email: impl Into<String>,
        telephone: impl Into<String>,
    ) -> RepoResult<Contact> {
        self.repo.save(&Contact::new(name, email, telephone))
    }

    pub fn save(&self, contact: &Contact) -> RepoResult<Contact> {
        self.repo.save(contact)
    }

    pub fn find_one(&self, id: &ContactId) -> RepoResult<Option<Contact>> {
        self.repo.find_one(id)
    }

    /// Loads a contact that callers expect to exist.
    ///
    /// Turns absence into `RepoError::NotFound`.
    pub fn require(&self, id: &ContactId) -> RepoResult<Contact> {
        self.repo
            .find_one(id)?
            .ok_or_else(|| RepoError::NotFound(format!("contact {id}")))
    }

    pub fn find_all(&self) -> ContactQuery<'_> {
        self.repo.find_all()
    }

    pub fn find_by_name_containing(&self, substring: &str) -> ContactQuery<'_> {
        self.repo.find_by_name_containing(substring)
    }

    pub fn delete(&self, contact: &Contact) -> RepoResult<()> {
        self.repo.delete(contact)
    }

    pub fn set_content(
        &self,
        contact: &Contact,
        file_extension: &str,
        source_path: &Path,
    ) -> RepoResult<()> {
        self.repo.set_content(contact, file_extension, source_path)
    }

    pub fn get_content(&self, contact: &Contact, destination_path: &Path) -> RepoResult<PathBuf> {
        self.repo.get_content(contact, destination_path)
    }

    /// Creates one contact per row with a derived dummy email.
    ///
    /// Stops at the first failing row; contacts saved before it remain.
    ///
    /// # Side effects
    /// - Emits `contact_import` logging events with counts and duration.
    pub fn import_contacts<G: Rng + ?Sized>(
        &self,
        rows: &[ContactRow],
        rng: &mut G,
    ) -> RepoResult<Vec<Contact>> {
        let started_at = Instant::now();
        info!(
            "event=contact_import module=service status=start rows={}",
            rows.len()
        );

        let mut created = Vec::with_capacity(rows.len());
        for row in rows {
            let email = generate_email_address(&row.name, &mut *rng);
            let contact = Contact::new(row.name.as_str(), email, row.telephone.as_str());
            match self.repo.save(&contact) {
                Ok(saved) => created.push(saved),
                Err(err) => {
                    error!(
                        "event=contact_import module=service status=error imported={} duration_ms={} error={}",
                        created.len(),
                        started_at.elapsed().as_millis(),
                        err
                    );
                    return Err(err);
                }
            }
        }

        info!(
            "event=contact_import module=service status=ok imported={} duration_ms={}",
            created.len(),
            started_at.elapsed().as_millis()
        );
        Ok(created)
    }

    /// Deletes every stored contact and returns how many were removed.
    pub fn delete_all_contacts(&self) -> RepoResult<usize> {
        let started_at = Instant::now();
        let mut deleted = 0;

        for contact in &self.repo.find_all() {
            self.repo.delete(&contact?)?;
            deleted += 1;
        }

        info!(
            "event=contact_purge module=service status=ok deleted={} duration_ms={}",
            deleted,
            started_at.elapsed().as_millis()
        );
        Ok(deleted)
    }
}
