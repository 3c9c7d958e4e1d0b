//! Restartable, lazily paginated contact result sets.
//!
//! # Invariants
//! - Creating a query performs no store call; each `iter()` starts a fresh
//!   fetch loop from the first page.
//! - Pages are fetched with an id cursor, so deleting already-yielded
//!   contacts mid-iteration neither skips nor repeats results.
//! - An iterator yields at most one error and then ends.

use crate::model::contact::Contact;
use crate::model::mapping::EntityMapping;
use crate::repo::contact_repo::{RepoError, RepoResult};
use crate::store::{AttributeFilter, ContentStore, ObjectId, ObjectQuery, StoredObject};
use std::collections::VecDeque;

/// Query handle returned by repository finders.
pub struct ContactQuery<'store> {
    store: &'store dyn ContentStore,
    mapping: &'static EntityMapping,
    filter: Option<AttributeFilter>,
    page_size: u32,
}

impl<'store> ContactQuery<'store> {
    pub(crate) fn new(
        store: &'store dyn ContentStore,
        mapping: &'static EntityMapping,
        filter: Option<AttributeFilter>,
        page_size: u32,
    ) -> Self {
        Self {
            store,
            mapping,
            filter,
            page_size: page_size.max(1),
        }
    }

    /// Starts a new pass over the result set.
    pub fn iter(&self) -> ContactIter<'_> {
        ContactIter {
            query: self,
            buffer: VecDeque::new(),
            cursor: None,
            exhausted: false,
        }
    }

    /// Drains one full pass into a vector, stopping at the first error.
    pub fn to_vec(&self) -> RepoResult<Vec<Contact>> {
        self.iter().collect()
    }
}

impl<'q> IntoIterator for &'q ContactQuery<'_> {
    type Item = RepoResult<Contact>;
    type IntoIter = ContactIter<'q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One pass over a [`ContactQuery`].
pub struct ContactIter<'q> {
    query: &'q ContactQuery<'q>,
    buffer: VecDeque<StoredObject>,
    cursor: Option<ObjectId>,
    exhausted: bool,
}

impl ContactIter<'_> {
    fn fetch_page(&mut self) -> RepoResult<()> {
        let request = ObjectQuery {
            object_type: self.query.mapping.object_type.to_string(),
            filter: self.query.filter.clone(),
            after: self.cursor.clone(),
            limit: self.query.page_size,
        };
        let page = self.query.store.query_objects(&request)?;

        if page.len() < self.query.page_size as usize {
            self.exhausted = true;
        }
        if let Some(last) = page.last() {
            self.cursor = Some(last.id.clone());
        }
        self.buffer.extend(page);
        Ok(())
    }

    fn stop(&mut self) {
        self.exhausted = true;
        self.buffer.clear();
    }
}

impl Iterator for ContactIter<'_> {
    type Item = RepoResult<Contact>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.fetch_page() {
                self.stop();
                return Some(Err(err));
            }
        }

        let object = self.buffer.pop_front()?;
        match self.query.mapping.from_object(&object) {
            Ok(contact) => Some(Ok(contact)),
            Err(message) => {
                self.stop();
                Some(Err(RepoError::InvalidData(message)))
            }
        }
    }
}

