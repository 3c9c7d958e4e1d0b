//! Address book domain model.
//!
//! # Responsibility
//! - Define the contact entity and its validation rules.
//! - Bind entity fields to docbase attributes through a static table.
//!
//! # Invariants
//! - Every persisted contact is identified by a store-assigned `ContactId`.
//! - Deletion is a hard delete delegated to the store.

pub mod contact;
pub mod mapping;
