//! Repository layer over the content-store boundary.
//!
//! # Responsibility
//! - Define the contact data access contract used by services and the CLI.
//! - Keep store object/attribute details out of service code.
//!
//! # Invariants
//! - Repositories return semantic errors (`NotFound`, `InvalidArgument`) in
//!   addition to store transport errors.
//! - Finders return lazy query handles, never eagerly loaded lists.

pub mod contact_repo;
pub mod query;
