//! Repository layer for the local draft cache.
//!
//! # Responsibility
//! - Define draft cache access contracts.
//! - Keep SQL details out of the sync service.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod draft_repo;
