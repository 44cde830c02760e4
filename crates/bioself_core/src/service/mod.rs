//! Use-case services that span the draft cache and the encrypted store.
//!
//! # Responsibility
//! - Orchestrate repository calls and store operations.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod draft_sync_service;
