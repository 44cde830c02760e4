//! Durable file I/O and the on-disk store envelope.
//!
//! # Responsibility
//! - Write the encrypted blob atomically and read it back in one pass.
//! - Own the self-describing byte layout of the store file.
//!
//! # Invariants
//! - The target file is always either the previous or the next complete blob.
//! - Creating a store never replaces a file that appeared concurrently.
//! - No partial decrypt: the envelope is decoded from the whole file.

mod atomic;
mod envelope;

pub use atomic::{read_all, temp_sibling_path, write_atomic, write_new, FileError};
pub use envelope::{header_prefix, Envelope, EnvelopeError, FORMAT_VERSION, MAGIC};
