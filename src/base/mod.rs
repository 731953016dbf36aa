//! Base types and error handling.
//!
//! Provides the crate-wide error taxonomy:
//! - [`EntityError`]: typed failures for header conflicts, payload
//!   transformation, and transport delivery, with a 400/500 classifier.

pub mod error;

pub use error::EntityError;
