//! Shared foundation for the cascade crates
//!
//! This crate defines the error taxonomy used across the emitter, the
//! key/value store, and the checkpoint backend, together with the
//! [`Sequenced`] versioned-payload wrapper the store is built on.
//!
//! Nothing here performs I/O or holds locks; it is pure types.

pub mod error;
pub mod sequenced;

pub use error::{Error, OperationError, Result};
pub use sequenced::Sequenced;
