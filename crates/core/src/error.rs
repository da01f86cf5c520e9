//! Error types for the cascade crates
//!
//! This module defines all error types used throughout the system.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! The taxonomy distinguishes four families:
//!
//! - **Argument errors**: rejected synchronously at the call boundary,
//!   never deferred ([`Error::InvalidArgument`]).
//! - **Write conflicts**: raised only at transaction commit when replay
//!   disagrees with the buffered result ([`Error::WriteConflict`]). Never
//!   retried internally; retry is the caller's job.
//! - **Protocol misuse**: double commit, commit with open item streams,
//!   operating on a closed transaction. Programmer errors, not transient
//!   conditions.
//! - **Emission failures**: a type the emitter builder cannot handle, a
//!   non-finite number, a null object key.

use std::io;
use thiserror::Error;

/// Result type alias for cascade operations
pub type Result<T> = std::result::Result<T, Error>;

/// Logical failure of a single store operation
///
/// These arise while buffering a transaction (e.g. `add` on a key that
/// already exists). They are recorded in the transaction's operation log
/// *and* re-raised to the caller immediately; buffering never suppresses
/// them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// `add` found the key already present
    #[error("key already exists: {0:?}")]
    KeyAlreadyExists(String),

    /// `get`, `update` or `remove` found no such key
    #[error("key not found: {0:?}")]
    KeyNotFound(String),
}

/// Error types for the cascade crates
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid argument (null/empty required input, reserved characters)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A store operation failed logically (key present/absent)
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// Transaction commit detected a conflicting concurrent commit
    ///
    /// The committed snapshot is unchanged; the transaction is terminal.
    #[error("write conflict detected while committing (operation {operation_index})")]
    WriteConflict {
        /// Index into the transaction's operation log of the first mismatch
        operation_index: usize,
    },

    /// Operation attempted on a committed or rolled-back transaction
    #[error("transaction is no longer open: {status}")]
    TransactionClosed {
        /// The terminal status the transaction is in
        status: String,
    },

    /// A checkpoint is already being written
    #[error("a checkpoint is already in flight")]
    CheckpointInFlight,

    /// A differential checkpoint was requested with no full checkpoint to fold into
    #[error("no full checkpoint exists to apply a differential update to")]
    NoFullCheckpoint,

    /// Commit or rollback called on an already-finished writer
    #[error("checkpoint writer already committed or rolled back")]
    WriterAlreadyFinished,

    /// Commit called while item streams are still open
    #[error("cannot commit checkpoint: {open} item stream(s) still open")]
    ItemStreamsOpen {
        /// Number of streams not yet closed
        open: usize,
    },

    /// Checkpoint reader found no such item
    #[error("checkpoint item not found: {category:?}/{key:?}")]
    ItemNotFound {
        /// Category the item was looked up in
        category: String,
        /// Item key
        key: String,
    },

    /// The emitter builder cannot produce an emitter for this runtime type
    ///
    /// The dispatch cache is left unmodified; the next attempt retries
    /// discovery.
    #[error("no JSON emitter available for type {type_name}")]
    UnsupportedType {
        /// Diagnostic name of the offending type
        type_name: &'static str,
    },

    /// NaN or infinity has no JSON representation
    #[error("non-finite numbers cannot be emitted as JSON")]
    NonFiniteNumber,

    /// A JSON object key was null
    #[error("JSON object keys must not be null")]
    NullKey,

    /// I/O error from a streaming sink or dump reader/writer
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Persistence dump could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),
}
