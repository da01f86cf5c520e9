//! Cascade - serialization and checkpointing primitives for reactive query engines
//!
//! Cascade bundles two leaf subsystems consumed by a query-engine host:
//!
//! - **Emitter**: a fast JSON emitter with type-specialized scalar routines
//!   and a polymorphic inline cache for runtime-type dispatch
//!   ([`EmitterContext`], [`emit`]).
//! - **Store**: a snapshot-isolated transactional key/value store with
//!   optimistic concurrency control, plus a full/differential checkpoint
//!   backend ([`InMemoryKeyValueStore`], [`InMemoryStorageProvider`]).
//!
//! # Quick Start
//!
//! ```ignore
//! use cascade::{InMemoryKeyValueStore, StringSink};
//!
//! // Transactional key/value access
//! let store = InMemoryKeyValueStore::new();
//! let mut tx = store.create_transaction();
//! tx.table("users")?.add("alice", vec![1, 2, 3])?;
//! tx.commit()?;
//!
//! // JSON emission
//! let mut out = String::new();
//! cascade::emit::emit_str(&mut StringSink::new(&mut out), "hello")?;
//! ```
//!
//! The two subsystems are independent; neither depends on the other.

pub use cascade_core::{Error, Result, Sequenced};

pub use cascade_emit as emit;
pub use cascade_emit::{EmitterBuilder, EmitterContext, StringSink, WriterSink};

pub use cascade_store::{
    InMemoryKeyValueStore, KeyValueTable, Transaction, TransactionStatus,
};

pub use cascade_checkpoint::{
    CheckpointKind, InMemoryStateReader, InMemoryStateStore, InMemoryStateWriter,
    InMemoryStorageProvider,
};
