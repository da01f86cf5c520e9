//! Transactional in-memory key/value store with optimistic concurrency
//!
//! The store holds an immutable sorted mapping from composite key to a
//! sequence-stamped byte payload and hands out snapshot-isolated
//! transactions. Each transaction buffers its operations as reified
//! commands against a private snapshot; at commit the log is replayed
//! against the latest committed state, and the whole transaction aborts
//! with a write conflict if any replay result differs from what was
//! observed at buffering time.
//!
//! # Example
//!
//! ```ignore
//! use cascade_store::InMemoryKeyValueStore;
//!
//! let store = InMemoryKeyValueStore::new();
//!
//! let mut tx = store.create_transaction();
//! tx.table("events")?.add("e1", vec![1, 2, 3])?;
//! tx.commit()?;
//!
//! let mut tx = store.create_transaction();
//! assert!(tx.table("events")?.contains("e1")?);
//! ```
//!
//! Conflict detection is immediate and never retried internally; a caller
//! that sees [`cascade_core::Error::WriteConflict`] opens a fresh
//! transaction and tries again.

pub mod key;
pub mod ops;
pub mod persist;
pub mod store;
pub mod transaction;

pub use ops::{Operation, OperationResult, Snapshot};
pub use store::InMemoryKeyValueStore;
pub use transaction::{KeyValueTable, Transaction, TransactionStatus};
