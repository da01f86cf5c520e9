//! In-memory checkpoint backend: state store, provider, writer/reader
//!
//! A checkpoint accumulates category/key/byte-blob writes and deletions in
//! an [`InMemoryStateStore`]. The [`InMemoryStorageProvider`] owns the
//! checkpoint lifecycle: at most one checkpoint is in flight at a time,
//! a **full** checkpoint replaces the latest full state wholesale on
//! commit, and a **differential** checkpoint's adds and removals are
//! folded into it. Readers only ever see the latest full checkpoint with
//! all committed differentials folded in - never an in-flight or
//! differential-only view.
//!
//! # Example
//!
//! ```ignore
//! use cascade_checkpoint::InMemoryStorageProvider;
//! use std::io::Write;
//!
//! let provider = InMemoryStorageProvider::new();
//!
//! let writer = provider.start_new_checkpoint()?;
//! let mut item = writer.item_writer("subscriptions", "sub-1")?;
//! item.write_all(&[1, 2, 3])?;
//! item.close()?;
//! writer.commit()?;
//!
//! let reader = provider.try_read_checkpoint().unwrap();
//! ```
//!
//! Everything is synchronous and in-memory; durability across process
//! restarts is explicitly not provided.

pub mod provider;
pub mod reader;
pub mod state_store;
pub mod writer;

pub use provider::{CheckpointInfo, CheckpointKind, InMemoryStorageProvider};
pub use reader::InMemoryStateReader;
pub use state_store::InMemoryStateStore;
pub use writer::{InMemoryStateWriter, ItemWriter};
