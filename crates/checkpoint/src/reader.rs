//! Checkpoint reader
//!
//! A read-only handle over the latest full checkpoint's store. Item reads
//! are stream-based: [`InMemoryStateReader::item_reader`] hands out a
//! cursor over a copy of the blob, so the caller's reads never contend
//! with concurrent folds.

use crate::state_store::InMemoryStateStore;
use cascade_core::{Error, Result};
use std::io::Cursor;
use std::sync::Arc;

/// Read-only view of a committed checkpoint
pub struct InMemoryStateReader {
    store: Arc<InMemoryStateStore>,
}

impl InMemoryStateReader {
    pub(crate) fn new(store: Arc<InMemoryStateStore>) -> Self {
        InMemoryStateReader { store }
    }

    /// Open a read stream over the item under `category`/`key`
    pub fn item_reader(&self, category: &str, key: &str) -> Result<Cursor<Vec<u8>>> {
        self.store
            .try_get_item(category, key)
            .map(Cursor::new)
            .ok_or_else(|| Error::ItemNotFound {
                category: category.to_string(),
                key: key.to_string(),
            })
    }

    /// Whether the checkpoint holds an item under `category`/`key`
    pub fn has_item(&self, category: &str, key: &str) -> bool {
        self.store.has_item(category, key)
    }

    /// Categories present in the checkpoint, sorted
    pub fn categories(&self) -> Vec<String> {
        self.store.categories()
    }

    /// Item keys under `category`, sorted
    pub fn item_keys(&self, category: &str) -> Vec<String> {
        self.store.item_keys(category)
    }
}
