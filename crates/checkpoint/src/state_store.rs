//! Category-keyed state store with removal tracking
//!
//! The building block of a checkpoint: byte blobs organized as
//! category -> key -> payload, plus a per-category removal log. The
//! removal log is a multiset - a key removed twice, or removed and then
//! re-added, keeps its full removal history rather than being
//! deduplicated, so a differential checkpoint replays deletions
//! faithfully when folded.
//!
//! The underlying maps are individually thread-safe (`DashMap`), so item
//! reads and writes need no external locking. Higher-level invariants
//! (single-use commit, no open streams) are the writer's job, not this
//! store's.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use cascade_core::{Error, Result};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::debug;

fn validate_category(category: &str) -> Result<()> {
    if category.is_empty() {
        return Err(Error::InvalidArgument(
            "category must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidArgument("key must not be empty".to_string()));
    }
    Ok(())
}

/// Thread-safe store of byte blobs used to build checkpoints
#[derive(Default)]
pub struct InMemoryStateStore {
    items: DashMap<String, DashMap<String, Vec<u8>>>,
    removals: DashMap<String, Vec<String>>,
}

impl InMemoryStateStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the blob stored under `category`/`key`
    pub fn add_or_update_item(&self, category: &str, key: &str, bytes: Vec<u8>) -> Result<()> {
        validate_category(category)?;
        validate_key(key)?;
        self.items
            .entry(category.to_string())
            .or_default()
            .insert(key.to_string(), bytes);
        Ok(())
    }

    /// Record the removal of `category`/`key`
    ///
    /// Appends to the removal history and drops any pending blob for the
    /// key in this store. Removing an absent key is not an error: a
    /// differential checkpoint may delete items that only exist in the
    /// full state it will be folded into.
    pub fn remove_item(&self, category: &str, key: &str) -> Result<()> {
        validate_category(category)?;
        validate_key(key)?;
        if let Some(items) = self.items.get(category) {
            items.remove(key);
        }
        self.removals
            .entry(category.to_string())
            .or_default()
            .push(key.to_string());
        Ok(())
    }

    /// Read a copy of the blob stored under `category`/`key`
    pub fn try_get_item(&self, category: &str, key: &str) -> Option<Vec<u8>> {
        self.items.get(category)?.get(key).map(|v| v.value().clone())
    }

    /// Whether a blob is stored under `category`/`key`
    pub fn has_item(&self, category: &str, key: &str) -> bool {
        self.items
            .get(category)
            .map(|c| c.contains_key(key))
            .unwrap_or(false)
    }

    /// Categories that currently hold at least one item
    pub fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .items
            .iter()
            .filter(|c| !c.value().is_empty())
            .map(|c| c.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Item keys stored under `category`, sorted
    pub fn item_keys(&self, category: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .items
            .get(category)
            .map(|c| c.iter().map(|e| e.key().clone()).collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }

    /// The removal history recorded for `category`, in recording order
    pub fn removed_keys(&self, category: &str) -> Vec<String> {
        self.removals
            .get(category)
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Total number of stored items across all categories
    pub fn item_count(&self) -> usize {
        self.items.iter().map(|c| c.value().len()).sum()
    }

    /// Fold `source`'s content and removal log into this store
    ///
    /// Per category, removals are applied before additions, so a key
    /// deleted and re-added within `source` survives the fold with its
    /// new value (last writer wins per key). Categories are visited in
    /// the source map's iteration order; callers must not rely on any
    /// cross-category ordering. `source` is cleared afterwards.
    pub fn update(&self, source: &InMemoryStateStore) {
        for entry in source.removals.iter() {
            let category = entry.key();
            for key in entry.value().iter() {
                if let Some(items) = self.items.get(category) {
                    items.remove(key);
                }
                self.removals
                    .entry(category.clone())
                    .or_default()
                    .push(key.clone());
            }
        }

        for category in source.items.iter() {
            let target = self.items.entry(category.key().clone()).or_default();
            for item in category.value().iter() {
                target.insert(item.key().clone(), item.value().clone());
            }
        }

        debug!(
            items = self.item_count(),
            "folded differential state store"
        );
        source.clear();
    }

    /// Purge all items and removal history
    pub fn clear(&self) {
        self.items.clear();
        self.removals.clear();
    }

    /// Write the item set as a JSON dump with Base64 payloads
    ///
    /// Removal history is intentionally not persisted; the dump is a
    /// debugging/export aid whose only contract is that `save` followed
    /// by [`Self::load`] reproduces the category/key/value set.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        let mut categories: Vec<CategoryDump> = Vec::new();
        for name in self.categories() {
            let mut entries = Vec::new();
            for key in self.item_keys(&name) {
                if let Some(bytes) = self.try_get_item(&name, &key) {
                    entries.push(EntryDump {
                        key,
                        data: STANDARD.encode(bytes),
                    });
                }
            }
            categories.push(CategoryDump { name, entries });
        }
        serde_json::to_writer(writer, &StateDump { categories })
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Rebuild a store from a dump produced by [`Self::save`]
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let dump: StateDump =
            serde_json::from_reader(reader).map_err(|e| Error::Serialization(e.to_string()))?;
        let store = InMemoryStateStore::new();
        for category in dump.categories {
            for entry in category.entries {
                let bytes = STANDARD
                    .decode(&entry.data)
                    .map_err(|e| Error::Serialization(e.to_string()))?;
                store.add_or_update_item(&category.name, &entry.key, bytes)?;
            }
        }
        Ok(store)
    }
}

#[derive(Serialize, Deserialize)]
struct StateDump {
    categories: Vec<CategoryDump>,
}

#[derive(Serialize, Deserialize)]
struct CategoryDump {
    name: String,
    entries: Vec<EntryDump>,
}

#[derive(Serialize, Deserialize)]
struct EntryDump {
    key: String,
    data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_get_remove() {
        let store = InMemoryStateStore::new();
        store.add_or_update_item("c", "k", vec![1, 2]).unwrap();
        assert_eq!(store.try_get_item("c", "k"), Some(vec![1, 2]));
        assert!(store.has_item("c", "k"));

        store.add_or_update_item("c", "k", vec![3]).unwrap();
        assert_eq!(store.try_get_item("c", "k"), Some(vec![3]));

        store.remove_item("c", "k").unwrap();
        assert!(!store.has_item("c", "k"));
        assert_eq!(store.removed_keys("c"), vec!["k"]);
    }

    #[test]
    fn test_argument_validation() {
        let store = InMemoryStateStore::new();
        assert!(matches!(
            store.add_or_update_item("", "k", vec![]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            store.add_or_update_item("c", "", vec![]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            store.remove_item("", "k"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_removal_history_is_a_multiset() {
        let store = InMemoryStateStore::new();
        store.remove_item("c", "k").unwrap();
        store.add_or_update_item("c", "k", vec![1]).unwrap();
        store.remove_item("c", "k").unwrap();
        // Two removals, in order, despite the intervening re-add.
        assert_eq!(store.removed_keys("c"), vec!["k", "k"]);
    }

    #[test]
    fn test_update_applies_removals_before_adds() {
        let full = InMemoryStateStore::new();
        full.add_or_update_item("c", "k", vec![1]).unwrap();

        // Differential: delete k, then write it again with a new value.
        let diff = InMemoryStateStore::new();
        diff.remove_item("c", "k").unwrap();
        diff.add_or_update_item("c", "k", vec![2]).unwrap();

        full.update(&diff);
        assert_eq!(full.try_get_item("c", "k"), Some(vec![2]));
        // The source was drained by the fold.
        assert_eq!(diff.item_count(), 0);
        assert!(diff.removed_keys("c").is_empty());
    }

    #[test]
    fn test_update_removes_from_target() {
        let full = InMemoryStateStore::new();
        full.add_or_update_item("c", "k", vec![1]).unwrap();
        full.add_or_update_item("c", "other", vec![9]).unwrap();

        let diff = InMemoryStateStore::new();
        diff.remove_item("c", "k").unwrap();

        full.update(&diff);
        assert!(!full.has_item("c", "k"));
        assert!(full.has_item("c", "other"));
        // The target inherits the removal history.
        assert_eq!(full.removed_keys("c"), vec!["k"]);
    }

    #[test]
    fn test_clear_purges_everything() {
        let store = InMemoryStateStore::new();
        store.add_or_update_item("c", "k", vec![1]).unwrap();
        store.remove_item("c", "gone").unwrap();
        store.clear();
        assert_eq!(store.item_count(), 0);
        assert!(store.removed_keys("c").is_empty());
        assert!(store.categories().is_empty());
    }

    #[test]
    fn test_save_load_round_trip_drops_removals() {
        let store = InMemoryStateStore::new();
        store.add_or_update_item("a", "x", vec![1, 2, 3]).unwrap();
        store.add_or_update_item("b", "y", vec![]).unwrap();
        store.remove_item("a", "gone").unwrap();

        let mut buf = Vec::new();
        store.save(&mut buf).unwrap();
        let restored = InMemoryStateStore::load(buf.as_slice()).unwrap();

        assert_eq!(restored.try_get_item("a", "x"), Some(vec![1, 2, 3]));
        assert_eq!(restored.try_get_item("b", "y"), Some(vec![]));
        // Removal history does not survive the dump format.
        assert!(restored.removed_keys("a").is_empty());
    }
}
