//! The in-memory key/value store
//!
//! Holds the committed snapshot as an immutable sorted mapping behind an
//! `Arc`; installing a commit swaps the `Arc`, so snapshots handed to
//! transactions stay valid and independently readable forever. The single
//! mutex is taken only while creating a transaction's snapshot and while
//! committing - buffered reads and writes never contend on it.

use crate::ops::Snapshot;
use crate::transaction::Transaction;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared store state guarded by the commit lock
pub(crate) struct StoreState {
    /// The latest committed snapshot
    pub(crate) committed: Arc<Snapshot>,
    /// Monotonic sequence counter; stamped onto writes at install time
    pub(crate) next_sequence: u64,
}

/// Snapshot-isolated transactional key/value store
///
/// Cloning the handle is cheap and shares the underlying store.
#[derive(Clone)]
pub struct InMemoryKeyValueStore {
    pub(crate) shared: Arc<Mutex<StoreState>>,
}

impl InMemoryKeyValueStore {
    /// Create an empty store
    pub fn new() -> Self {
        InMemoryKeyValueStore {
            shared: Arc::new(Mutex::new(StoreState {
                committed: Arc::new(Snapshot::new()),
                next_sequence: 0,
            })),
        }
    }

    /// Open a transaction against a private copy of the committed snapshot
    ///
    /// The copy is taken under the store lock; from then on the
    /// transaction reads and writes without any locking until commit.
    pub fn create_transaction(&self) -> Transaction {
        let state = self.shared.lock();
        Transaction::new(Arc::clone(&self.shared), (*state.committed).clone())
    }

    /// Number of committed entries across all tables
    pub fn entry_count(&self) -> usize {
        self.shared.lock().committed.len()
    }

    /// The committed snapshot (for persistence and diagnostics)
    pub(crate) fn committed(&self) -> (Arc<Snapshot>, u64) {
        let state = self.shared.lock();
        (Arc::clone(&state.committed), state.next_sequence)
    }

    /// Replace the committed state wholesale (used by `load`)
    pub(crate) fn install(&self, snapshot: Snapshot, next_sequence: u64) {
        let mut state = self.shared.lock();
        state.committed = Arc::new(snapshot);
        state.next_sequence = next_sequence;
    }
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}
