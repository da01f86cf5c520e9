//! Transactions: buffering, replay, and the commit protocol
//!
//! Lifecycle: `Open -> {buffering}* -> Committed | RolledBack`. Terminal
//! states accept no further operations.
//!
//! While buffering, every operation is reified, applied immediately
//! against the transaction's private snapshot (so reads observe the
//! transaction's own uncommitted writes), and logged together with its
//! result. A logical failure (add on an existing key, update of a missing
//! one) is logged too and re-raised to the caller at once - buffering
//! never suppresses errors.
//!
//! Commit takes the store's single lock, replays the log in order against
//! the *currently* committed snapshot - which may have advanced since the
//! transaction opened - and compares every replay result with the
//! buffered one. All equal: the final snapshot is installed and pending
//! writes receive their real sequence numbers. Any mismatch: the whole
//! transaction aborts with a write conflict and the committed state is
//! untouched. Rollback simply discards the private snapshot; there is
//! nothing to undo at the store level.

use crate::key::{compose, table_prefix, validate_item_key, validate_table_name};
use crate::ops::{Operation, OperationResult, Snapshot};
use crate::store::StoreState;
use cascade_core::{Error, OperationError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

/// Where a transaction is in its lifecycle
///
/// `Committed` and `RolledBack` are terminal; no transitions out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Accepting operations
    Open,
    /// Commit succeeded; the snapshot was installed
    Committed,
    /// Rolled back by the caller or aborted by a write conflict
    RolledBack,
}

/// A buffered transaction over a private snapshot
pub struct Transaction {
    shared: Arc<Mutex<StoreState>>,
    snapshot: Snapshot,
    log: Vec<(Operation, OperationResult)>,
    status: TransactionStatus,
}

impl Transaction {
    pub(crate) fn new(shared: Arc<Mutex<StoreState>>, snapshot: Snapshot) -> Self {
        Transaction {
            shared,
            snapshot,
            log: Vec::new(),
            status: TransactionStatus::Open,
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Number of operations buffered so far
    pub fn operation_count(&self) -> usize {
        self.log.len()
    }

    /// Scope this transaction to one table
    pub fn table<'a>(&'a mut self, name: &str) -> Result<KeyValueTable<'a>> {
        validate_table_name(name)?;
        Ok(KeyValueTable {
            tx: self,
            table: name.to_string(),
        })
    }

    /// Replay the log against the latest committed state and install
    ///
    /// Fails with [`Error::WriteConflict`] if any replayed operation
    /// observes something different from what was buffered; the conflict
    /// leaves the committed snapshot unchanged and the transaction rolled
    /// back.
    pub fn commit(&mut self) -> Result<()> {
        self.ensure_open()?;
        let mut state = self.shared.lock();

        let mut replay: Snapshot = (*state.committed).clone();
        for (index, (op, expected)) in self.log.iter().enumerate() {
            let (actual, _) = op.apply(&mut replay);
            if actual != *expected {
                self.status = TransactionStatus::RolledBack;
                debug!(operation_index = index, "commit aborted: replay mismatch");
                return Err(Error::WriteConflict {
                    operation_index: index,
                });
            }
        }

        // Pending writes get their real sequences under the commit lock.
        for value in replay.values_mut() {
            if value.is_pending() {
                state.next_sequence += 1;
                value.stamp(state.next_sequence);
            }
        }

        state.committed = Arc::new(replay);
        self.status = TransactionStatus::Committed;
        debug!(
            operations = self.log.len(),
            sequence = state.next_sequence,
            "transaction committed"
        );
        Ok(())
    }

    /// Discard the transaction; the committed store is unaffected
    pub fn rollback(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.status = TransactionStatus::RolledBack;
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        match self.status {
            TransactionStatus::Open => Ok(()),
            status => Err(Error::TransactionClosed {
                status: format!("{:?}", status),
            }),
        }
    }

    /// Reify, apply to the private snapshot, log, and surface failures
    fn run(&mut self, op: Operation) -> Result<(OperationResult, Option<Vec<u8>>)> {
        self.ensure_open()?;
        let (result, value) = op.apply(&mut self.snapshot);
        self.log.push((op, result.clone()));
        if let OperationResult::Failed(err) = result {
            return Err(err.into());
        }
        Ok((result, value))
    }
}

/// A transaction scoped to one table's key namespace
pub struct KeyValueTable<'a> {
    tx: &'a mut Transaction,
    table: String,
}

impl KeyValueTable<'_> {
    /// Read the value of `key`
    pub fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        validate_item_key(key)?;
        let composite = compose(&self.table, key);
        let (_, value) = self.tx.run(Operation::Get {
            key: composite.clone(),
        })?;
        value.ok_or_else(|| OperationError::KeyNotFound(composite).into())
    }

    /// Insert `key`; fails if it already exists
    pub fn add(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        validate_item_key(key)?;
        self.tx
            .run(Operation::Add {
                key: compose(&self.table, key),
                value,
            })
            .map(|_| ())
    }

    /// Replace the value of an existing `key`
    pub fn update(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        validate_item_key(key)?;
        self.tx
            .run(Operation::Update {
                key: compose(&self.table, key),
                value,
            })
            .map(|_| ())
    }

    /// Remove an existing `key`
    pub fn remove(&mut self, key: &str) -> Result<()> {
        validate_item_key(key)?;
        self.tx
            .run(Operation::Remove {
                key: compose(&self.table, key),
            })
            .map(|_| ())
    }

    /// Whether `key` is present
    pub fn contains(&mut self, key: &str) -> Result<bool> {
        validate_item_key(key)?;
        match self.tx.run(Operation::Contains {
            key: compose(&self.table, key),
        })? {
            (OperationResult::Found(found), _) => Ok(found),
            _ => Ok(false),
        }
    }

    /// List this table's item keys, in sorted order, prefix stripped
    pub fn keys(&mut self) -> Result<Vec<String>> {
        match self.tx.run(Operation::Enumerate {
            prefix: table_prefix(&self.table),
        })? {
            (OperationResult::Keys(keys), _) => Ok(keys),
            _ => Ok(Vec::new()),
        }
    }
}
