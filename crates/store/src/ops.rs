//! Reified store operations
//!
//! Every transactional operation is represented as an [`Operation`] value
//! that can be applied to a snapshot, producing an [`OperationResult`]
//! describing what was observed. The same apply runs twice per operation:
//! once while buffering (against the transaction's private snapshot) and
//! once at commit (against the latest committed snapshot). Structural
//! equality of the two results is the entire conflict oracle - presence,
//! absence, and sequence numbers encode both the read set and the write
//! set without modeling either explicitly.

use cascade_core::{OperationError, Sequenced};
use std::collections::BTreeMap;

/// The store's mapping type: composite key to sequenced payload
pub type Snapshot = BTreeMap<String, Sequenced<Vec<u8>>>;

/// A pending operation against the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Read a key's value
    Get { key: String },
    /// Insert a key that must not yet exist
    Add { key: String, value: Vec<u8> },
    /// Replace the value of a key that must exist
    Update { key: String, value: Vec<u8> },
    /// Remove a key that must exist
    Remove { key: String },
    /// Test for key presence
    Contains { key: String },
    /// List the item keys under a table prefix
    Enumerate { prefix: String },
}

/// What an operation observed when applied to a snapshot
///
/// Results compare structurally; a replay result differing from the
/// buffered result is a write conflict. Writes made by the transaction
/// itself carry the pending sequence marker, so comparison never depends
/// on how far the global counter advanced between buffering and commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// `Get` observed a value with this sequence
    Read { sequence: u64 },
    /// `Add` inserted a new entry
    Added,
    /// `Update` replaced a value that carried this sequence
    Updated { replaced: u64 },
    /// `Remove` removed a value that carried this sequence
    Removed { removed: u64 },
    /// `Contains` observed presence or absence
    Found(bool),
    /// `Enumerate` observed these item keys (prefix stripped)
    Keys(Vec<String>),
    /// The operation failed logically (key present/absent)
    Failed(OperationError),
}

impl Operation {
    /// Apply this operation to `snapshot`
    ///
    /// Returns the observed result and, for `Get`, the payload bytes for
    /// the caller. Mutations write values stamped with the pending
    /// sequence marker; real sequences are assigned when a commit
    /// installs the snapshot.
    pub fn apply(&self, snapshot: &mut Snapshot) -> (OperationResult, Option<Vec<u8>>) {
        match self {
            Operation::Get { key } => match snapshot.get(key) {
                Some(v) => (
                    OperationResult::Read {
                        sequence: v.sequence(),
                    },
                    Some(v.value().clone()),
                ),
                None => (
                    OperationResult::Failed(OperationError::KeyNotFound(key.clone())),
                    None,
                ),
            },
            Operation::Add { key, value } => {
                if snapshot.contains_key(key) {
                    (
                        OperationResult::Failed(OperationError::KeyAlreadyExists(key.clone())),
                        None,
                    )
                } else {
                    snapshot.insert(key.clone(), Sequenced::pending(value.clone()));
                    (OperationResult::Added, None)
                }
            }
            Operation::Update { key, value } => match snapshot.get(key).map(Sequenced::sequence) {
                Some(replaced) => {
                    snapshot.insert(key.clone(), Sequenced::pending(value.clone()));
                    (OperationResult::Updated { replaced }, None)
                }
                None => (
                    OperationResult::Failed(OperationError::KeyNotFound(key.clone())),
                    None,
                ),
            },
            Operation::Remove { key } => match snapshot.remove(key) {
                Some(v) => (
                    OperationResult::Removed {
                        removed: v.sequence(),
                    },
                    None,
                ),
                None => (
                    OperationResult::Failed(OperationError::KeyNotFound(key.clone())),
                    None,
                ),
            },
            Operation::Contains { key } => {
                (OperationResult::Found(snapshot.contains_key(key)), None)
            }
            Operation::Enumerate { prefix } => {
                let keys = snapshot
                    .range(prefix.clone()..)
                    .take_while(|(k, _)| k.starts_with(prefix.as_str()))
                    .map(|(k, _)| k[prefix.len()..].to_string())
                    .collect();
                (OperationResult::Keys(keys), None)
            }
        }
    }
}
