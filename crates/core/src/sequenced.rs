//! Sequenced values
//!
//! A [`Sequenced`] wraps a payload with a monotonically assigned sequence
//! number. The store stamps every committed mutation with a fresh sequence,
//! so two observations of the same key can be compared for staleness by
//! sequence alone, without diffing payloads.

use serde::{Deserialize, Serialize};

/// Sequence number reserved for values written by a not-yet-committed
/// transaction.
///
/// Pending values are re-stamped with real sequences, under the commit
/// lock, when the transaction's snapshot is installed. Keeping the marker
/// out of the committed range means replay-result comparison never depends
/// on how far the global counter advanced in the meantime.
pub const PENDING_SEQUENCE: u64 = u64::MAX;

/// A payload tagged with a version/sequence marker used to detect staleness
///
/// Committed sequences start at 1 and strictly increase; `0` is never
/// assigned, and [`PENDING_SEQUENCE`] is reserved for uncommitted writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequenced<T> {
    sequence: u64,
    value: T,
}

impl<T> Sequenced<T> {
    /// Wrap `value` with the given sequence number
    pub fn new(sequence: u64, value: T) -> Self {
        Sequenced { sequence, value }
    }

    /// Wrap `value` with the pending (uncommitted) marker
    pub fn pending(value: T) -> Self {
        Sequenced {
            sequence: PENDING_SEQUENCE,
            value,
        }
    }

    /// The sequence number assigned to this value
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Whether this value was written by a not-yet-committed transaction
    pub fn is_pending(&self) -> bool {
        self.sequence == PENDING_SEQUENCE
    }

    /// Borrow the payload
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consume the wrapper, yielding the payload
    pub fn into_value(self) -> T {
        self.value
    }

    /// Replace the sequence number, keeping the payload
    pub fn with_sequence(self, sequence: u64) -> Self {
        Sequenced {
            sequence,
            value: self.value,
        }
    }

    /// Stamp the value with a real sequence number in place
    ///
    /// Used when a commit installs a snapshot: pending writes receive
    /// their final sequences under the commit lock.
    pub fn stamp(&mut self, sequence: u64) {
        self.sequence = sequence;
    }
}
