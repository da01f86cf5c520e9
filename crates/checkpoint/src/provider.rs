//! Checkpoint storage provider
//!
//! Orchestrates the checkpoint lifecycle: at most one checkpoint is in
//! flight at any time, and exactly one "latest full" checkpoint
//! accumulates every committed differential update by folding. One mutex
//! guards the in-flight flag and the latest-full slot together, so
//! commit/rollback and new-checkpoint starts are mutually exclusive.

use crate::reader::InMemoryStateReader;
use crate::state_store::InMemoryStateStore;
use crate::writer::InMemoryStateWriter;
use cascade_core::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Whether a checkpoint carries the full state or only changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    /// Complete state; replaces the latest full checkpoint on commit
    Full,
    /// Adds/removals since the last full; folded into it on commit
    Differential,
}

/// A committed checkpoint: its store, kind, and timestamps
#[derive(Clone)]
pub struct CheckpointInfo {
    pub(crate) store: Arc<InMemoryStateStore>,
    kind: CheckpointKind,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

impl CheckpointInfo {
    pub(crate) fn new(store: Arc<InMemoryStateStore>, kind: CheckpointKind) -> Self {
        let now = Utc::now();
        CheckpointInfo {
            store,
            kind,
            created: now,
            updated: now,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated = Utc::now();
    }

    /// The checkpoint's kind
    pub fn kind(&self) -> CheckpointKind {
        self.kind
    }

    /// When this checkpoint was first created
    pub fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// When this checkpoint last absorbed a committed update
    pub fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

/// State guarded by the provider's single mutex
pub(crate) struct ProviderSlots {
    /// Whether a writer currently owns the in-flight slot
    pub(crate) in_flight: bool,
    /// The latest full checkpoint, with all differentials folded in
    pub(crate) latest_full: Option<CheckpointInfo>,
}

/// In-memory checkpoint lifecycle coordinator
///
/// Cloning the handle is cheap and shares the provider's state.
#[derive(Clone)]
pub struct InMemoryStorageProvider {
    slots: Arc<Mutex<ProviderSlots>>,
}

impl InMemoryStorageProvider {
    /// Create a provider with no checkpoints
    pub fn new() -> Self {
        InMemoryStorageProvider {
            slots: Arc::new(Mutex::new(ProviderSlots {
                in_flight: false,
                latest_full: None,
            })),
        }
    }

    /// Begin a full checkpoint
    ///
    /// Fails fast with [`Error::CheckpointInFlight`] if another
    /// checkpoint is being written.
    pub fn start_new_checkpoint(&self) -> Result<InMemoryStateWriter> {
        let mut slots = self.slots.lock();
        if slots.in_flight {
            return Err(Error::CheckpointInFlight);
        }
        slots.in_flight = true;
        info!(kind = "full", "checkpoint started");
        Ok(InMemoryStateWriter::new(
            Arc::clone(&self.slots),
            CheckpointKind::Full,
        ))
    }

    /// Begin a differential checkpoint against the latest full one
    ///
    /// Fails fast with [`Error::CheckpointInFlight`] if a checkpoint is
    /// being written, or [`Error::NoFullCheckpoint`] if there is nothing
    /// to fold a differential into - a doomed differential never occupies
    /// the in-flight slot.
    pub fn update_checkpoint(&self) -> Result<InMemoryStateWriter> {
        let mut slots = self.slots.lock();
        if slots.in_flight {
            return Err(Error::CheckpointInFlight);
        }
        if slots.latest_full.is_none() {
            return Err(Error::NoFullCheckpoint);
        }
        slots.in_flight = true;
        info!(kind = "differential", "checkpoint started");
        Ok(InMemoryStateWriter::new(
            Arc::clone(&self.slots),
            CheckpointKind::Differential,
        ))
    }

    /// Read the latest full checkpoint, if one has been committed
    ///
    /// The view already has every committed differential folded in;
    /// in-flight and differential-only checkpoints are never exposed.
    pub fn try_read_checkpoint(&self) -> Option<InMemoryStateReader> {
        let slots = self.slots.lock();
        slots
            .latest_full
            .as_ref()
            .map(|info| InMemoryStateReader::new(Arc::clone(&info.store)))
    }

    /// Kind and timestamps of the latest full checkpoint
    pub fn latest_checkpoint_info(&self) -> Option<CheckpointInfo> {
        self.slots.lock().latest_full.clone()
    }
}

impl Default for InMemoryStorageProvider {
    fn default() -> Self {
        Self::new()
    }
}
