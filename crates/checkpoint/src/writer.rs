//! Checkpoint writer and per-item streams
//!
//! A writer owns one checkpoint attempt's private [`InMemoryStateStore`].
//! Item writes go through [`ItemWriter`] streams that buffer in memory
//! and land in the private store as soon as the stream is closed (or
//! dropped) - item durability-to-memory is immediate, while commit and
//! rollback govern whether the *whole checkpoint* is adopted.
//!
//! Commit and rollback are single-use, enforced by an atomic exchange on
//! the finished flag; commit additionally refuses while item streams are
//! still open, tracked by an interlocked counter. These flags do not make
//! commit safe to race against an in-progress write - callers serialize
//! commit/rollback against stream disposal themselves.

use crate::provider::{CheckpointInfo, CheckpointKind, ProviderSlots};
use crate::state_store::InMemoryStateStore;
use cascade_core::{Error, Result};
use parking_lot::Mutex;
use std::io;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

/// Single-use handle writing one checkpoint
pub struct InMemoryStateWriter {
    store: Arc<InMemoryStateStore>,
    kind: CheckpointKind,
    slots: Arc<Mutex<ProviderSlots>>,
    open_streams: Arc<AtomicUsize>,
    finished: AtomicBool,
}

impl InMemoryStateWriter {
    pub(crate) fn new(slots: Arc<Mutex<ProviderSlots>>, kind: CheckpointKind) -> Self {
        InMemoryStateWriter {
            store: Arc::new(InMemoryStateStore::new()),
            kind,
            slots,
            open_streams: Arc::new(AtomicUsize::new(0)),
            finished: AtomicBool::new(false),
        }
    }

    /// The kind of checkpoint this writer produces
    pub fn kind(&self) -> CheckpointKind {
        self.kind
    }

    /// Open a buffered stream for the item under `category`/`key`
    ///
    /// The accumulated bytes are committed into the checkpoint's private
    /// store when the stream is closed or dropped, not deferred to
    /// [`Self::commit`].
    pub fn item_writer(&self, category: &str, key: &str) -> Result<ItemWriter> {
        self.ensure_active()?;
        // Validate before opening so a rejected stream never counts.
        if category.is_empty() {
            return Err(Error::InvalidArgument(
                "category must not be empty".to_string(),
            ));
        }
        if key.is_empty() {
            return Err(Error::InvalidArgument("key must not be empty".to_string()));
        }
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        Ok(ItemWriter {
            store: Arc::clone(&self.store),
            category: category.to_string(),
            key: key.to_string(),
            buf: Vec::new(),
            open_streams: Arc::clone(&self.open_streams),
            closed: false,
        })
    }

    /// Record the deletion of `category`/`key` in this checkpoint
    pub fn delete_item(&self, category: &str, key: &str) -> Result<()> {
        self.ensure_active()?;
        self.store.remove_item(category, key)
    }

    /// Adopt the checkpoint: fold it into the provider's state
    ///
    /// A full checkpoint becomes the latest full wholesale; a
    /// differential one is folded into the existing latest full. Fails if
    /// any item stream is still open or if the writer already finished.
    pub fn commit(&self) -> Result<()> {
        let open = self.open_streams.load(Ordering::SeqCst);
        if open != 0 {
            return Err(Error::ItemStreamsOpen { open });
        }
        self.take_finished()?;

        let mut slots = self.slots.lock();
        match self.kind {
            CheckpointKind::Full => {
                slots.latest_full = Some(CheckpointInfo::new(
                    Arc::clone(&self.store),
                    CheckpointKind::Full,
                ));
            }
            CheckpointKind::Differential => match slots.latest_full.as_mut() {
                Some(full) => {
                    full.store.update(&self.store);
                    full.touch();
                }
                // Guarded when the writer was handed out; kept as an error
                // rather than a panic for the caller that outlives a reset.
                None => {
                    slots.in_flight = false;
                    return Err(Error::NoFullCheckpoint);
                }
            },
        }
        slots.in_flight = false;
        info!(
            kind = ?self.kind,
            items = slots
                .latest_full
                .as_ref()
                .map(|f| f.store.item_count())
                .unwrap_or(0),
            "checkpoint committed"
        );
        Ok(())
    }

    /// Abandon the checkpoint: discard its private store entirely
    pub fn rollback(&self) -> Result<()> {
        self.take_finished()?;
        self.store.clear();
        let mut slots = self.slots.lock();
        slots.in_flight = false;
        info!(kind = ?self.kind, "checkpoint rolled back");
        Ok(())
    }

    fn ensure_active(&self) -> Result<()> {
        if self.finished.load(Ordering::SeqCst) {
            return Err(Error::WriterAlreadyFinished);
        }
        Ok(())
    }

    /// Claim the single-use finished flag
    fn take_finished(&self) -> Result<()> {
        self.finished
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Error::WriterAlreadyFinished)?;
        Ok(())
    }
}

/// In-memory stream for one checkpoint item
///
/// Implements [`io::Write`]; bytes accumulate in a private buffer and are
/// stored when the stream is closed. Dropping an unclosed stream stores
/// the bytes as well, so every opened stream releases its slot exactly
/// once.
pub struct ItemWriter {
    store: Arc<InMemoryStateStore>,
    category: String,
    key: String,
    buf: Vec<u8>,
    open_streams: Arc<AtomicUsize>,
    closed: bool,
}

impl ItemWriter {
    /// Close the stream, storing the accumulated bytes
    pub fn close(mut self) -> Result<()> {
        self.finish()
    }

    fn finish(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result =
            self.store
                .add_or_update_item(&self.category, &self.key, mem::take(&mut self.buf));
        self.open_streams.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl io::Write for ItemWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ItemWriter {
    fn drop(&mut self) {
        // Arguments were validated when the stream was opened.
        let _ = self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::InMemoryStorageProvider;
    use std::io::{Read as _, Write as _};

    #[test]
    fn test_item_lands_on_stream_close() {
        let provider = InMemoryStorageProvider::new();
        let writer = provider.start_new_checkpoint().unwrap();

        let mut item = writer.item_writer("c", "k").unwrap();
        item.write_all(&[1, 2]).unwrap();
        item.write_all(&[3]).unwrap();
        item.close().unwrap();

        // Durable-to-memory before commit.
        writer.commit().unwrap();
        let reader = provider.try_read_checkpoint().unwrap();
        let mut out = Vec::new();
        reader
            .item_reader("c", "k")
            .unwrap()
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[test]
    fn test_drop_stores_like_close() {
        let provider = InMemoryStorageProvider::new();
        let writer = provider.start_new_checkpoint().unwrap();
        {
            let mut item = writer.item_writer("c", "k").unwrap();
            item.write_all(&[7]).unwrap();
        }
        writer.commit().unwrap();
        let reader = provider.try_read_checkpoint().unwrap();
        assert!(reader.has_item("c", "k"));
    }

    #[test]
    fn test_commit_refuses_open_streams() {
        let provider = InMemoryStorageProvider::new();
        let writer = provider.start_new_checkpoint().unwrap();
        let item = writer.item_writer("c", "k").unwrap();

        assert!(matches!(
            writer.commit(),
            Err(Error::ItemStreamsOpen { open: 1 })
        ));

        item.close().unwrap();
        writer.commit().unwrap();
    }

    #[test]
    fn test_commit_and_rollback_are_single_use() {
        let provider = InMemoryStorageProvider::new();
        let writer = provider.start_new_checkpoint().unwrap();
        writer.commit().unwrap();
        assert!(matches!(
            writer.commit(),
            Err(Error::WriterAlreadyFinished)
        ));
        assert!(matches!(
            writer.rollback(),
            Err(Error::WriterAlreadyFinished)
        ));
        assert!(matches!(
            writer.item_writer("c", "k"),
            Err(Error::WriterAlreadyFinished)
        ));
        assert!(matches!(
            writer.delete_item("c", "k"),
            Err(Error::WriterAlreadyFinished)
        ));
    }

    #[test]
    fn test_rollback_discards_content() {
        let provider = InMemoryStorageProvider::new();
        provider.start_new_checkpoint().unwrap().commit().unwrap();

        let writer = provider.update_checkpoint().unwrap();
        let mut item = writer.item_writer("c", "k").unwrap();
        item.write_all(&[1]).unwrap();
        item.close().unwrap();
        writer.rollback().unwrap();

        // Nothing reached the latest full checkpoint.
        let reader = provider.try_read_checkpoint().unwrap();
        assert!(!reader.has_item("c", "k"));
    }

    #[test]
    fn test_rejected_stream_does_not_count() {
        let provider = InMemoryStorageProvider::new();
        let writer = provider.start_new_checkpoint().unwrap();
        assert!(writer.item_writer("", "k").is_err());
        writer.commit().unwrap();
    }
}
