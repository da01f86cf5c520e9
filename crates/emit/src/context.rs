//! Per-run emitter state: scratch buffer, cycle set, dispatch caches
//!
//! An [`EmitterContext`] is created once per serializer instance (or per
//! run) and reused across emissions. It owns:
//!
//! - a fixed digit scratch buffer sized for a 64-bit unsigned decimal,
//! - a cycle-tracking set keyed by object identity (address), used by
//!   container emitters produced by the builder,
//! - two lazily-built polymorphic inline caches, one per sink kind.
//!
//! [`EmitterContext::clear`] resets the cycle set between reuses; cache
//! state is never cleared. The caches only grow for the lifetime of the
//! context - acceptable because their scope is one serializer run.

use crate::any::EmitterBuilder;
use crate::sink::{StringSink, WriterSink};
use cascade_core::{Error, Result};
use smallvec::SmallVec;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Digit scratch size: enough for `u64::MAX` (20 decimal digits)
pub const DIGIT_SCRATCH_LEN: usize = 20;

/// Number of cache entries kept in the front-line linear probe
const RECENT_SLOTS: usize = 4;

/// Compiled emission delegate for string-buffer sinks
pub type StrEmitFn =
    Arc<dyn Fn(&dyn Any, &mut StringSink<'_>, &mut EmitterContext) -> Result<()> + Send + Sync>;

/// Compiled emission delegate for streaming-writer sinks
pub type WriterEmitFn =
    Arc<dyn Fn(&dyn Any, &mut WriterSink<'_>, &mut EmitterContext) -> Result<()> + Send + Sync>;

/// Polymorphic inline cache: runtime type -> emission delegate
///
/// The hot path is a linear probe over the last few types seen, the
/// equivalent of the recompiled type-test branch chain this replaces; the
/// backing map catches everything bound earlier. No eviction: once a type
/// is bound it stays for the lifetime of the context.
pub(crate) struct DispatchCache<F> {
    recent: SmallVec<[(TypeId, F); RECENT_SLOTS]>,
    map: HashMap<TypeId, F>,
}

impl<F: Clone> DispatchCache<F> {
    fn new() -> Self {
        DispatchCache {
            recent: SmallVec::new(),
            map: HashMap::new(),
        }
    }

    /// Look up the delegate bound to `ty`, promoting it to the probe front
    pub(crate) fn lookup(&mut self, ty: TypeId) -> Option<F> {
        if let Some(pos) = self.recent.iter().position(|(t, _)| *t == ty) {
            if pos != 0 {
                let entry = self.recent.remove(pos);
                self.recent.insert(0, entry);
            }
            return Some(self.recent[0].1.clone());
        }
        let f = self.map.get(&ty)?.clone();
        self.promote(ty, f.clone());
        Some(f)
    }

    /// Bind a newly built delegate; the new entry goes to the probe front
    pub(crate) fn bind(&mut self, ty: TypeId, f: F) {
        self.map.insert(ty, f.clone());
        self.promote(ty, f);
    }

    fn promote(&mut self, ty: TypeId, f: F) {
        if self.recent.len() == RECENT_SLOTS {
            self.recent.pop();
        }
        self.recent.insert(0, (ty, f));
    }

    /// Number of types bound so far
    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}

/// Per-serialization-run mutable emitter state
pub struct EmitterContext {
    /// Digit scratch; least-significant-first fill, reversed in place
    pub(crate) digits: [u8; DIGIT_SCRATCH_LEN],
    /// Reference-identity set for cycle tracking in container emitters
    cycle: HashSet<usize>,
    str_cache: DispatchCache<StrEmitFn>,
    writer_cache: DispatchCache<WriterEmitFn>,
    builder: Arc<dyn EmitterBuilder>,
}

impl EmitterContext {
    /// Context with no external builder; `emit_any_*` on a type outside
    /// the well-known set fails with [`Error::UnsupportedType`]
    pub fn new() -> Self {
        Self::with_builder(Arc::new(NoBuilder))
    }

    /// Context using `builder` to resolve types the cache has not seen
    pub fn with_builder(builder: Arc<dyn EmitterBuilder>) -> Self {
        EmitterContext {
            digits: [0; DIGIT_SCRATCH_LEN],
            cycle: HashSet::new(),
            str_cache: DispatchCache::new(),
            writer_cache: DispatchCache::new(),
            builder,
        }
    }

    /// Reset per-run state between reuses
    ///
    /// Clears the cycle set only; the dispatch caches survive so repeated
    /// runs keep their fast paths.
    pub fn clear(&mut self) {
        self.cycle.clear();
    }

    /// Record `value` as being emitted; returns `false` if it is already
    /// on the emission path (a reference cycle)
    pub fn cycle_enter(&mut self, value: &dyn Any) -> bool {
        self.cycle.insert(identity(value))
    }

    /// Remove `value` from the emission path on the way back out
    pub fn cycle_leave(&mut self, value: &dyn Any) {
        self.cycle.remove(&identity(value));
    }

    /// Number of types bound in the string-sink cache (diagnostics)
    pub fn str_cache_len(&self) -> usize {
        self.str_cache.len()
    }

    /// Number of types bound in the writer-sink cache (diagnostics)
    pub fn writer_cache_len(&self) -> usize {
        self.writer_cache.len()
    }

    pub(crate) fn builder(&self) -> Arc<dyn EmitterBuilder> {
        Arc::clone(&self.builder)
    }

    pub(crate) fn lookup_str(&mut self, ty: TypeId) -> Option<StrEmitFn> {
        self.str_cache.lookup(ty)
    }

    pub(crate) fn bind_str(&mut self, ty: TypeId, f: StrEmitFn) {
        self.str_cache.bind(ty, f);
    }

    pub(crate) fn lookup_writer(&mut self, ty: TypeId) -> Option<WriterEmitFn> {
        self.writer_cache.lookup(ty)
    }

    pub(crate) fn bind_writer(&mut self, ty: TypeId, f: WriterEmitFn) {
        self.writer_cache.bind(ty, f);
    }
}

impl Default for EmitterContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Address-based identity of a trait object (not value equality)
fn identity(value: &dyn Any) -> usize {
    value as *const dyn Any as *const () as usize
}

/// Builder used when none is supplied: every unseen type is unsupported
struct NoBuilder;

impl EmitterBuilder for NoBuilder {
    fn build_str(&self, _value: &dyn Any) -> Result<StrEmitFn> {
        Err(Error::UnsupportedType {
            type_name: "unregistered type",
        })
    }

    fn build_writer(&self, _value: &dyn Any) -> Result<WriterEmitFn> {
        Err(Error::UnsupportedType {
            type_name: "unregistered type",
        })
    }
}
