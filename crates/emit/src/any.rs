//! Polymorphic emission: dispatch by runtime type
//!
//! `emit_any_*` emits a `&dyn Any` by its runtime type:
//!
//! 1. Well-known primitive types (and their `Option` wrappers) dispatch
//!    straight to the scalar routines - the overwhelmingly common cases
//!    never touch the cache.
//! 2. Everything else goes through the per-context inline cache. A hit
//!    runs the cached delegate.
//! 3. A miss asks the external [`EmitterBuilder`] for a delegate, emits
//!    with it immediately (the first occurrence of a type is never lost),
//!    and then binds it into the cache so repeats are cheap.
//!
//! A builder failure propagates to the caller unchanged and binds nothing,
//! so the next attempt retries discovery rather than hitting a poisoned
//! entry.

use crate::context::{EmitterContext, StrEmitFn, WriterEmitFn};
use crate::scalar::{
    emit_bool, emit_f32, emit_f64, emit_i16, emit_i32, emit_i64, emit_i8, emit_null, emit_u16,
    emit_u32, emit_u64, emit_u8,
};
use crate::sink::{JsonSink, StringSink, WriterSink};
use crate::text::{emit_char, emit_str};
use crate::time::{emit_datetime, emit_datetime_utc};
use cascade_core::Result;
use chrono::{DateTime, FixedOffset, Utc};
use std::any::Any;
use tracing::trace;

/// External collaborator that produces emission delegates for runtime
/// types the emitter has no specialized routine for
///
/// The builder receives the first value of the unseen type and returns
/// either a delegate (bound into the cache after a successful first
/// emission) or an error, which the caller sees unchanged.
pub trait EmitterBuilder: Send + Sync {
    /// Build a delegate emitting to a string-buffer sink
    fn build_str(&self, value: &dyn Any) -> Result<StrEmitFn>;

    /// Build a delegate emitting to a streaming-writer sink
    fn build_writer(&self, value: &dyn Any) -> Result<WriterEmitFn>;
}

/// Fast-path dispatch over the fixed well-known type set
///
/// Returns `Ok(true)` if `value` (or its `Option` wrapper) was one of the
/// well-known types and has been emitted.
macro_rules! known_types {
    ($value:ident, $sink:ident, $ctx:ident; $($ty:ty => $emit:expr),+ $(,)?) => {
        $(
            if let Some(v) = $value.downcast_ref::<$ty>() {
                $emit(&mut *$sink, v, &mut *$ctx)?;
                return Ok(true);
            }
            if let Some(v) = $value.downcast_ref::<Option<$ty>>() {
                match v.as_ref() {
                    Some(inner) => $emit(&mut *$sink, inner, &mut *$ctx)?,
                    None => emit_null(&mut *$sink)?,
                }
                return Ok(true);
            }
        )+
    };
}

fn try_emit_known<S: JsonSink>(
    value: &dyn Any,
    sink: &mut S,
    ctx: &mut EmitterContext,
) -> Result<bool> {
    // The unit type and an absent unit both stand in for a null reference.
    if value.downcast_ref::<()>().is_some() || value.downcast_ref::<Option<()>>().is_some() {
        emit_null(sink)?;
        return Ok(true);
    }
    known_types!(value, sink, ctx;
        bool => (|s, v: &bool, _c: &mut EmitterContext| emit_bool(s, *v)),
        i8 => (|s, v: &i8, c: &mut EmitterContext| emit_i8(s, *v, c)),
        i16 => (|s, v: &i16, c: &mut EmitterContext| emit_i16(s, *v, c)),
        i32 => (|s, v: &i32, c: &mut EmitterContext| emit_i32(s, *v, c)),
        i64 => (|s, v: &i64, c: &mut EmitterContext| emit_i64(s, *v, c)),
        u8 => (|s, v: &u8, c: &mut EmitterContext| emit_u8(s, *v, c)),
        u16 => (|s, v: &u16, c: &mut EmitterContext| emit_u16(s, *v, c)),
        u32 => (|s, v: &u32, c: &mut EmitterContext| emit_u32(s, *v, c)),
        u64 => (|s, v: &u64, c: &mut EmitterContext| emit_u64(s, *v, c)),
        f32 => (|s, v: &f32, _c: &mut EmitterContext| emit_f32(s, *v)),
        f64 => (|s, v: &f64, _c: &mut EmitterContext| emit_f64(s, *v)),
        char => (|s, v: &char, _c: &mut EmitterContext| emit_char(s, *v)),
        String => (|s, v: &String, _c: &mut EmitterContext| emit_str(s, v.as_str())),
        &'static str => (|s, v: &&'static str, _c: &mut EmitterContext| emit_str(s, v)),
        DateTime<Utc> => (|s, v: &DateTime<Utc>, c: &mut EmitterContext| emit_datetime_utc(s, v, c)),
        DateTime<FixedOffset> => (|s, v: &DateTime<FixedOffset>, c: &mut EmitterContext| emit_datetime(s, v, c)),
    );
    Ok(false)
}

impl EmitterContext {
    /// Emit `value` to a string-buffer sink by its runtime type
    pub fn emit_any_str(&mut self, value: &dyn Any, sink: &mut StringSink<'_>) -> Result<()> {
        if try_emit_known(value, sink, self)? {
            return Ok(());
        }
        let ty = value.type_id();
        if let Some(f) = self.lookup_str(ty) {
            return f(value, sink, self);
        }
        let f = self.builder().build_str(value)?;
        trace!(?ty, "bound string emitter for unseen type");
        f(value, sink, self)?;
        self.bind_str(ty, f);
        Ok(())
    }

    /// Emit `value` to a streaming-writer sink by its runtime type
    pub fn emit_any_writer(&mut self, value: &dyn Any, sink: &mut WriterSink<'_>) -> Result<()> {
        if try_emit_known(value, sink, self)? {
            return Ok(());
        }
        let ty = value.type_id();
        if let Some(f) = self.lookup_writer(ty) {
            return f(value, sink, self);
        }
        let f = self.builder().build_writer(value)?;
        trace!(?ty, "bound writer emitter for unseen type");
        f(value, sink, self)?;
        self.bind_writer(ty, f);
        Ok(())
    }
}
