//! Fast JSON emitter with runtime-type dispatch caching
//!
//! This crate emits the RFC 4627 textual form of values into one of two
//! sink kinds: a growable string buffer ([`StringSink`]) or a streaming
//! writer ([`WriterSink`]). It covers emission only; parsing is out of
//! scope.
//!
//! Two layers:
//!
//! - **Scalar routines** ([`scalar`], [`text`], [`time`]): pure,
//!   type-specialized emitters for booleans, integers of every width,
//!   reals, chars, strings, and date/times. These never allocate on the
//!   integer paths (digits go through a per-context scratch buffer) and
//!   bulk-copy strings that need no escaping.
//! - **Polymorphic dispatch** ([`any`]): `emit_any_*` takes `&dyn Any`,
//!   fast-paths the well-known primitive types, and otherwise consults a
//!   per-context inline cache keyed by `TypeId`. Unseen types are resolved
//!   once through an external [`EmitterBuilder`] and cached for the
//!   lifetime of the context - first use is slow, repeats are fast, no
//!   eviction.
//!
//! # Example
//!
//! ```ignore
//! use cascade_emit::{EmitterContext, StringSink, scalar, text};
//!
//! let mut ctx = EmitterContext::new();
//! let mut out = String::new();
//! let mut sink = StringSink::new(&mut out);
//! scalar::emit_i64(&mut sink, -42, &mut ctx)?;
//! text::emit_str(&mut sink, "he said \"hi\"")?;
//! ```

pub mod any;
pub mod context;
pub mod scalar;
pub mod sink;
pub mod text;
pub mod time;

pub use any::EmitterBuilder;
pub use context::{EmitterContext, StrEmitFn, WriterEmitFn, DIGIT_SCRATCH_LEN};
pub use scalar::{
    emit_bool, emit_f32, emit_f64, emit_i16, emit_i32, emit_i64, emit_i8, emit_null, emit_opt,
    emit_u16, emit_u32, emit_u64, emit_u8,
};
pub use sink::{JsonSink, StringSink, WriterSink};
pub use text::{emit_char, emit_object_key, emit_str};
pub use time::{emit_datetime, emit_datetime_utc};
