//! Type-specialized emission routines for booleans, integers, and reals
//!
//! Integer emission avoids allocation entirely: values in the small range
//! seen overwhelmingly often in practice come from a literal table, and
//! everything else is converted least-significant-digit-first into the
//! context's scratch buffer, reversed in place, and appended to the sink
//! as a single block.
//!
//! # Performance Contract
//!
//! - No heap allocation on any integer path
//! - One sink call per digit block, not per digit
//! - Minimum values never go through negation (two's-complement overflow)

use crate::context::EmitterContext;
use crate::sink::JsonSink;
use cascade_core::{Error, Result};

/// Lower bound of the literal-table fast path
const SMALL_INT_MIN: i64 = -128;
/// Upper bound of the literal-table fast path
const SMALL_INT_MAX: i64 = 7;

/// Literal renderings of -128..=7, indexed by `value - SMALL_INT_MIN`
static SMALL_INTS: [&str; 136] = [
    "-128", "-127", "-126", "-125", "-124", "-123", "-122", "-121",
    "-120", "-119", "-118", "-117", "-116", "-115", "-114", "-113",
    "-112", "-111", "-110", "-109", "-108", "-107", "-106", "-105",
    "-104", "-103", "-102", "-101", "-100", "-99", "-98", "-97",
    "-96", "-95", "-94", "-93", "-92", "-91", "-90", "-89",
    "-88", "-87", "-86", "-85", "-84", "-83", "-82", "-81",
    "-80", "-79", "-78", "-77", "-76", "-75", "-74", "-73",
    "-72", "-71", "-70", "-69", "-68", "-67", "-66", "-65",
    "-64", "-63", "-62", "-61", "-60", "-59", "-58", "-57",
    "-56", "-55", "-54", "-53", "-52", "-51", "-50", "-49",
    "-48", "-47", "-46", "-45", "-44", "-43", "-42", "-41",
    "-40", "-39", "-38", "-37", "-36", "-35", "-34", "-33",
    "-32", "-31", "-30", "-29", "-28", "-27", "-26", "-25",
    "-24", "-23", "-22", "-21", "-20", "-19", "-18", "-17",
    "-16", "-15", "-14", "-13", "-12", "-11", "-10", "-9",
    "-8", "-7", "-6", "-5", "-4", "-3", "-2", "-1",
    "0", "1", "2", "3", "4", "5", "6", "7",
];

/// Emit the JSON literal `null`
#[inline]
pub fn emit_null<S: JsonSink>(sink: &mut S) -> Result<()> {
    sink.push_str("null")
}

/// Emit `true` or `false`
#[inline]
pub fn emit_bool<S: JsonSink>(sink: &mut S, value: bool) -> Result<()> {
    sink.push_str(if value { "true" } else { "false" })
}

/// Emit a signed 64-bit integer
pub fn emit_i64<S: JsonSink>(sink: &mut S, value: i64, ctx: &mut EmitterContext) -> Result<()> {
    if (SMALL_INT_MIN..=SMALL_INT_MAX).contains(&value) {
        return sink.push_str(SMALL_INTS[(value - SMALL_INT_MIN) as usize]);
    }
    if value == i64::MIN {
        // Negating i64::MIN overflows, so its rendering is a literal.
        return sink.push_str("-9223372036854775808");
    }
    if value < 0 {
        sink.push_char('-')?;
        return emit_digits(sink, value.unsigned_abs(), ctx);
    }
    emit_digits(sink, value as u64, ctx)
}

/// Emit an unsigned 64-bit integer
pub fn emit_u64<S: JsonSink>(sink: &mut S, value: u64, ctx: &mut EmitterContext) -> Result<()> {
    if value <= SMALL_INT_MAX as u64 {
        return sink.push_str(SMALL_INTS[(value as i64 - SMALL_INT_MIN) as usize]);
    }
    emit_digits(sink, value, ctx)
}

/// Emit a signed 8-bit integer
#[inline]
pub fn emit_i8<S: JsonSink>(sink: &mut S, value: i8, ctx: &mut EmitterContext) -> Result<()> {
    // Widening sidesteps i8::MIN negation; the whole range is in the table.
    emit_i64(sink, i64::from(value), ctx)
}

/// Emit a signed 16-bit integer
#[inline]
pub fn emit_i16<S: JsonSink>(sink: &mut S, value: i16, ctx: &mut EmitterContext) -> Result<()> {
    emit_i64(sink, i64::from(value), ctx)
}

/// Emit a signed 32-bit integer
#[inline]
pub fn emit_i32<S: JsonSink>(sink: &mut S, value: i32, ctx: &mut EmitterContext) -> Result<()> {
    emit_i64(sink, i64::from(value), ctx)
}

/// Emit an unsigned 8-bit integer
#[inline]
pub fn emit_u8<S: JsonSink>(sink: &mut S, value: u8, ctx: &mut EmitterContext) -> Result<()> {
    emit_u64(sink, u64::from(value), ctx)
}

/// Emit an unsigned 16-bit integer
#[inline]
pub fn emit_u16<S: JsonSink>(sink: &mut S, value: u16, ctx: &mut EmitterContext) -> Result<()> {
    emit_u64(sink, u64::from(value), ctx)
}

/// Emit an unsigned 32-bit integer
#[inline]
pub fn emit_u32<S: JsonSink>(sink: &mut S, value: u32, ctx: &mut EmitterContext) -> Result<()> {
    emit_u64(sink, u64::from(value), ctx)
}

/// Emit a 64-bit real
///
/// Delegates to the standard locale-independent conversion; no custom
/// float formatting. NaN and infinities have no JSON form and fail with
/// [`Error::NonFiniteNumber`].
pub fn emit_f64<S: JsonSink>(sink: &mut S, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::NonFiniteNumber);
    }
    sink.push_str(&value.to_string())
}

/// Emit a 32-bit real; see [`emit_f64`]
pub fn emit_f32<S: JsonSink>(sink: &mut S, value: f32) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::NonFiniteNumber);
    }
    sink.push_str(&value.to_string())
}

/// Emit `null` for an absent value, else delegate to `emit`
///
/// Uniform null policy for every nullable wrapper, including top-level
/// dispatch on an absent value.
pub fn emit_opt<S, T, F>(
    sink: &mut S,
    value: Option<T>,
    ctx: &mut EmitterContext,
    emit: F,
) -> Result<()>
where
    S: JsonSink,
    F: FnOnce(&mut S, T, &mut EmitterContext) -> Result<()>,
{
    match value {
        Some(v) => emit(sink, v, ctx),
        None => emit_null(sink),
    }
}

/// Convert `n` into the context scratch buffer and append it as one block
fn emit_digits<S: JsonSink>(sink: &mut S, mut n: u64, ctx: &mut EmitterContext) -> Result<()> {
    let mut len = 0;
    loop {
        ctx.digits[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
        if n == 0 {
            break;
        }
    }
    ctx.digits[..len].reverse();
    sink.push_ascii(&ctx.digits[..len])
}
