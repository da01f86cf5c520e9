//! Date/time emission in the RFC 3339 subset
//!
//! Output shape: `"YYYY-MM-DDTHH:mm:ss[.fffffff][Z|±HH:mm]"`.
//!
//! The fractional part carries 100-nanosecond precision with trailing
//! zeros trimmed, and is omitted entirely when the sub-second component is
//! zero. A zero offset emits `Z`; any other offset emits a sign and
//! zero-padded `HH:mm`. No alternate date formats are supported.

use crate::context::EmitterContext;
use crate::sink::JsonSink;
use cascade_core::Result;
use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Timelike, Utc};

/// Emit an offset-carrying date/time
pub fn emit_datetime<S: JsonSink>(
    sink: &mut S,
    value: &DateTime<FixedOffset>,
    ctx: &mut EmitterContext,
) -> Result<()> {
    emit_parts(sink, value, value.offset().local_minus_utc(), ctx)
}

/// Emit a UTC date/time (offset rendered as `Z`)
pub fn emit_datetime_utc<S: JsonSink>(
    sink: &mut S,
    value: &DateTime<Utc>,
    ctx: &mut EmitterContext,
) -> Result<()> {
    emit_parts(sink, value, 0, ctx)
}

fn emit_parts<S: JsonSink, Tz: TimeZone>(
    sink: &mut S,
    value: &DateTime<Tz>,
    offset_secs: i32,
    ctx: &mut EmitterContext,
) -> Result<()> {
    sink.push_char('"')?;

    let year = value.year();
    if year < 0 {
        sink.push_char('-')?;
    }
    push_padded(sink, year.unsigned_abs(), 4, ctx)?;
    sink.push_char('-')?;
    push_padded(sink, value.month(), 2, ctx)?;
    sink.push_char('-')?;
    push_padded(sink, value.day(), 2, ctx)?;
    sink.push_char('T')?;
    push_padded(sink, value.hour(), 2, ctx)?;
    sink.push_char(':')?;
    push_padded(sink, value.minute(), 2, ctx)?;
    sink.push_char(':')?;
    push_padded(sink, value.second(), 2, ctx)?;

    // Sub-second part at 100ns precision, trailing zeros trimmed, absent
    // when zero. nanosecond() can exceed 1e9 during a leap second; the
    // remainder keeps the fraction in range.
    let mut ticks = (value.nanosecond() % 1_000_000_000) / 100;
    if ticks != 0 {
        sink.push_char('.')?;
        let mut fraction = [0u8; 7];
        for slot in fraction.iter_mut().rev() {
            *slot = b'0' + (ticks % 10) as u8;
            ticks /= 10;
        }
        let mut end = fraction.len();
        while end > 1 && fraction[end - 1] == b'0' {
            end -= 1;
        }
        sink.push_ascii(&fraction[..end])?;
    }

    if offset_secs == 0 {
        sink.push_char('Z')?;
    } else {
        sink.push_char(if offset_secs < 0 { '-' } else { '+' })?;
        let abs = offset_secs.unsigned_abs();
        push_padded(sink, abs / 3600, 2, ctx)?;
        sink.push_char(':')?;
        push_padded(sink, (abs % 3600) / 60, 2, ctx)?;
    }

    sink.push_char('"')
}

/// Zero-padded decimal through the context scratch buffer
fn push_padded<S: JsonSink>(
    sink: &mut S,
    value: u32,
    width: usize,
    ctx: &mut EmitterContext,
) -> Result<()> {
    let mut n = value;
    let mut len = 0;
    loop {
        ctx.digits[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
        if n == 0 {
            break;
        }
    }
    while len < width {
        ctx.digits[len] = b'0';
        len += 1;
    }
    ctx.digits[..len].reverse();
    sink.push_ascii(&ctx.digits[..len])
}
