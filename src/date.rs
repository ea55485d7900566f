//! Date codec for UN/EDIFACT format codes and ISO 8601 variants.
//!
//! | Code | Layout | Notes |
//! |------|--------|-------|
//! | `102` | `YYYYMMDD` | also the fallback for 8-character input |
//! | `610` | `YYYYMM` | day defaults to 1 |
//! | `616` | `YYYYWW` | Monday of the ISO week |
//! | none | `YYYY-MM-DD` | 10 characters |
//! | none | `YYYY-MM-DDTHH:mm:ss` | 19 characters |
//!
//! Parsed values are [`NaiveDateTime`]s without timezone; pure dates carry
//! midnight.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::core::InvoiceError;

/// UN/EDIFACT 2379 code for `YYYYMMDD`.
pub const FORMAT_102: &str = "102";
/// UN/EDIFACT 2379 code for `YYYYMM`.
pub const FORMAT_610: &str = "610";
/// UN/EDIFACT 2379 code for `YYYYWW`.
pub const FORMAT_616: &str = "616";

/// Parse a date string, optionally qualified by its `format` attribute.
///
/// Blank input is `Ok(None)`. A wrong length for an explicit format code is a
/// [`InvoiceError::MalformedInput`]; a length no fallback encoding uses is an
/// [`InvoiceError::UnsupportedFormat`]. Non-numeric components and impossible
/// calendar dates yield `Ok(None)`.
pub fn parse_date(
    raw: &str,
    format_code: Option<&str>,
) -> Result<Option<NaiveDateTime>, InvoiceError> {
    let text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }

    match format_code.map(str::trim) {
        Some(FORMAT_102) => {
            expect_len(text, 8, FORMAT_102)?;
            Ok(parse_compact(text))
        }
        Some(FORMAT_610) => {
            expect_len(text, 6, FORMAT_610)?;
            Ok(ymd(num(text, 0, 4), num(text, 4, 6), Some(1)))
        }
        Some(FORMAT_616) => {
            expect_len(text, 6, FORMAT_616)?;
            Ok(iso_week_monday(num(text, 0, 4), num(text, 4, 6)))
        }
        _ => parse_by_length(text),
    }
}

/// Format as `YYYYMMDD` (`compact`) or `YYYY-MM-DDTHH:mm:ss`.
///
/// Only years 0000 to 9999 fit the four-digit year field; values outside
/// that range are clamped to 0000-01-01T00:00:00 or 9999-12-31T23:59:59.
pub fn format_date(value: &NaiveDateTime, compact: bool) -> String {
    let value = clamp_to_four_digit_year(*value);
    if compact {
        value.format("%Y%m%d").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

fn clamp_to_four_digit_year(value: NaiveDateTime) -> NaiveDateTime {
    let bound = match value.year() {
        ..=-1 => NaiveDate::from_ymd_opt(0, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0)),
        10_000.. => NaiveDate::from_ymd_opt(9999, 12, 31).and_then(|d| d.and_hms_opt(23, 59, 59)),
        _ => None,
    };
    bound.unwrap_or(value)
}

/// [`format_date`] for a plain calendar date.
pub fn format_naive_date(value: &NaiveDate, compact: bool) -> String {
    format_date(&value.and_time(NaiveTime::MIN), compact)
}

fn parse_by_length(text: &str) -> Result<Option<NaiveDateTime>, InvoiceError> {
    let bytes = text.as_bytes();
    match bytes.len() {
        8 => Ok(parse_compact(text)),
        10 if bytes[4] == b'-' && bytes[7] == b'-' => {
            Ok(ymd(num(text, 0, 4), num(text, 5, 7), num(text, 8, 10)))
        }
        19 => {
            let date = ymd(num(text, 0, 4), num(text, 5, 7), num(text, 8, 10));
            let time = match (num(text, 11, 13), num(text, 14, 16), num(text, 17, 19)) {
                (Some(h), Some(m), Some(s)) => NaiveTime::from_hms_opt(h, m, s),
                _ => None,
            };
            Ok(date.zip(time).map(|(d, t)| d.date().and_time(t)))
        }
        _ => Err(InvoiceError::UnsupportedFormat(text.to_string())),
    }
}

fn parse_compact(text: &str) -> Option<NaiveDateTime> {
    ymd(num(text, 0, 4), num(text, 4, 6), num(text, 6, 8))
}

fn expect_len(text: &str, len: usize, code: &str) -> Result<(), InvoiceError> {
    if text.len() == len {
        Ok(())
    } else {
        Err(InvoiceError::MalformedInput(format!(
            "date {text:?} has {} characters, format {code} requires {len}",
            text.len()
        )))
    }
}

/// Digits at `[start, end)`, or `None` for anything that is not all ASCII digits.
fn num(text: &str, start: usize, end: usize) -> Option<u32> {
    let part = text.get(start..end)?;
    if !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

fn ymd(year: Option<u32>, month: Option<u32>, day: Option<u32>) -> Option<NaiveDateTime> {
    let year = i32::try_from(year?).ok()?;
    NaiveDate::from_ymd_opt(year, month?, day?).map(|d| d.and_time(NaiveTime::MIN))
}

/// Jan 4 always lies in ISO week 1; step to the requested week, then back to
/// its Monday.
fn iso_week_monday(year: Option<u32>, week: Option<u32>) -> Option<NaiveDateTime> {
    let jan4 = ymd(year, Some(1), Some(4))?.date();
    let week = i64::from(week?);
    let in_week = jan4.checked_add_signed(Duration::days((week - 1) * 7))?;
    let offset = i64::from(in_week.weekday().num_days_from_monday());
    let monday = in_week.checked_sub_signed(Duration::days(offset))?;
    Some(monday.and_time(NaiveTime::MIN))
}
