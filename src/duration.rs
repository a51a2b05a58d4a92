//! Duration literals for `--timeout`.
//!
//! Accepts a signed sequence of decimal numbers, each with an optional fraction
//! and a unit suffix, such as `300ms`, `1.5s` or `1h30m`. Valid units are `ns`,
//! `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare `0` needs no unit.
//!
//! A negative duration is accepted and resolves to zero: the deadline has
//! already passed by the time the command would start.

use regex::Regex;
use std::fmt::Write as _;
use std::sync::LazyLock;
use std::time::Duration;
use thiserror::Error;

/// One `<number>[.<fraction>]<unit>` component at the start of the remaining input.
static COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9]*)(?:\.([0-9]*))?([^0-9.]*)").expect("component pattern is valid")
});

const NANOS_PER_MICRO: u64 = 1_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MIN: u64 = 60 * NANOS_PER_SEC;
const NANOS_PER_HOUR: u64 = 60 * NANOS_PER_MIN;

/// Largest representable magnitude, matching a signed 64-bit nanosecond count.
const MAX_NANOS: u64 = i64::MAX as u64;

/// Fraction digits beyond this cannot change the nanosecond result.
const MAX_FRACTION_DIGITS: usize = 18;

/// Error returned when a duration literal cannot be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("invalid duration \"{0}\"")]
    Invalid(String),

    #[error("missing unit in duration \"{0}\"")]
    MissingUnit(String),

    #[error("unknown unit \"{unit}\" in duration \"{input}\"")]
    UnknownUnit { unit: String, input: String },
}

/// Parse a duration literal.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(parse("1m30s")?, Duration::from_secs(90));
/// assert_eq!(parse("-2s")?, Duration::ZERO);
/// ```
pub fn parse(input: &str) -> Result<Duration, DurationError> {
    let invalid = || DurationError::Invalid(input.to_string());

    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total: u64 = 0;
    while !rest.is_empty() {
        let caps = COMPONENT.captures(rest).ok_or_else(invalid)?;
        let whole = caps.get(1).map_or("", |m| m.as_str());
        let fraction = caps.get(2).map_or("", |m| m.as_str());
        let unit = caps.get(3).map_or("", |m| m.as_str());

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if unit.is_empty() {
            return Err(DurationError::MissingUnit(input.to_string()));
        }
        let scale = unit_scale(unit).ok_or_else(|| DurationError::UnknownUnit {
            unit: unit.to_string(),
            input: input.to_string(),
        })?;

        let nanos = component_nanos(whole, fraction, scale).ok_or_else(invalid)?;
        total = total
            .checked_add(nanos)
            .filter(|t| *t <= MAX_NANOS)
            .ok_or_else(invalid)?;

        rest = &rest[caps[0].len()..];
    }

    if negative {
        return Ok(Duration::ZERO);
    }
    Ok(Duration::from_nanos(total))
}

fn unit_scale(unit: &str) -> Option<u64> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(NANOS_PER_MIN),
        "h" => Some(NANOS_PER_HOUR),
        _ => None,
    }
}

/// Nanoseconds for one component, or `None` on overflow.
fn component_nanos(whole: &str, fraction: &str, scale: u64) -> Option<u64> {
    let whole_nanos = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().ok()?.checked_mul(scale)?
    };

    let digits = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    if digits.is_empty() {
        return Some(whole_nanos);
    }
    let numerator: u128 = digits.parse().ok()?;
    let denominator = 10u128.pow(digits.len() as u32);
    let fraction_nanos = u64::try_from(numerator * u128::from(scale) / denominator).ok()?;

    whole_nanos.checked_add(fraction_nanos)
}

/// Render a duration in the same notation [`parse`] accepts.
pub fn format(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }

    if duration < Duration::from_secs(1) {
        let nanos = nanos as u64;
        return if nanos % NANOS_PER_MILLI == 0 {
            format!("{}ms", nanos / NANOS_PER_MILLI)
        } else if nanos % NANOS_PER_MICRO == 0 {
            format!("{}µs", nanos / NANOS_PER_MICRO)
        } else {
            format!("{nanos}ns")
        };
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{secs}");
    let subsec = duration.subsec_nanos();
    if subsec > 0 {
        let digits = format!("{subsec:09}");
        let _ = write!(out, ".{}", digits.trim_end_matches('0'));
    }
    out.push('s');
    out
}
