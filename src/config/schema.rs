//! Duration parsing and rendering for configuration values and event payloads.
//!
//! Both directions use the compact unit notation event sources share
//! (`"5s"`, `"100ms"`, `"1h30m"`), so an interval read from `INTERVAL`
//! renders back to the same text downstream consumers already expect.

use std::fmt::Write;
use std::time::Duration;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Fraction digits beyond this are ignored; nanoseconds need at most 9
/// after scaling and this keeps the arithmetic inside `u128`.
const MAX_FRACTION_DIGITS: usize = 20;

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
        "ms" => Some(NANOS_PER_MILLI),
        "s" => Some(NANOS_PER_SEC),
        "m" => Some(60 * NANOS_PER_SEC),
        "h" => Some(3600 * NANOS_PER_SEC),
        _ => None,
    }
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

/// Parse a duration string like "5s", "100ms", "1h30m" or "1.5s".
///
/// Only strictly positive durations are accepted.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let input = s.trim();
    if input.is_empty() {
        return Err("Empty duration".to_string());
    }
    if input.starts_with('-') {
        return Err(format!("Duration must be positive: {}", s));
    }
    let mut rest = input.strip_prefix('+').unwrap_or(input);
    if rest == "0" {
        return Err(format!("Duration must be positive: {}", s));
    }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let (whole, after) = split_digits(rest);
        let (fraction, after) = match after.strip_prefix('.') {
            Some(after_dot) => split_digits(after_dot),
            None => ("", after),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(format!("Invalid duration: {}", s));
        }

        let unit_end = after
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(after.len());
        let (unit, after) = after.split_at(unit_end);
        let scale = match unit_nanos(unit) {
            Some(scale) => scale,
            None if unit.is_empty() => return Err(format!("Missing unit in duration: {}", s)),
            None => return Err(format!("Unknown duration unit: {}", unit)),
        };

        let whole: u128 = if whole.is_empty() {
            0
        } else {
            whole
                .parse()
                .map_err(|_| format!("Invalid number in duration: {}", s))?
        };
        let mut nanos = whole
            .checked_mul(scale)
            .ok_or_else(|| format!("Duration out of range: {}", s))?;

        if !fraction.is_empty() {
            let digits = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
            let numerator: u128 = digits
                .parse()
                .map_err(|_| format!("Invalid number in duration: {}", s))?;
            nanos = nanos
                .checked_add(numerator * scale / 10u128.pow(digits.len() as u32))
                .ok_or_else(|| format!("Duration out of range: {}", s))?;
        }

        total = total
            .checked_add(nanos)
            .ok_or_else(|| format!("Duration out of range: {}", s))?;
        rest = after;
    }

    if total == 0 {
        return Err(format!("Duration must be positive: {}", s));
    }
    let nanos = u64::try_from(total).map_err(|_| format!("Duration out of range: {}", s))?;

    Ok(Duration::from_nanos(nanos))
}

/// `.digits` with trailing zeros removed, or nothing when `frac` is zero.
fn fraction_suffix(frac: u128, precision: usize) -> String {
    if frac == 0 {
        return String::new();
    }
    let digits = format!("{:0width$}", frac, width = precision);
    format!(".{}", digits.trim_end_matches('0'))
}

/// Render a duration the way `parse_duration` reads it, using the largest
/// units that fit: "5s", "100ms", "1m30s", "1h0m0s", "1.5s", "250µs".
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{}ns", nanos);
    }
    if nanos < NANOS_PER_MILLI {
        return format!(
            "{}{}µs",
            nanos / NANOS_PER_MICRO,
            fraction_suffix(nanos % NANOS_PER_MICRO, 3)
        );
    }
    if nanos < NANOS_PER_SEC {
        return format!(
            "{}{}ms",
            nanos / NANOS_PER_MILLI,
            fraction_suffix(nanos % NANOS_PER_MILLI, 6)
        );
    }

    let total_secs = nanos / NANOS_PER_SEC;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{}h{}m", hours, minutes);
    } else if minutes > 0 {
        let _ = write!(out, "{}m", minutes);
    }
    let _ = write!(
        out,
        "{}{}s",
        seconds,
        fraction_suffix(nanos % NANOS_PER_SEC, 9)
    );
    out
}
