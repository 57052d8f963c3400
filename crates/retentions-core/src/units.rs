//! Duration and size argument parsing.
//!
//! Durations use fixed-day approximations (`m` = 30 days, `q` = 90 days,
//! `y` = 365 days). Retention granularities stay calendar-true; only the
//! `--max-age` filter uses these approximations.

use std::time::Duration;

/// Parse a positive duration such as `3600`, `12h`, `3d`, `2.5w`.
///
/// Suffixes: none/`s` seconds, `h` hours, `d` days, `w` weeks, `m` 30 days,
/// `q` 90 days, `y` 365 days. A single space before the suffix is allowed.
/// Suffixes are lowercase only.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let text = input.trim();
    if text.is_empty() {
        return Err(format!("Invalid time format: '{input}'"));
    }

    let (number, multiplier) = match text.chars().last() {
        Some(unit) if unit.is_ascii_alphabetic() => {
            let seconds_per_unit: f64 = match unit {
                's' => 1.0,
                'h' => 3600.0,
                'd' => 86_400.0,
                'w' => 7.0 * 86_400.0,
                'm' => 30.0 * 86_400.0,
                'q' => 90.0 * 86_400.0,
                'y' => 365.0 * 86_400.0,
                _ => return Err(format!("Invalid time format: '{input}'")),
            };
            (strip_unit(&text[..text.len() - 1]), seconds_per_unit)
        }
        _ => (text, 1.0),
    };

    let value: f64 = parse_number(number).ok_or_else(|| format!("Invalid time format: '{input}'"))?;
    let seconds = value * multiplier;
    if !(seconds > 0.0) || !seconds.is_finite() {
        return Err(format!("Invalid time format: '{input}': must be > 0"));
    }
    Ok(Duration::from_secs_f64(seconds))
}

/// Parse a size such as `1024`, `1K`, `2.5M`, `3T` into bytes.
///
/// Suffixes K, M, G, T, P, E are powers of 1024 and case-insensitive; a
/// single space before the suffix is allowed.
pub fn parse_size(input: &str) -> Result<u64, String> {
    let text = input.trim();
    if text.is_empty() {
        return Err(format!("Invalid size format: '{input}'"));
    }

    let (number, multiplier) = match text.chars().last() {
        Some(unit) if unit.is_ascii_alphabetic() => {
            let bytes_per_unit: u64 = match unit.to_ascii_uppercase() {
                'K' => 1 << 10,
                'M' => 1 << 20,
                'G' => 1 << 30,
                'T' => 1 << 40,
                'P' => 1 << 50,
                'E' => 1 << 60,
                _ => return Err(format!("Invalid size format: '{input}'")),
            };
            (strip_unit(&text[..text.len() - 1]), bytes_per_unit)
        }
        _ => (text, 1),
    };

    let value: f64 = parse_number(number).ok_or_else(|| format!("Invalid size format: '{input}'"))?;
    if value < 0.0 || !value.is_finite() {
        return Err(format!("Invalid size format: '{input}'"));
    }
    Ok((value * multiplier as f64) as u64)
}

/// Render a byte count in binary units.
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Strip at most one trailing space left behind by removing the unit.
fn strip_unit(number: &str) -> &str {
    number.strip_suffix(' ').unwrap_or(number)
}

/// Plain decimal parse; rejects exotic forms `f64::from_str` would accept.
fn parse_number(text: &str) -> Option<f64> {
    if text.is_empty()
        || !text
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.')
        || text.chars().filter(|&c| c == '.').count() > 1
    {
        return None;
    }
    text.parse().ok()
}
