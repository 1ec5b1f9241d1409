//! Unit-suffixed duration literals (`300ms`, `1h30m`, `1.5s`)

use std::time::Duration;

/// Parse a duration literal
///
/// Accepts a sequence of `<number><unit>` pairs where the number may carry a
/// fraction and the unit is one of `ns`, `us`, `µs`, `μs`, `ms`, `s`, `m`,
/// `h`. A bare `0` is accepted. A leading `+` is allowed; negative durations
/// are rejected since they cannot be represented.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_string());
    }
    if s.starts_with('-') {
        return Err("negative durations are not supported".to_string());
    }
    let s = s.strip_prefix('+').unwrap_or(s);
    if s.is_empty() {
        return Err(format!("expected number in duration {:?}", input));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration {:?}", input))?;
        if digits_end == 0 {
            return Err(format!("expected number in duration {:?}", input));
        }
        let number = &rest[..digits_end];
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let scale = unit_nanos(unit).ok_or_else(|| format!("unknown unit {:?} in duration {:?}", unit, input))?;
        let nanos = scaled(number, scale).ok_or_else(|| format!("invalid number {:?} in duration {:?}", number, input))?;
        total = total
            .checked_add(nanos)
            .ok_or_else(|| format!("duration {:?} overflows", input))?;
    }

    let secs = u64::try_from(total / 1_000_000_000).map_err(|_| format!("duration {:?} overflows", input))?;
    // Remainder of a division by 1e9 always fits in u32
    let subsec = (total % 1_000_000_000) as u32;
    Ok(Duration::new(secs, subsec))
}

fn unit_nanos(unit: &str) -> Option<u128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(1_000_000_000),
        "m" => Some(60 * 1_000_000_000),
        "h" => Some(3600 * 1_000_000_000),
        _ => None,
    }
}

/// `number * scale` in nanoseconds, where number may have a fractional part
fn scaled(number: &str, scale: u128) -> Option<u128> {
    let (whole, frac) = match number.split_once('.') {
        Some((w, f)) => (w, f),
        None => (number, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.contains('.') {
        return None;
    }

    let whole_value: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut nanos = whole_value.checked_mul(scale)?;

    // Fractional digits beyond nanosecond precision are dropped
    let mut divisor: u128 = 1;
    let mut frac_value: u128 = 0;
    for c in frac.chars() {
        if divisor > scale {
            break;
        }
        let digit = c.to_digit(10)?;
        frac_value = frac_value * 10 + u128::from(digit);
        divisor *= 10;
    }
    nanos = nanos.checked_add(frac_value * scale / divisor)?;
    Some(nanos)
}
