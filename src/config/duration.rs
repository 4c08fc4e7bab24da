// src/config/duration.rs

use std::time::Duration;

/// Parse a duration string like `"500ms"`, `"1.5s"`, `"1m30s"` or `"2h"`.
///
/// Accepts a sequence of decimal numbers, each followed by one of the units
/// `ns`, `us` (or `µs`), `ms`, `s`, `m`, `h`. A bare `"0"` is also accepted.
/// Negative durations are rejected.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut rest = s;
    let mut total = Duration::ZERO;

    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;
        let (num_part, tail) = rest.split_at(num_end);
        if num_part.is_empty() || num_part == "." {
            return Err(format!("invalid duration '{s}': expected a number before the unit"));
        }
        let value: f64 = num_part
            .parse()
            .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;

        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_end);

        let nanos_per_unit: f64 = match unit {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => {
                return Err(format!(
                    "unsupported duration unit '{unit}' in '{s}'; expected ns, us, ms, s, m, or h"
                ));
            }
        };

        total += Duration::from_nanos((value * nanos_per_unit).round() as u64);
        rest = next;
    }

    Ok(total)
}
