//! Human readable durations (`500ms`, `5s`, `1m30s`, `2h`)

use super::error::{AppError, AppResult};
use std::time::Duration;

/// Parses a duration made of `<number><unit>` parts
///
/// Units: `ms`, `s`, `m`, `h`. A bare number is read as seconds.
pub fn parse_duration(input: &str) -> AppResult<Duration> {
    let text = input.trim();
    if text.is_empty() {
        return Err(invalid(input));
    }
    if let Ok(secs) = text.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = text;
    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| invalid(input))?;
        if digits == 0 {
            return Err(invalid(input));
        }
        let value: u64 = rest[..digits].parse().map_err(|_| invalid(input))?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let part = match &rest[..unit_len] {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => value.checked_mul(60).map(Duration::from_secs),
            "h" => value.checked_mul(3600).map(Duration::from_secs),
            _ => None,
        }
        .ok_or_else(|| invalid(input))?;
        total = total.checked_add(part).ok_or_else(|| invalid(input))?;
        rest = &rest[unit_len..];
    }

    Ok(total)
}

fn invalid(input: &str) -> AppError {
    AppError::Validation(format!(
        "invalid duration '{}', expected values like 500ms, 5s, 1m or 1h30m",
        input
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration(" 10 ").unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn test_rejects_garbage() {
        for input in [
            "",
            "s",
            "5x",
            "5 s",
            "-1s",
            "1.5s",
            "99999999999999999h",
            "18446744073709551615s1s",
        ] {
            assert!(parse_duration(input).is_err(), "accepted {:?}", input);
        }
    }
}
