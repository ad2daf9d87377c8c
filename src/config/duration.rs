//! # Duration Parsing
//!
//! Kubernetes-style duration strings such as `30s`, `5m`, `1h` or `1d`.

use anyhow::{anyhow, Result};
use regex::Regex;
use std::time::Duration;

/// Parse a Kubernetes duration string into a [`Duration`]
///
/// # Errors
///
/// Returns an error for empty input, unknown units or a zero amount.
pub fn parse_kubernetes_duration(duration_str: &str) -> Result<Duration> {
    let trimmed = duration_str.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Duration string cannot be empty"));
    }

    let duration_regex = Regex::new(r"^(?P<number>\d+)(?P<unit>[smhd])$")
        .map_err(|e| anyhow!("Failed to compile regex: {e}"))?;

    let lower = trimmed.to_lowercase();
    let captures = duration_regex.captures(&lower).ok_or_else(|| {
        anyhow!(
            "Invalid duration format '{}'. Expected format: <number><unit> (e.g., '30s', '5m', '1h')",
            trimmed
        )
    })?;

    let number: u64 = captures["number"]
        .parse()
        .map_err(|e| anyhow!("Invalid duration number in '{}': {}", trimmed, e))?;
    if number == 0 {
        return Err(anyhow!(
            "Duration number must be greater than 0, got '{}'",
            trimmed
        ));
    }

    let multiplier = match &captures["unit"] {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        unit => {
            return Err(anyhow!(
                "Invalid unit '{}' in duration '{}'. Expected: s, m, h, or d",
                unit,
                trimmed
            ))
        }
    };

    number
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| anyhow!("Duration '{}' is too large", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_durations() {
        assert_eq!(parse_kubernetes_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_kubernetes_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_kubernetes_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_kubernetes_duration("1d").unwrap(), Duration::from_secs(86400));
        assert_eq!(parse_kubernetes_duration(" 1M ").unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_durations() {
        for input in ["", "  ", "30", "m", "0s", "1w", "1.5m", "-1s"] {
            assert!(
                parse_kubernetes_duration(input).is_err(),
                "expected '{input}' to be rejected"
            );
        }
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert!(parse_kubernetes_duration("18446744073709551615d").is_err());
    }
}
