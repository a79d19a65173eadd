/// Helper utilities for the dashboard CLI

use chrono::{DateTime, Local, Utc};
use std::time::Duration;

/// Format a refresh period like "5s" or "1m 30s"
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let minutes = seconds / 60;
    let secs = seconds % 60;

    if seconds == 0 {
        format!("{}ms", duration.as_millis())
    } else if minutes > 0 && secs > 0 {
        format!("{}m {}s", minutes, secs)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", secs)
    }
}

/// Parse a human duration ("5s", "1m 30s", "500ms")
pub fn parse_interval(s: &str) -> Result<Duration, String> {
    let duration = humantime::parse_duration(s.trim()).map_err(|e| e.to_string())?;
    if duration.is_zero() {
        return Err("refresh interval must be greater than zero".to_string());
    }
    Ok(duration)
}

/// Format a snapshot timestamp in local time
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    let local: DateTime<Local> = timestamp.into();
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Truncate string with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Parse "#RRGGBB" into an RGB triple
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(120)), "2m");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("5s"), Ok(Duration::from_secs(5)));
        assert_eq!(parse_interval("1m 30s"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_interval("500ms"), Ok(Duration::from_millis(500)));
        assert!(parse_interval("0s").is_err());
        assert!(parse_interval("soon").is_err());
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hauptbahnhof", 20), "Hauptbahnhof");
        assert_eq!(truncate_string("Solar panels on public buildings", 12), "Solar pan...");
        assert_eq!(truncate_string("Süd → Nord", 6), "Süd...");
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FFD700"), Some((255, 215, 0)));
        assert_eq!(parse_hex_color("#a9a9a9"), Some((169, 169, 169)));
        assert_eq!(parse_hex_color("FFD700"), None);
        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("#GGGGGG"), None);
    }
}
