/*!
 * ASS time values (`H:MM:SS.cc`) and human-readable durations.
 */

use crate::errors::SubtitleError;

/// Formats seconds as an ASS timestamp (`H:MM:SS.cc`).
///
/// Negative and NaN inputs clamp to zero. The value is rounded to the nearest
/// centisecond before it is split into fields.
pub fn to_timestamp(seconds: f64) -> String {
    let seconds = if seconds > 0.0 { seconds } else { 0.0 };
    let total_cs = (seconds * 100.0).round() as u64;

    let hours = total_cs / 360_000;
    let minutes = (total_cs % 360_000) / 6_000;
    let secs = (total_cs % 6_000) / 100;
    let centis = total_cs % 100;

    format!("{}:{:02}:{:02}.{:02}", hours, minutes, secs, centis)
}

/// Parses an ASS timestamp back into seconds
pub fn parse_timestamp(text: &str) -> Result<f64, SubtitleError> {
    let malformed = || SubtitleError::MalformedTimestamp(text.to_string());

    let parts: Vec<&str> = text.split(':').collect();
    if parts.len() != 3 {
        return Err(malformed());
    }

    let hours: u64 = parts[0].trim().parse().map_err(|_| malformed())?;
    let minutes: u64 = parts[1].trim().parse().map_err(|_| malformed())?;
    let seconds: f64 = parts[2].trim().parse().map_err(|_| malformed())?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(malformed());
    }

    Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

/// Formats a duration as "1h 23m 45s", "2m 5s" or "7s"
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds > 0.0 { seconds as u64 } else { 0 };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if minutes > 0 || hours > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", secs));

    parts.join(" ")
}
