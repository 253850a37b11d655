/*!
 * Parsing of numbered model responses.
 *
 * A response is expected to hold one `n. translation` line per input line.
 * Lines that do not look like that are ignored, and any number that never
 * shows up becomes an empty translation instead of an error.
 */

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// `1. text`, `1: text`, `1 text`
pub static NUMBERED_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)[.:\s]+(.+)$").expect("numbered line pattern is valid")
});

/// Parses a numbered response into exactly `expected_count` translations.
///
/// When a number appears twice the later line wins.
pub fn parse_numbered_response(response: &str, expected_count: usize) -> Vec<String> {
    let mut translations: HashMap<usize, String> = HashMap::new();

    for line in response.trim().lines() {
        if let Some(caps) = NUMBERED_LINE.captures(line.trim()) {
            if let Ok(num) = caps[1].parse::<usize>() {
                translations.insert(num, caps[2].trim().to_string());
            }
        }
    }

    (1..=expected_count)
        .map(|i| translations.remove(&i).unwrap_or_default())
        .collect()
}
