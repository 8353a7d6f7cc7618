//! Small text helpers shared by the scrapers and the PhishTank client.

use itertools::Itertools;

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary at or before `max`
/// bytes, with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().join(" ")
}

/// Reduce a candidate line to the URL it carries.
///
/// PhishTank exports list `<phish id>\t<url>`; only the last
/// whitespace-separated token is submitted. Returns `None` for blank input.
pub fn candidate_url(line: &str) -> Option<String> {
    line.split_whitespace().last().map(str::to_string)
}

/// Parse a URL list file: one URL per line, blank lines and `#` comments
/// ignored.
pub fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(candidate_url)
        .collect()
}
