//! Natural keys for the `dim_domains` and `dim_url_features` tables.
//!
//! The warehouse maps these values to surrogate keys; this module only
//! derives them from a URL and computes the next key for a new row.

use url::{Host, Url};

/// Lexical features of a checked URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UrlFeatures {
    pub uses_https: bool,
    pub has_ip_address: bool,
    pub url_length: i64,
}

impl UrlFeatures {
    pub fn from_url(raw: &str) -> Self {
        let raw = raw.trim();
        let parsed = Url::parse(raw).ok();

        let uses_https = match &parsed {
            Some(u) => u.scheme() == "https",
            None => raw.to_ascii_lowercase().starts_with("https://"),
        };
        let has_ip_address = matches!(
            parsed.as_ref().and_then(|u| u.host()),
            Some(Host::Ipv4(_)) | Some(Host::Ipv6(_))
        );

        Self {
            uses_https,
            has_ip_address,
            url_length: raw.chars().count() as i64,
        }
    }
}

/// Host part of a URL, lowercased.
///
/// Falls back to the trimmed input when the URL has no parseable host so
/// that every fact row can still reference a domain row.
pub fn domain_name(raw: &str) -> String {
    let raw = raw.trim();
    Url::parse(raw)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_matches(['[', ']']).to_ascii_lowercase()))
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| raw.to_string())
}

/// Key for a new dimension row: one past the largest existing key, 1 when
/// the table is empty.
pub fn next_key<I>(existing: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    existing.into_iter().max().unwrap_or(0) + 1
}
