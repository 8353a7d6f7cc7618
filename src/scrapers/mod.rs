//! HTML report scrapers.
//!
//! | Source | Module | Tables |
//! |--------|--------|--------|
//! | Hoxhunt phishing trends report | [`hoxhunt`] | `phishing_trends`, `phishing_ai_mentions`, `brand_impersonation` |
//!
//! Each scraper exposes an async `fetch_*` that downloads the page and a
//! synchronous `parse_*` that turns HTML into rows, so parsing can be
//! tested against inline fixtures.

pub mod hoxhunt;
