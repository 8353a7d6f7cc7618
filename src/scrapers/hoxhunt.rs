//! Hoxhunt phishing trends report scraper.
//!
//! Three unrelated sections are pulled out of the same page:
//!
//! 1. **Methods**: the first `<table>`, one row per phishing method
//! 2. **AI mentions**: `h2`/`h3` headings containing "AI" and the paragraph
//!    after each
//! 3. **Brand impersonation**: the paragraphs after the list under the
//!    "impersonation campaigns leverage trusted brands" heading
//!
//! A missing section is not an error; it yields no rows.

use crate::error::{EtlError, Result};
use crate::models::{AiMention, BrandImpersonation, PhishingTrend};
use crate::utils::normalize_whitespace;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

pub const REPORT_URL: &str = "https://hoxhunt.com/guide/phishing-trends-report";

/// Matched case-insensitively against `h2` text.
pub const IMPERSONATION_HEADING: &str = "impersonation campaigns leverage trusted brands";

/// Brands the impersonation paragraphs describe, in page order.
pub const IMPERSONATED_BRANDS: [&str; 3] = ["Microsoft", "DocuSign", "Human Resources"];

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("static selector"));
static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("tr").expect("static selector"));
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").expect("static selector"));
static SECTION_HEADING: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2, h3").expect("static selector"));
static H2: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").expect("static selector"));

/// Everything extracted from one copy of the report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReportExtract {
    pub methods: Vec<PhishingTrend>,
    pub ai_mentions: Vec<AiMention>,
    pub impersonations: Vec<BrandImpersonation>,
}

/// Download the report page.
#[instrument(level = "info", skip(client))]
pub async fn fetch_report(client: &reqwest::Client, url: &str) -> Result<String> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(EtlError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    let html = resp.text().await?;
    info!(bytes = html.len(), "Fetched report page");
    Ok(html)
}

/// Parse all three sections from raw HTML.
pub fn parse_report(html: &str) -> ReportExtract {
    let document = Html::parse_document(html);
    let extract = ReportExtract {
        methods: extract_methods(&document),
        ai_mentions: extract_ai_mentions(&document),
        impersonations: extract_impersonation(&document),
    };
    info!(
        methods = extract.methods.len(),
        ai_mentions = extract.ai_mentions.len(),
        impersonations = extract.impersonations.len(),
        "Parsed report"
    );
    extract
}

fn element_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Rows of the first table, header row skipped. Rows with fewer than two
/// `<td>` cells are dropped.
pub fn extract_methods(document: &Html) -> Vec<PhishingTrend> {
    let Some(table) = document.select(&TABLE).next() else {
        debug!("No table in report");
        return Vec::new();
    };

    table
        .select(&ROW)
        .skip(1)
        .filter_map(|row| {
            let cells: Vec<ElementRef<'_>> = row.select(&CELL).collect();
            if cells.len() < 2 {
                return None;
            }
            Some(PhishingTrend {
                method: element_text(cells[0]),
                description: element_text(cells[1]),
            })
        })
        .collect()
}

/// Next sibling element with the given tag name, skipping other siblings.
fn next_sibling_named<'a>(element: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    element
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == tag)
}

pub fn extract_ai_mentions(document: &Html) -> Vec<AiMention> {
    document
        .select(&SECTION_HEADING)
        .filter_map(|heading| {
            let section_title = element_text(heading);
            if !section_title.contains("AI") {
                return None;
            }
            let paragraph = next_sibling_named(heading, "p")?;
            Some(AiMention {
                section_title,
                summary: element_text(paragraph),
            })
        })
        .collect()
}

/// First element named `tag` after `anchor` in document order.
fn next_in_document<'a>(document: &'a Html, anchor: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    document
        .root_element()
        .descendants()
        .skip_while(|node| node.id() != anchor.id())
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == tag)
}

/// Pair the paragraphs after the impersonation list with the fixed brand
/// list. Pairing is positional and stops at the shorter side.
pub fn extract_impersonation(document: &Html) -> Vec<BrandImpersonation> {
    let Some(heading) = document
        .select(&H2)
        .find(|h| element_text(*h).to_lowercase().contains(IMPERSONATION_HEADING))
    else {
        debug!("Impersonation heading not found");
        return Vec::new();
    };

    let Some(list) = next_in_document(document, heading, "ul") else {
        debug!("No list after impersonation heading");
        return Vec::new();
    };

    let paragraphs: Vec<String> = list
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "p")
        .take(IMPERSONATED_BRANDS.len())
        .map(element_text)
        .collect();

    if paragraphs.len() != IMPERSONATED_BRANDS.len() {
        warn!(
            expected = IMPERSONATED_BRANDS.len(),
            found = paragraphs.len(),
            "Impersonation paragraph count does not match brand list"
        );
    }

    IMPERSONATED_BRANDS
        .iter()
        .zip(paragraphs)
        .map(|(brand, description)| BrandImpersonation {
            brand: brand.to_string(),
            description,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"
        <html><body>
          <h1>Phishing Trends Report</h1>
          <table>
            <tr><th>Method</th><th>Description</th></tr>
            <tr><td> Business email
                 compromise </td><td>Attackers pose as executives.</td></tr>
            <tr><td>QR code phishing</td><td>Codes lead to <b>credential</b> harvesters.</td></tr>
            <tr><td>Lonely cell</td></tr>
          </table>
          <table><tr><th>x</th></tr><tr><td>second</td><td>table</td></tr></table>
          <h2>How AI changes phishing</h2>
          <div>aside</div>
          <p>Generative models write convincing lures.</p>
          <h3>AI-generated voice</h3>
          <h3>Not relevant</h3>
          <p>Voice clones of executives.</p>
          <h2>Malicious email trends</h2>
          <h2>Impersonation campaigns leverage trusted brands</h2>
          <div>
            <ul><li>Microsoft</li><li>DocuSign</li><li>HR</li></ul>
            <p>Fake Microsoft 365 login pages.</p>
            <p>Fake DocuSign envelopes.</p>
            <p>Fake HR policy updates.</p>
            <p>Unrelated closing paragraph.</p>
          </div>
        </body></html>
    "#;

    fn doc(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_methods_from_first_table() {
        let methods = extract_methods(&doc(REPORT));
        assert_eq!(
            methods,
            vec![
                PhishingTrend {
                    method: "Business email compromise".to_string(),
                    description: "Attackers pose as executives.".to_string(),
                },
                PhishingTrend {
                    method: "QR code phishing".to_string(),
                    description: "Codes lead to credential harvesters.".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_methods_without_table_is_empty() {
        assert!(extract_methods(&doc("<p>no table here</p>")).is_empty());
    }

    #[test]
    fn test_methods_header_only_table() {
        let html = "<table><tr><td>Method</td><td>Description</td></tr></table>";
        assert!(extract_methods(&doc(html)).is_empty());
    }

    #[test]
    fn test_ai_mentions() {
        let mentions = extract_ai_mentions(&doc(REPORT));
        // The <p> after "AI-generated voice" is not adjacent; the nearest
        // following sibling paragraph still counts.
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].section_title, "How AI changes phishing");
        assert_eq!(mentions[0].summary, "Generative models write convincing lures.");
        assert_eq!(mentions[1].section_title, "AI-generated voice");
        assert_eq!(mentions[1].summary, "Voice clones of executives.");
    }

    #[test]
    fn test_ai_matching_is_case_sensitive() {
        let html = "<h2>Email trends</h2><p>x</p><h2>Said the bait</h2><p>y</p>";
        assert!(extract_ai_mentions(&doc(html)).is_empty());
    }

    #[test]
    fn test_ai_heading_without_paragraph_is_skipped() {
        let html = "<div><h2>AI everywhere</h2><div>no paragraph</div></div><p>outside</p>";
        assert!(extract_ai_mentions(&doc(html)).is_empty());
    }

    #[test]
    fn test_impersonation_pairs_brands() {
        let rows = extract_impersonation(&doc(REPORT));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].brand, "Microsoft");
        assert_eq!(rows[0].description, "Fake Microsoft 365 login pages.");
        assert_eq!(rows[1].brand, "DocuSign");
        assert_eq!(rows[2].brand, "Human Resources");
        assert_eq!(rows[2].description, "Fake HR policy updates.");
    }

    #[test]
    fn test_impersonation_missing_heading() {
        let html = "<h2>Other</h2><ul><li>a</li></ul><p>x</p>";
        assert!(extract_impersonation(&doc(html)).is_empty());
    }

    #[test]
    fn test_impersonation_short_paragraph_list() {
        let html = "<h2>IMPERSONATION campaigns leverage TRUSTED brands</h2>\
                    <ul><li>a</li></ul><p>Only one.</p>";
        let rows = extract_impersonation(&doc(html));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].brand, "Microsoft");
        assert_eq!(rows[0].description, "Only one.");
    }

    #[test]
    fn test_parse_report_collects_all_sections() {
        let extract = parse_report(REPORT);
        assert_eq!(extract.methods.len(), 2);
        assert_eq!(extract.ai_mentions.len(), 2);
        assert_eq!(extract.impersonations.len(), 3);
    }
}
