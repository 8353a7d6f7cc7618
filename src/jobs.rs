//! The three load jobs.
//!
//! Each job is a straight line: fetch, parse, write. Nothing runs
//! concurrently; a PhishTank batch checks one URL at a time.

use crate::api::{evaluate, parse_response, ReputationLookup};
use crate::benchmarks;
use crate::dimensions::{domain_name, UrlFeatures};
use crate::error::Result;
use crate::models::{FactPhishingUrl, PhishingStatus, PhishtankResult};
use crate::scrapers::hoxhunt;
use crate::warehouse::{TableRow, Warehouse, WriteMode};
use clap::ValueEnum;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Where PhishTank verdicts are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Destination {
    /// `fact_phishing_urls`, with `dim_domains` and `dim_url_features` keys
    Facts,
    /// `phishtank_results`, verdicts only
    Results,
}

#[derive(Debug, Clone)]
pub struct CheckOptions {
    /// Replaces the computed verdict for every URL.
    pub force_status: Option<PhishingStatus>,
    pub destination: Destination,
    /// Stop at the first failed URL instead of logging and continuing.
    pub fail_fast: bool,
    /// Pause between consecutive requests.
    pub delay: Duration,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            force_status: None,
            destination: Destination::Facts,
            fail_fast: false,
            delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CheckSummary {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub methods: u64,
    pub ai_mentions: u64,
    pub impersonations: u64,
}

/// Scrape the report and load its three sections.
#[instrument(level = "info", skip(client, warehouse))]
pub async fn run_report<W: Warehouse>(
    client: &reqwest::Client,
    warehouse: &W,
    report_url: &str,
) -> Result<ReportSummary> {
    let html = hoxhunt::fetch_report(client, report_url).await?;
    load_report(warehouse, &html).await
}

/// Parse report HTML and write the rows.
pub async fn load_report<W: Warehouse>(warehouse: &W, html: &str) -> Result<ReportSummary> {
    let extract = hoxhunt::parse_report(html);

    let methods = warehouse
        .write(&extract.methods, WriteMode::Append)
        .await?;
    info!(rows = methods, table = "phishing_trends", "Loaded phishing methods");

    let ai_mentions = warehouse
        .write(&extract.ai_mentions, WriteMode::Replace)
        .await?;
    info!(rows = ai_mentions, table = "phishing_ai_mentions", "Loaded AI mentions");

    let impersonations = if extract.impersonations.is_empty() {
        warn!("No impersonation data extracted; brand_impersonation left untouched");
        0
    } else {
        let n = warehouse
            .write(&extract.impersonations, WriteMode::Replace)
            .await?;
        info!(rows = n, table = "brand_impersonation", "Loaded brand impersonation");
        n
    };

    Ok(ReportSummary {
        methods,
        ai_mentions,
        impersonations,
    })
}

async fn replace_table<W: Warehouse, R: TableRow + Sync>(warehouse: &W, rows: Vec<R>) -> Result<u64> {
    let n = warehouse.write(&rows, WriteMode::Replace).await?;
    info!(rows = n, table = R::TABLE, "Loaded benchmark table");
    Ok(n)
}

/// Load the four static benchmark tables.
#[instrument(level = "info", skip_all)]
pub async fn run_benchmarks<W: Warehouse>(warehouse: &W) -> Result<u64> {
    let mut total = 0;
    total += replace_table(warehouse, benchmarks::industry_training_success()).await?;
    total += replace_table(warehouse, benchmarks::job_role_training_performance()).await?;
    total += replace_table(warehouse, benchmarks::simulated_attack_performance()).await?;
    total += replace_table(warehouse, benchmarks::phishing_rate_over_time()).await?;
    info!(total, "Loaded benchmark tables");
    Ok(total)
}

/// Write one verdict to the configured destination.
async fn store_result<W: Warehouse>(
    warehouse: &W,
    result: PhishtankResult,
    destination: Destination,
) -> Result<()> {
    match destination {
        Destination::Results => {
            warehouse.write(&[result], WriteMode::Append).await?;
        }
        Destination::Facts => {
            let domain_id = warehouse.resolve_domain(&domain_name(&result.url)).await?;
            let feature_id = warehouse
                .resolve_features(&UrlFeatures::from_url(&result.url))
                .await?;
            let fact = FactPhishingUrl::from_result(result, domain_id, feature_id);
            warehouse.write(&[fact], WriteMode::Append).await?;
        }
    }
    Ok(())
}

/// Check one URL and store its verdict.
///
/// Returns `Ok(None)` when the API answered with an empty or unparseable
/// body; nothing is written in that case. Transport and database errors
/// propagate.
#[instrument(level = "info", skip(lookup, warehouse, options))]
pub async fn check_url<L, W>(
    lookup: &L,
    warehouse: &W,
    url: &str,
    options: &CheckOptions,
) -> Result<Option<PhishtankResult>>
where
    L: ReputationLookup,
    W: Warehouse,
{
    let body = lookup.lookup(url).await?;
    let Some(response) = parse_response(&body) else {
        warn!(%url, "Skipping URL: invalid or empty response");
        return Ok(None);
    };

    let result = evaluate(url, response, options.force_status);
    store_result(warehouse, result.clone(), options.destination).await?;
    info!(url = %result.url, status = %result.phishing_status, "Added verdict");
    Ok(Some(result))
}

/// Check a batch of URLs in order. A failing URL is logged and skipped
/// unless `fail_fast` is set.
#[instrument(level = "info", skip_all, fields(count = urls.len()))]
pub async fn check_urls<L, W>(
    lookup: &L,
    warehouse: &W,
    urls: &[String],
    options: &CheckOptions,
) -> Result<CheckSummary>
where
    L: ReputationLookup,
    W: Warehouse,
{
    let mut summary = CheckSummary::default();

    for (i, url) in urls.iter().enumerate() {
        if i > 0 && !options.delay.is_zero() {
            sleep(options.delay).await;
        }
        match check_url(lookup, warehouse, url, options).await {
            Ok(Some(_)) => summary.written += 1,
            Ok(None) => summary.skipped += 1,
            Err(e) if options.fail_fast => return Err(e),
            Err(e) => {
                error!(%url, error = %e, "URL check failed; continuing");
                summary.failed += 1;
            }
        }
    }

    info!(
        written = summary.written,
        skipped = summary.skipped,
        failed = summary.failed,
        "Finished URL batch"
    );
    Ok(summary)
}
