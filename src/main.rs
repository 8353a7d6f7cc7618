//! # phish_loader
//!
//! Extract-load jobs that stage phishing data in the `raw` schema of a
//! PostgreSQL database.
//!
//! ## Jobs
//!
//! - `report`: scrapes the Hoxhunt phishing trends report (methods table, AI
//!   sections, brand impersonation paragraphs)
//! - `benchmarks`: loads the report's training benchmark figures
//! - `check-urls`: submits URLs to PhishTank, classifies the verdicts and
//!   links each one to domain and URL-feature dimension rows
//!
//! ## Usage
//!
//! ```sh
//! PG_USER=... PG_PASSWORD=... PG_HOST=... PG_PORT=5432 PG_DB=... phish_loader report
//! ```
//!
//! The database pool is opened once, shared by reference with the job, and
//! closed before exit whether the job succeeded or not.

use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{error, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod benchmarks;
mod cli;
mod config;
mod dimensions;
mod error;
mod jobs;
mod models;
mod scrapers;
mod utils;
mod warehouse;

use api::PhishTankClient;
use cli::{CheckUrlsArgs, Cli, Command};
use config::DbConfig;
use error::{EtlError, Result};
use jobs::CheckOptions;
use warehouse::{MemoryWarehouse, PgWarehouse, Warehouse};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    info!(dry_run = args.dry_run, command = ?args.command, "phish_loader starting up");

    if args.dry_run {
        let warehouse = MemoryWarehouse::new();
        run(&args, &warehouse).await?;
        warehouse.log_summary();
    } else {
        let config = DbConfig::from_env()?;
        info!(?config, "Loaded database configuration");
        let warehouse = PgWarehouse::connect(&config).await?;
        let outcome = run(&args, &warehouse).await;
        warehouse.close().await;
        if let Err(e) = outcome {
            error!(error = %e, "Job failed");
            return Err(e.into());
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

fn http_client(timeout_secs: Option<u64>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}

#[instrument(level = "info", skip_all)]
async fn run<W: Warehouse>(args: &Cli, warehouse: &W) -> Result<()> {
    let client = http_client(args.timeout_secs)?;

    match &args.command {
        Command::Report { report_url } => {
            let summary = jobs::run_report(&client, warehouse, report_url).await?;
            info!(
                methods = summary.methods,
                ai_mentions = summary.ai_mentions,
                impersonations = summary.impersonations,
                "Report loaded"
            );
        }
        Command::Benchmarks => {
            jobs::run_benchmarks(warehouse).await?;
        }
        Command::CheckUrls(check) => {
            run_check_urls(client, warehouse, check).await?;
        }
    }
    Ok(())
}

async fn run_check_urls<W: Warehouse>(
    client: reqwest::Client,
    warehouse: &W,
    args: &CheckUrlsArgs,
) -> Result<()> {
    let mut urls: Vec<String> = args
        .urls
        .iter()
        .filter_map(|u| utils::candidate_url(u))
        .collect();
    if let Some(path) = &args.urls_file {
        let contents = tokio::fs::read_to_string(path).await?;
        urls.extend(utils::parse_url_list(&contents));
    }
    if urls.is_empty() {
        return Err(EtlError::Input(
            "no URLs given; pass them as arguments or with --urls-file".to_string(),
        ));
    }

    let phishtank = PhishTankClient::new(client, args.user_agent.clone())
        .with_endpoint(args.endpoint.clone());
    let options = CheckOptions {
        force_status: args.force_status,
        destination: args.destination,
        fail_fast: args.fail_fast,
        delay: Duration::from_millis(args.delay_ms),
    };

    let summary = jobs::check_urls(&phishtank, warehouse, &urls, &options).await?;
    if summary.written == 0 {
        info!(requested = urls.len(), "No verdicts were written");
    }
    Ok(())
}
