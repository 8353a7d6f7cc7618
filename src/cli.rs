//! Command-line interface definitions for phish_loader.
//!
//! Database credentials always come from the environment (see
//! [`crate::config`]); the flags here only choose the job and its options.

use crate::api::{CHECKURL_ENDPOINT, DEFAULT_USER_AGENT};
use crate::jobs::Destination;
use crate::models::PhishingStatus;
use crate::scrapers::hoxhunt::REPORT_URL;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Load phishing report data and PhishTank verdicts into the `raw` schema.
///
/// # Examples
///
/// ```sh
/// # Scrape the trends report
/// phish_loader report
///
/// # Load the static benchmark tables
/// phish_loader benchmarks
///
/// # Check URLs and record them as confirmed phishing
/// phish_loader check-urls --force-status verified https://zimbra-portal.webflow.io/
///
/// # Try a URL list without touching the database
/// phish_loader --dry-run check-urls --urls-file urls.txt
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Write to an in-memory store and log the rows instead of PostgreSQL
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// HTTP request timeout in seconds (no timeout when unset)
    #[arg(long, global = true, env = "PHISH_LOADER_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape the phishing trends report into phishing_trends, phishing_ai_mentions and brand_impersonation
    Report {
        /// Report page to scrape
        #[arg(long, env = "REPORT_URL", default_value = REPORT_URL)]
        report_url: String,
    },
    /// Load the benchmark tables transcribed from the report
    Benchmarks,
    /// Check URLs against PhishTank and store the verdicts
    CheckUrls(CheckUrlsArgs),
}

#[derive(Args, Debug)]
pub struct CheckUrlsArgs {
    /// URLs to check; a leading phish ID column (`<id>\t<url>`) is ignored
    pub urls: Vec<String>,

    /// File with one URL per line (`#` starts a comment)
    #[arg(long)]
    pub urls_file: Option<PathBuf>,

    /// Record this verdict for every URL instead of the API's classification
    #[arg(long, value_enum)]
    pub force_status: Option<PhishingStatus>,

    /// Destination table set
    #[arg(long, value_enum, default_value_t = Destination::Facts)]
    pub destination: Destination,

    /// Abort on the first failed URL
    #[arg(long)]
    pub fail_fast: bool,

    /// Milliseconds to wait between requests
    #[arg(long, default_value_t = 0)]
    pub delay_ms: u64,

    /// User-Agent sent to PhishTank (`phishtank/<username>`)
    #[arg(long, env = "PHISHTANK_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// checkurl endpoint
    #[arg(long, env = "PHISHTANK_ENDPOINT", default_value = CHECKURL_ENDPOINT)]
    pub endpoint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_defaults() {
        let cli = Cli::parse_from(["phish_loader", "report"]);
        assert!(!cli.dry_run);
        match cli.command {
            Command::Report { report_url } => assert_eq!(report_url, REPORT_URL),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_dry_run_after_subcommand() {
        let cli = Cli::parse_from(["phish_loader", "benchmarks", "--dry-run"]);
        assert!(cli.dry_run);
        assert!(matches!(cli.command, Command::Benchmarks));
    }

    #[test]
    fn test_check_urls_options() {
        let cli = Cli::parse_from([
            "phish_loader",
            "check-urls",
            "--force-status",
            "verified",
            "--destination",
            "results",
            "--delay-ms",
            "250",
            "http://a.example",
            "http://b.example",
        ]);
        let Command::CheckUrls(args) = cli.command else {
            panic!("expected check-urls");
        };
        assert_eq!(args.urls, vec!["http://a.example", "http://b.example"]);
        assert_eq!(args.force_status, Some(PhishingStatus::Verified));
        assert_eq!(args.destination, Destination::Results);
        assert_eq!(args.delay_ms, 250);
        assert!(!args.fail_fast);
    }

    #[test]
    fn test_check_urls_defaults_to_facts() {
        let cli = Cli::parse_from(["phish_loader", "check-urls", "http://a.example"]);
        let Command::CheckUrls(args) = cli.command else {
            panic!("expected check-urls");
        };
        assert_eq!(args.destination, Destination::Facts);
        assert_eq!(args.force_status, None);
    }

    #[test]
    fn test_check_urls_has_no_retry_option() {
        let parsed = Cli::try_parse_from([
            "phish_loader",
            "check-urls",
            "--max-retries",
            "3",
            "http://a.example",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
