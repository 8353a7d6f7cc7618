//! PhishTank `checkurl` client and verdict classification.
//!
//! The API takes a base64-encoded URL in a form-encoded POST body and answers
//! with JSON of the shape:
//!
//! ```text
//! {"results": {"url": "...", "in_database": true, "verified": "y", "valid": "y"},
//!  "meta": {"timestamp": "..."}}
//! ```
//!
//! # Architecture
//!
//! - [`ReputationLookup`]: submits one URL and returns the raw response body
//! - [`PhishTankClient`]: the HTTP implementation
//! - [`parse_response`], [`classify`], [`evaluate`]: turn a body into a
//!   [`PhishtankResult`] row
//!
//! Each URL is submitted exactly once. A failed request is reported to the
//! caller, which decides whether the batch continues.

use crate::error::{EtlError, Result};
use crate::models::{PhishingStatus, PhishtankResult};
use crate::utils::truncate_for_log;
use base64::prelude::*;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Deserializer};
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// Default `checkurl` endpoint.
pub const CHECKURL_ENDPOINT: &str = "https://checkurl.phishtank.com/checkurl/";

/// PhishTank asks clients to identify themselves as `phishtank/<username>`.
pub const DEFAULT_USER_AGENT: &str = "phishtank/phish_loader";

/// Trait for submitting URLs to a reputation service.
///
/// The loaders only depend on this trait, so tests can swap in canned
/// responses for the HTTP client.
pub trait ReputationLookup {
    /// Submit a URL and return the raw response body.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to check, exactly as it will be stored
    ///
    /// # Returns
    ///
    /// The response body (possibly empty), or an error for transport
    /// failures and non-2xx statuses.
    async fn lookup(&self, url: &str) -> Result<String>;
}

/// HTTP client for the PhishTank `checkurl` endpoint.
///
/// Sends one form-encoded POST per URL with the configured `User-Agent`.
#[derive(Debug, Clone)]
pub struct PhishTankClient {
    /// Shared HTTP client (timeouts are configured on it).
    client: reqwest::Client,
    /// Endpoint that receives the POST.
    endpoint: String,
    /// Value of the `User-Agent` header.
    user_agent: String,
}

impl PhishTankClient {
    /// Create a client for the default endpoint.
    ///
    /// # Arguments
    ///
    /// * `client` - The HTTP client to send requests with
    /// * `user_agent` - Identification string, `phishtank/<username>`
    pub fn new(client: reqwest::Client, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: CHECKURL_ENDPOINT.to_string(),
            user_agent: user_agent.into(),
        }
    }

    /// Point the client at another endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Form body for a check request.
///
/// # Returns
///
/// The `url` field holding the standard base64 encoding of the URL's UTF-8
/// bytes, followed by `format=json`.
pub fn encode_form(url: &str) -> [(&'static str, String); 2] {
    [
        ("url", BASE64_STANDARD.encode(url.as_bytes())),
        ("format", "json".to_string()),
    ]
}

impl ReputationLookup for PhishTankClient {
    #[instrument(level = "info", skip(self))]
    async fn lookup(&self, url: &str) -> Result<String> {
        let t0 = Instant::now();
        // `form` sets Content-Type: application/x-www-form-urlencoded.
        let resp = self
            .client
            .post(&self.endpoint)
            .header(USER_AGENT, &self.user_agent)
            .form(&encode_form(url))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                body = %truncate_for_log(&body, 300),
                "checkurl returned an error status"
            );
            return Err(EtlError::Status {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let body = resp.text().await?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            bytes = body.len(),
            "checkurl responded"
        );
        Ok(body)
    }
}

/// A PhishTank yes/no field. The API has been seen to send `"y"`/`"n"`
/// strings as well as JSON booleans; anything missing or null is "no".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flag(pub bool);

impl<'de> Deserialize<'de> for Flag {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Int(i64),
            Text(String),
        }

        let value = match Option::<Raw>::deserialize(deserializer)? {
            None => false,
            Some(Raw::Bool(b)) => b,
            Some(Raw::Int(n)) => n != 0,
            Some(Raw::Text(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "y" | "yes" | "true" | "1"
            ),
        };
        Ok(Flag(value))
    }
}

/// The `results` object of a `checkurl` response.
///
/// Every field is optional on the wire and defaults to empty / "no".
#[derive(Debug, Default, Deserialize)]
pub struct CheckResults {
    /// The URL as PhishTank recorded it.
    #[serde(default)]
    pub url: String,
    /// Whether PhishTank has a submission for the URL.
    #[serde(default)]
    pub in_database: Flag,
    /// Whether the community has verified the submission.
    #[serde(default)]
    pub verified: Flag,
    /// Whether the verified verdict is "is a phish".
    #[serde(default)]
    pub valid: Flag,
}

/// The `meta` object of a `checkurl` response.
#[derive(Debug, Default, Deserialize)]
pub struct CheckMeta {
    /// Server timestamp of the check, stored verbatim.
    #[serde(default)]
    pub timestamp: String,
}

/// A full `checkurl` response body.
#[derive(Debug, Default, Deserialize)]
pub struct CheckResponse {
    /// Verdict flags for the submitted URL.
    #[serde(default)]
    pub results: CheckResults,
    /// Request metadata.
    #[serde(default)]
    pub meta: CheckMeta,
}

/// Parse a response body.
///
/// # Arguments
///
/// * `body` - Raw body returned by [`ReputationLookup::lookup`]
///
/// # Returns
///
/// The parsed response, or `None` for an empty or unparseable body. The
/// caller skips the URL in that case.
pub fn parse_response(body: &str) -> Option<CheckResponse> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        warn!("Empty checkurl response body");
        return None;
    }
    match serde_json::from_str::<CheckResponse>(trimmed) {
        Ok(resp) => Some(resp),
        Err(e) => {
            warn!(
                error = %e,
                body = %truncate_for_log(trimmed, 300),
                "Unparseable checkurl response body"
            );
            None
        }
    }
}

/// Map the API flags to a verdict.
///
/// `valid` decides first (verified or not), then absence from the database,
/// and everything else is "Not Phishing".
pub fn classify(valid: bool, verified: bool, in_database: bool) -> PhishingStatus {
    match (valid, verified, in_database) {
        (true, true, _) => PhishingStatus::Verified,
        (true, false, _) => PhishingStatus::Unverified,
        (false, _, false) => PhishingStatus::NotInDatabase,
        (false, _, true) => PhishingStatus::NotPhishing,
    }
}

/// Turn a parsed response into a result row.
///
/// # Arguments
///
/// * `submitted` - The URL that was sent, used when the response omits one
/// * `response` - The parsed response
/// * `force` - Verdict to record instead of the computed one
///
/// # Returns
///
/// A [`PhishtankResult`] carrying the response's `in_database` flag and
/// timestamp.
pub fn evaluate(
    submitted: &str,
    response: CheckResponse,
    force: Option<PhishingStatus>,
) -> PhishtankResult {
    let CheckResponse { results, meta } = response;
    let in_database = results.in_database.0;
    let phishing_status = force
        .unwrap_or_else(|| classify(results.valid.0, results.verified.0, in_database));
    let url = if results.url.trim().is_empty() {
        submitted.to_string()
    } else {
        results.url
    };

    PhishtankResult {
        url,
        in_database,
        phishing_status,
        timestamp: meta.timestamp,
    }
}
