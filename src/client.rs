//! Thin typed client for the vendor's user-collection endpoints.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ApiError;

/// Base URL of the vendor's v2 collection API.
pub const API_BASE: &str = "https://api.ouraring.com/v2/usercollection";
/// Shared HTTP timeout for data requests.
const DATA_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// The collection endpoints this integration exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OuraEndpoint {
    DailySleep,
    DailyReadiness,
    DailyActivity,
    /// Detailed per-period sleep records, as opposed to the daily score.
    Sleep,
    DailyStress,
}

impl OuraEndpoint {
    pub const ALL: [OuraEndpoint; 5] = [
        OuraEndpoint::DailySleep,
        OuraEndpoint::DailyReadiness,
        OuraEndpoint::DailyActivity,
        OuraEndpoint::Sleep,
        OuraEndpoint::DailyStress,
    ];

    /// Path segment used by the vendor API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DailySleep => "daily_sleep",
            Self::DailyReadiness => "daily_readiness",
            Self::DailyActivity => "daily_activity",
            Self::Sleep => "sleep",
            Self::DailyStress => "daily_stress",
        }
    }
}

impl fmt::Display for OuraEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OuraEndpoint {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|endpoint| endpoint.as_str() == value)
            .ok_or_else(|| format!("unknown endpoint: {value}"))
    }
}

/// One page of a vendor collection response.
///
/// `next_token` is passed through verbatim; this client does not paginate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Authenticated client for the vendor data API.
pub struct OuraClient {
    http: reqwest::Client,
    base_url: String,
}

impl OuraClient {
    /// Client against the real vendor API.
    pub fn new() -> Self {
        Self::with_base_url(API_BASE)
    }

    /// Client against an explicit base URL (tests point this at a double).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(DATA_HTTP_TIMEOUT)
            .user_agent(concat!("ouralink/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    /// Fetch one collection page. No retry, no pagination; non-2xx and
    /// unparsable bodies fail with the raw status/body.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        access_token: &str,
        endpoint: OuraEndpoint,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<Collection<T>, ApiError> {
        let mut request = self
            .http
            .get(format!("{}/{}", self.base_url, endpoint.as_str()))
            .bearer_auth(access_token);
        if let Some(start) = start_date {
            request = request.query(&[("start_date", start)]);
        }
        if let Some(end) = end_date {
            request = request.query(&[("end_date", end)]);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16(), body));
        }
        serde_json::from_str(&body).map_err(|_| ApiError::Decode(body))
    }
}

impl Default for OuraClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Default fetch range: today through tomorrow, computed from the local
/// calendar so "today" matches the user's day rather than UTC's.
pub fn default_date_range() -> (String, String) {
    let today = chrono::Local::now().date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);
    (
        today.format("%Y-%m-%d").to_string(),
        tomorrow.format("%Y-%m-%d").to_string(),
    )
}
