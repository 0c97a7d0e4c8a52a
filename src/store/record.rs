//! The persisted credential/config record and its expiry predicates.

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Reactive expiry margin: a token within this window of its recorded expiry
/// is treated as already expired, absorbing clock skew and in-flight latency.
const DEFAULT_EXPIRY_MARGIN: Duration = Duration::from_secs(5 * 60);
/// Proactive window used by the background sweep. Fires well before the
/// reactive margin so foreground calls rarely observe an expired token.
const DEFAULT_REFRESH_WINDOW: Duration = Duration::from_secs(48 * 60 * 60);
/// Period of the background refresh sweep.
const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(12 * 60 * 60);

/// Timing knobs for the credential lifecycle.
///
/// Neither margin is derived from the vendor's published token lifetime, so
/// they are carried as parameters rather than burned in at call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    /// Reactive margin applied by the token guard before every API call.
    pub expiry_margin: Duration,
    /// Proactive window checked by the background refresh sweep.
    pub refresh_window: Duration,
    /// How often the background refresh sweep runs.
    pub refresh_period: Duration,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            expiry_margin: DEFAULT_EXPIRY_MARGIN,
            refresh_window: DEFAULT_REFRESH_WINDOW,
            refresh_period: DEFAULT_REFRESH_PERIOD,
        }
    }
}

/// The single persisted record for one installation.
///
/// Every field is optional: the record starts empty on first run, the
/// authorization-code grant fills the credential fields during setup, and
/// each successful refresh rotates `access_token`/`refresh_token` together
/// with a recomputed `token_expires_at`. Scheduling preferences live in the
/// same record for persistence convenience only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OuraConfig {
    /// Vendor application id, set once during setup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Vendor application secret, set once during setup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// Opaque bearer token for vendor API calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Single-use refresh token; the vendor invalidates it on every refresh
    /// and issues a replacement in the same response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Absolute epoch-millisecond expiry computed at save time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_channel_target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morning_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evening_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_messages: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morning_cron_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evening_cron_job_id: Option<String>,
}

impl OuraConfig {
    /// True when the token must not be used without a refresh.
    ///
    /// A record with no expiry at all also counts as expired; a token whose
    /// lifetime is unknown is never trusted.
    pub fn is_expired_at(&self, now_ms: i64, margin: Duration) -> bool {
        match self.token_expires_at {
            Some(expires_at) => now_ms.saturating_add(margin.as_millis() as i64) >= expires_at,
            None => true,
        }
    }

    /// Reactive expiry check against the wall clock.
    pub fn is_expired(&self, policy: &TokenPolicy) -> bool {
        self.is_expired_at(unix_now_millis(), policy.expiry_margin)
    }

    /// True when the token enters the proactive refresh window.
    pub fn is_expiring_soon_at(&self, now_ms: i64, window: Duration) -> bool {
        self.is_expired_at(now_ms, window)
    }

    /// Proactive window check against the wall clock.
    pub fn is_expiring_soon(&self, policy: &TokenPolicy) -> bool {
        self.is_expiring_soon_at(unix_now_millis(), policy.refresh_window)
    }

    /// True when all three values needed for a refresh grant are stored.
    pub fn has_refresh_credentials(&self) -> bool {
        self.refresh_token.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }
}

/// Token endpoint response shape shared by both grant types.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenGrant {
    /// Newly issued access token.
    pub access_token: String,
    /// Newly issued refresh token, replacing the one just consumed.
    pub refresh_token: String,
    /// Access token lifetime in seconds, valid only at the moment of issue.
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: String,
}

/// Current wall-clock time as epoch milliseconds.
pub fn unix_now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
