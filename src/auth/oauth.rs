//! Vendor OAuth2 grant calls and authorize-URL construction.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;

use crate::error::AuthError;
use crate::store::TokenGrant;

/// Vendor authorization page the user's browser is sent to.
pub const AUTHORIZE_URL: &str = "https://cloud.ouraring.com/oauth/authorize";
/// Vendor token endpoint used for both grant types.
pub const TOKEN_URL: &str = "https://api.ouraring.com/oauth/token";
/// Redirect URI registered for this integration's local callback listener.
pub const REDIRECT_URI: &str = "http://localhost:9876/callback";
/// Scope set requested during authorization.
pub const SCOPES: &str = "daily heartrate spo2";
/// Shared HTTP timeout for token endpoint requests.
const TOKEN_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the vendor authorization URL for one authorization attempt.
///
/// `state` binds the eventual callback to this attempt; the callback
/// listener rejects redirects carrying any other value.
pub fn build_authorize_url(client_id: &str, state: &str) -> String {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", REDIRECT_URI)
        .append_pair("scope", SCOPES)
        .append_pair("state", state)
        .finish();
    format!("{AUTHORIZE_URL}?{query}")
}

/// Random per-attempt `state` value for the authorize URL.
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Client for the vendor token endpoint.
pub struct OauthClient {
    http: reqwest::Client,
    token_url: String,
}

impl OauthClient {
    /// Client against the real vendor endpoint.
    pub fn new() -> Self {
        Self::with_token_url(TOKEN_URL)
    }

    /// Client against an explicit token endpoint (tests point this at a
    /// local double).
    pub fn with_token_url(token_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(TOKEN_HTTP_TIMEOUT)
            .user_agent(concat!("ouralink/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            token_url: token_url.into(),
        }
    }

    /// Perform the `authorization_code` grant.
    pub async fn exchange_code(
        &self,
        client_id: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<TokenGrant, AuthError> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", REDIRECT_URI),
        ];
        self.post_token_request(&form).await
    }

    /// Perform the `refresh_token` grant.
    ///
    /// The supplied refresh token is consumed by the vendor whether or not
    /// the caller persists the response, so the caller must save the
    /// rotated pair immediately on success.
    pub async fn refresh_tokens(
        &self,
        client_id: &str,
        client_secret: &str,
        refresh_token: &str,
    ) -> Result<TokenGrant, AuthError> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];
        self.post_token_request(&form).await
    }

    /// Shared form-encoded POST for both grant types. Non-2xx responses and
    /// unparsable bodies both fail with the raw status/body surfaced.
    async fn post_token_request<T: Serialize + ?Sized>(
        &self,
        form: &T,
    ) -> Result<TokenGrant, AuthError> {
        let response = self
            .http
            .post(&self.token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .form(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AuthError::Status(status.as_u16(), body));
        }
        serde_json::from_str(&body).map_err(|_| AuthError::Decode(body))
    }
}

impl Default for OauthClient {
    fn default() -> Self {
        Self::new()
    }
}
