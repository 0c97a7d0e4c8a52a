//! Token guard: the gate every vendor API call passes through.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::auth::oauth::OauthClient;
use crate::error::AuthError;
use crate::store::{unix_now_millis, ConfigStore, TokenPolicy};

/// Decides between reusing the stored access token, refreshing it, or
/// failing with a user-actionable error.
///
/// The stored refresh token is single-use: two concurrent refresh grants
/// against the same value race, and the loser invalidates the installation's
/// credentials. All refresh traffic therefore funnels through one in-process
/// lock, and a caller that arrives while a refresh is in flight re-reads the
/// store after the lock instead of issuing its own grant.
pub struct TokenGuard {
    store: Arc<ConfigStore>,
    oauth: OauthClient,
    policy: TokenPolicy,
    refresh_lock: Mutex<()>,
}

impl TokenGuard {
    pub fn new(store: Arc<ConfigStore>, oauth: OauthClient, policy: TokenPolicy) -> Self {
        Self {
            store,
            oauth,
            policy,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Backing config store.
    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    /// Lifecycle timing parameters this guard was built with.
    pub fn policy(&self) -> &TokenPolicy {
        &self.policy
    }

    /// Return an access token that is safe to use right now.
    ///
    /// Decision order:
    /// 1. no stored access token: fail without touching the network;
    /// 2. stored token outside the reactive expiry margin: return it as-is;
    /// 3. expired with incomplete refresh credentials: fail, a fresh
    ///    authorization is required;
    /// 4. expired with credentials: run the single-flight refresh and return
    ///    the rotated token.
    pub async fn ensure_valid_token(&self) -> Result<String, AuthError> {
        let config = self.store.get().await;
        let Some(access_token) = config.access_token.clone() else {
            return Err(AuthError::NotAuthenticated);
        };
        if !config.is_expired(&self.policy) {
            return Ok(access_token);
        }
        self.refresh_locked(self.policy.expiry_margin).await
    }

    /// Proactive path used by the background sweep: refresh only when the
    /// token is inside the wide refresh window. Returns the new access token
    /// when a refresh ran, `None` when nothing needed doing.
    pub async fn refresh_if_expiring(&self) -> Result<Option<String>, AuthError> {
        let config = self.store.get().await;
        if !config.is_expiring_soon(&self.policy) {
            return Ok(None);
        }
        self.refresh_locked(self.policy.refresh_window).await.map(Some)
    }

    /// Single-flight refresh grant.
    ///
    /// After taking the lock the store is read again: a caller that queued
    /// behind an in-flight refresh adopts the freshly rotated pair rather
    /// than burning the (already invalidated) refresh token a second time.
    /// A failed grant propagates without writing anything, leaving the
    /// stored record exactly as it was.
    async fn refresh_locked(&self, margin: Duration) -> Result<String, AuthError> {
        let _flight = self.refresh_lock.lock().await;

        let config = self.store.get().await;
        if let Some(access_token) = config.access_token.clone() {
            if !config.is_expired_at(unix_now_millis(), margin) {
                return Ok(access_token);
            }
        }

        let (Some(refresh_token), Some(client_id), Some(client_secret)) = (
            config.refresh_token.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
        ) else {
            return Err(AuthError::MissingRefreshCredentials);
        };

        let grant = self
            .oauth
            .refresh_tokens(&client_id, &client_secret, &refresh_token)
            .await?;
        self.store.save_tokens(&grant).await?;
        tracing::info!(
            expires_in = grant.expires_in,
            "rotated vendor token pair"
        );
        Ok(grant.access_token)
    }
}
