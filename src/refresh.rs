//! Proactive background token refresh.
//!
//! A slow periodic sweep that rotates the token pair well before the token
//! guard's reactive margin would ever fire, so foreground requests rarely
//! pay for a refresh. This path runs unattended inside the host process:
//! failures are logged and left for the next period, never raised.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::auth::TokenGuard;

/// Spawn the periodic sweep at the guard's configured refresh period.
///
/// The first sweep runs immediately, which doubles as a startup repair for
/// installations whose token went stale while the host was down.
pub fn spawn_refresh_task(guard: Arc<TokenGuard>) -> JoinHandle<()> {
    let period = guard.policy().refresh_period;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_refresh_sweep(&guard).await;
        }
    })
}

/// One sweep iteration: no-op when the plugin is not configured, refresh
/// when the token is inside the proactive window, log-and-continue on
/// failure (the period is the retry interval).
pub async fn run_refresh_sweep(guard: &TokenGuard) {
    let config = guard.store().get().await;
    if config.client_id.is_none() || config.client_secret.is_none() || config.refresh_token.is_none()
    {
        tracing::debug!("refresh sweep skipped; plugin not configured");
        return;
    }

    match guard.refresh_if_expiring().await {
        Ok(Some(_)) => tracing::info!("proactive token refresh completed"),
        Ok(None) => tracing::debug!("token outside proactive window; nothing to refresh"),
        Err(err) => {
            tracing::warn!("proactive token refresh failed, retrying next period: {err}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::OauthClient;
    use crate::store::{unix_now_millis, ConfigStore, OuraConfig, TokenPolicy};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const HOUR_MS: i64 = 3_600_000;

    fn grant_body() -> serde_json::Value {
        serde_json::json!({
            "access_token": "swept-access",
            "refresh_token": "swept-refresh",
            "expires_in": 86_400,
            "token_type": "Bearer"
        })
    }

    async fn guard_with(
        server: &MockServer,
        config: OuraConfig,
    ) -> (tempfile::TempDir, Arc<ConfigStore>, TokenGuard) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = Arc::new(ConfigStore::new(dir.path().join("config.json")));
        store.update(|record| *record = config).await.expect("seed");
        let guard = TokenGuard::new(
            store.clone(),
            OauthClient::with_token_url(format!("{}/oauth/token", server.uri())),
            TokenPolicy::default(),
        );
        (dir, store, guard)
    }

    #[tokio::test]
    async fn unconfigured_record_skips_the_network_entirely() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(grant_body()))
            .expect(0)
            .mount(&server)
            .await;

        let (_dir, _store, guard) = guard_with(&server, OuraConfig::default()).await;
        run_refresh_sweep(&guard).await;
    }

    #[tokio::test]
    async fn expiring_token_is_rotated_by_the_sweep() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(grant_body()))
            .expect(1)
            .mount(&server)
            .await;

        let config = OuraConfig {
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            access_token: Some("old-access".into()),
            refresh_token: Some("old-refresh".into()),
            // A day out: inside the 48h proactive window.
            token_expires_at: Some(unix_now_millis() + 24 * HOUR_MS),
            ..OuraConfig::default()
        };
        let (_dir, store, guard) = guard_with(&server, config).await;

        run_refresh_sweep(&guard).await;

        let stored = store.get().await;
        assert_eq!(stored.access_token.as_deref(), Some("swept-access"));
        assert_eq!(stored.refresh_token.as_deref(), Some("swept-refresh"));
    }

    #[tokio::test]
    async fn failed_sweep_is_swallowed_and_leaves_the_record_alone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth/token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let config = OuraConfig {
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            access_token: Some("old-access".into()),
            refresh_token: Some("old-refresh".into()),
            token_expires_at: Some(unix_now_millis() + 24 * HOUR_MS),
            ..OuraConfig::default()
        };
        let (_dir, store, guard) = guard_with(&server, config.clone()).await;

        // Must not panic or propagate.
        run_refresh_sweep(&guard).await;
        assert_eq!(store.get().await, config);
    }
}
