//! One-shot local HTTP listener for the OAuth redirect.
//!
//! The listener is a scoped resource: the bound port is released on every
//! exit path (success, vendor error, malformed callback, timeout) so a
//! retried setup never collides with a leftover socket. Exactly one callback
//! is consumed; once it arrives the server shuts down and later connection
//! attempts to the port are refused.

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::CallbackError;

/// Fixed port the registered redirect URI points at.
pub const CALLBACK_PORT: u16 = 9876;
/// How long setup waits for the user's browser to redirect back.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(120);

const SUCCESS_PAGE: &str = "<html><body><h2>Ouralink authorized!</h2>\
<p>You can close this tab and return to the terminal.</p></body></html>";

type CallbackResult = Result<String, CallbackError>;

/// Shared per-listener state consulted by the request handler.
struct PendingCallback {
    expected_state: Option<String>,
    result_tx: StdMutex<Option<oneshot::Sender<CallbackResult>>>,
}

/// A bound, not-yet-consumed callback listener.
pub struct CallbackServer {
    port: u16,
    result_rx: oneshot::Receiver<CallbackResult>,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl CallbackServer {
    /// Bind the loopback listener on the fixed callback port.
    ///
    /// When `expected_state` is set, redirects carrying any other `state`
    /// value are rejected instead of resolving.
    pub async fn bind(expected_state: Option<String>) -> Result<Self, CallbackError> {
        Self::bind_on(CALLBACK_PORT, expected_state).await
    }

    /// Bind on an explicit port. Tests pass 0 for an ephemeral port.
    pub async fn bind_on(port: u16, expected_state: Option<String>) -> Result<Self, CallbackError> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await?;
        let port = listener.local_addr()?.port();

        let (result_tx, result_rx) = oneshot::channel();
        let pending = Arc::new(PendingCallback {
            expected_state,
            result_tx: StdMutex::new(Some(result_tx)),
        });

        let app = Router::new().route(
            "/callback",
            get({
                let pending = pending.clone();
                move |Query(params): Query<HashMap<String, String>>| {
                    let pending = pending.clone();
                    async move { handle_callback(&params, &pending) }
                }
            }),
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            if let Err(err) = server.await {
                tracing::error!("oauth callback listener failed: {err}");
            }
        });

        Ok(Self {
            port,
            result_rx,
            shutdown_tx,
            handle,
        })
    }

    /// Port the listener is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait for exactly one callback, then shut the listener down.
    ///
    /// The timeout cancels the pending accept rather than abandoning the
    /// socket; by the time this returns, the port is free again.
    pub async fn wait_for_code(self, timeout: Duration) -> CallbackResult {
        let CallbackServer {
            result_rx,
            shutdown_tx,
            handle,
            ..
        } = self;

        let outcome = match tokio::time::timeout(timeout, result_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CallbackError::Closed),
            Err(_) => Err(CallbackError::Timeout(timeout.as_secs())),
        };

        let _ = shutdown_tx.send(());
        let _ = handle.await;
        outcome
    }
}

/// Serve one callback request and hand its outcome to the waiting task.
fn handle_callback(
    params: &HashMap<String, String>,
    pending: &PendingCallback,
) -> (StatusCode, Html<String>) {
    let Some(result_tx) = pending
        .result_tx
        .lock()
        .expect("callback result sender poisoned")
        .take()
    else {
        // The single callback was already consumed; shutdown is imminent.
        return (
            StatusCode::NOT_FOUND,
            Html("<html><body>No pending authorization.</body></html>".to_string()),
        );
    };

    let outcome = evaluate_callback(params, pending.expected_state.as_deref());
    let response = match &outcome {
        Ok(_) => (StatusCode::OK, Html(SUCCESS_PAGE.to_string())),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Html(format!("<html><body><h2>Authorization failed</h2><p>{err}</p></body></html>")),
        ),
    };
    let _ = result_tx.send(outcome);
    response
}

/// Classify one callback request into a code or a failure.
fn evaluate_callback(
    params: &HashMap<String, String>,
    expected_state: Option<&str>,
) -> CallbackResult {
    if let Some(cause) = params.get("error") {
        return Err(CallbackError::Denied(cause.clone()));
    }
    let Some(code) = params.get("code").filter(|code| !code.is_empty()) else {
        return Err(CallbackError::MissingCode);
    };
    if let Some(expected) = expected_state {
        let received = params.get("state").cloned();
        if received.as_deref() != Some(expected) {
            return Err(CallbackError::StateMismatch {
                expected: expected.to_string(),
                received,
            });
        }
    }
    Ok(code.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn fire_callback(port: u16, query: &str) -> reqwest::Response {
        reqwest::get(format!("http://127.0.0.1:{port}/callback?{query}"))
            .await
            .expect("callback request")
    }

    #[tokio::test]
    async fn resolves_with_code_and_releases_the_port() {
        let server = CallbackServer::bind_on(0, None).await.expect("bind");
        let port = server.port();

        let request = tokio::spawn(async move { fire_callback(port, "code=abc123").await });
        let code = server
            .wait_for_code(Duration::from_secs(5))
            .await
            .expect("code resolves");
        assert_eq!(code, "abc123");

        let response = request.await.expect("request task");
        assert_eq!(response.status(), 200);

        // The listener is gone: a second connection attempt is refused.
        assert!(
            tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_err(),
            "port should be released after the callback is consumed"
        );
    }

    #[tokio::test]
    async fn vendor_error_parameter_fails_the_capture() {
        let server = CallbackServer::bind_on(0, None).await.expect("bind");
        let port = server.port();

        let request = tokio::spawn(async move { fire_callback(port, "error=access_denied").await });
        let err = server
            .wait_for_code(Duration::from_secs(5))
            .await
            .expect_err("must fail");
        match err {
            CallbackError::Denied(cause) => assert_eq!(cause, "access_denied"),
            other => panic!("expected denial, got {other}"),
        }
        assert_eq!(request.await.expect("request task").status(), 400);
    }

    #[tokio::test]
    async fn missing_code_fails_the_capture() {
        let server = CallbackServer::bind_on(0, None).await.expect("bind");
        let port = server.port();

        let request = tokio::spawn(async move { fire_callback(port, "foo=bar").await });
        let err = server
            .wait_for_code(Duration::from_secs(5))
            .await
            .expect_err("must fail");
        assert!(matches!(err, CallbackError::MissingCode));
        assert_eq!(request.await.expect("request task").status(), 400);
    }

    #[tokio::test]
    async fn state_mismatch_fails_the_capture() {
        let server = CallbackServer::bind_on(0, Some("expected-state".into()))
            .await
            .expect("bind");
        let port = server.port();

        tokio::spawn(async move { fire_callback(port, "code=abc&state=wrong").await });
        let err = server
            .wait_for_code(Duration::from_secs(5))
            .await
            .expect_err("must fail");
        match err {
            CallbackError::StateMismatch { expected, received } => {
                assert_eq!(expected, "expected-state");
                assert_eq!(received.as_deref(), Some("wrong"));
            }
            other => panic!("expected state mismatch, got {other}"),
        }
    }

    #[tokio::test]
    async fn matching_state_resolves() {
        let server = CallbackServer::bind_on(0, Some("s123".into()))
            .await
            .expect("bind");
        let port = server.port();

        tokio::spawn(async move { fire_callback(port, "code=abc&state=s123").await });
        let code = server
            .wait_for_code(Duration::from_secs(5))
            .await
            .expect("resolves");
        assert_eq!(code, "abc");
    }

    #[tokio::test]
    async fn unknown_path_returns_404_and_keeps_waiting() {
        let server = CallbackServer::bind_on(0, None).await.expect("bind");
        let port = server.port();

        let other = reqwest::get(format!("http://127.0.0.1:{port}/favicon.ico"))
            .await
            .expect("request");
        assert_eq!(other.status(), 404);

        // The real callback still resolves afterwards.
        tokio::spawn(async move { fire_callback(port, "code=later").await });
        let code = server
            .wait_for_code(Duration::from_secs(5))
            .await
            .expect("resolves");
        assert_eq!(code, "later");
    }

    #[tokio::test]
    async fn timeout_fails_and_releases_the_port() {
        let server = CallbackServer::bind_on(0, None).await.expect("bind");
        let port = server.port();

        let err = server
            .wait_for_code(Duration::from_millis(50))
            .await
            .expect_err("must time out");
        assert!(matches!(err, CallbackError::Timeout(_)));

        // The port can be bound again immediately after the timeout path.
        let rebound = CallbackServer::bind_on(port, None).await.expect("rebind");
        drop(rebound);
    }
}
