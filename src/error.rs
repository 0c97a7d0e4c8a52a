//! Unified error types for the plugin.

use std::fmt;

// ---------------------------------------------------------------------------
// CallbackError
// ---------------------------------------------------------------------------

/// Failures observed while waiting for the local OAuth redirect.
#[derive(Debug)]
pub enum CallbackError {
    /// The vendor redirected back with an `error` query parameter.
    Denied(String),
    /// The callback arrived without a `code` query parameter.
    MissingCode,
    /// The callback's `state` did not match the pending authorization attempt.
    StateMismatch {
        expected: String,
        received: Option<String>,
    },
    /// No callback arrived before the wait limit (seconds) elapsed.
    Timeout(u64),
    /// The listener could not bind or serve on the callback port.
    Io(std::io::Error),
    /// The listener stopped before delivering a callback.
    Closed,
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denied(cause) => write!(f, "authorization denied by vendor: {cause}"),
            Self::MissingCode => write!(f, "callback did not include an authorization code"),
            Self::StateMismatch { expected, received } => write!(
                f,
                "callback state mismatch (expected {expected}, received {})",
                received.as_deref().unwrap_or("<none>")
            ),
            Self::Timeout(secs) => write!(f, "no oauth callback received within {secs}s"),
            Self::Io(err) => write!(f, "callback listener: {err}"),
            Self::Closed => write!(f, "callback listener closed before a redirect arrived"),
        }
    }
}

impl std::error::Error for CallbackError {}

impl From<std::io::Error> for CallbackError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

/// Failures persisting the plugin config record.
///
/// Read-side problems (missing or corrupt file) are not errors; the store
/// degrades to an empty record so first-run and post-corruption behave the
/// same way.
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Json(err) => write!(f, "json: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

// ---------------------------------------------------------------------------
// AuthError
// ---------------------------------------------------------------------------

/// Errors surfaced by the credential lifecycle.
#[derive(Debug)]
pub enum AuthError {
    /// No access token has ever been obtained.
    NotAuthenticated,
    /// The access token expired and the stored data cannot refresh it.
    MissingRefreshCredentials,
    /// The local redirect capture failed.
    Callback(CallbackError),
    /// Non-2xx status from the token endpoint, with the raw body.
    Status(u16, String),
    /// 2xx token-endpoint response whose body did not parse.
    Decode(String),
    /// Network / reqwest-level failure.
    Http(reqwest::Error),
    /// The rotated token pair could not be persisted.
    Store(StoreError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => write!(
                f,
                "no access token configured; run `ouralink setup` to authenticate"
            ),
            Self::MissingRefreshCredentials => write!(
                f,
                "token expired and cannot be refreshed with stored credentials; run `ouralink setup` again"
            ),
            Self::Callback(err) => write!(f, "oauth callback: {err}"),
            Self::Status(code, body) => write!(f, "token endpoint status {code}: {body}"),
            Self::Decode(body) => write!(f, "unparsable token endpoint response: {body}"),
            Self::Http(err) => write!(f, "http: {err}"),
            Self::Store(err) => write!(f, "store: {err}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<CallbackError> for AuthError {
    fn from(value: CallbackError) -> Self {
        Self::Callback(value)
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

impl From<StoreError> for AuthError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors from the vendor data endpoints.
#[derive(Debug)]
pub enum ApiError {
    /// Network / reqwest-level failure.
    Http(reqwest::Error),
    /// Non-2xx status from the data endpoint, with the raw body.
    Status(u16, String),
    /// 2xx response whose body did not parse as the expected collection.
    Decode(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => write!(f, "http: {err}"),
            Self::Status(code, body) => write!(f, "data endpoint status {code}: {body}"),
            Self::Decode(body) => write!(f, "unparsable data endpoint response: {body}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        Self::Http(value)
    }
}

// ---------------------------------------------------------------------------
// CronError
// ---------------------------------------------------------------------------

/// Errors registering or removing scheduled jobs on the host.
#[derive(Debug)]
pub enum CronError {
    /// A schedule time was not a valid `HH:MM` value.
    InvalidTime(String),
    /// The host command could not be spawned.
    Io(std::io::Error),
    /// The host command ran and reported failure.
    Host { status: i32, stderr: String },
    /// The job spec could not be serialized for the host.
    Json(serde_json::Error),
    /// Recording the job ids in the config record failed.
    Store(StoreError),
}

impl fmt::Display for CronError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTime(value) => {
                write!(f, "invalid schedule time (expected HH:MM): {value}")
            }
            Self::Io(err) => write!(f, "host command: {err}"),
            Self::Host { status, stderr } => {
                write!(f, "host command exited with status {status}: {stderr}")
            }
            Self::Json(err) => write!(f, "job spec serialization: {err}"),
            Self::Store(err) => write!(f, "store: {err}"),
        }
    }
}

impl std::error::Error for CronError {}

impl From<std::io::Error> for CronError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CronError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<StoreError> for CronError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

// ---------------------------------------------------------------------------
// ToolError
// ---------------------------------------------------------------------------

/// Errors arising from agent tool execution.
#[derive(Debug)]
pub enum ToolError {
    /// The model supplied arguments the tool couldn't parse.
    InvalidArguments(String),
    /// The tool ran but encountered a failure.
    ExecutionFailed(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArguments(msg) => write!(f, "invalid arguments: {msg}"),
            Self::ExecutionFailed(msg) => write!(f, "execution failed: {msg}"),
        }
    }
}

impl std::error::Error for ToolError {}
