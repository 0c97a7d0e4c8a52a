//! Credential lifecycle: OAuth grants, callback capture, and the token guard.
//!
//! This module owns the only subsystem with real invariants to protect. The
//! vendor's refresh token is single-use, so the refresh path is a critical
//! section ([`TokenGuard`]), the rotated pair is always persisted atomically
//! from the caller's perspective, and the local redirect listener releases
//! its port on every exit path.

mod browser;
mod callback;
mod guard;
mod oauth;

pub use browser::try_open_browser;
pub use callback::{CallbackServer, CALLBACK_PORT, CALLBACK_TIMEOUT};
pub use guard::TokenGuard;
pub use oauth::{
    build_authorize_url, generate_state, OauthClient, AUTHORIZE_URL, REDIRECT_URI, SCOPES,
    TOKEN_URL,
};
