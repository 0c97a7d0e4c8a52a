//! Ouralink — an Oura Ring integration plugin for a chat/agent host.
//!
//! The crate connects the Oura cloud API to an agent host: it manages the
//! OAuth2 credential lifecycle (authorization-code exchange, persistence,
//! and single-use refresh-token rotation), exposes a thin typed client for
//! the vendor's collection endpoints, publishes the `oura_data` agent tool,
//! and registers morning/evening summary jobs on the host's scheduler.
//!
//! # Quick start (host embedding)
//!
//! ```no_run
//! use std::sync::Arc;
//! use ouralink::auth::{OauthClient, TokenGuard};
//! use ouralink::client::OuraClient;
//! use ouralink::refresh::spawn_refresh_task;
//! use ouralink::store::{ConfigStore, TokenPolicy};
//! use ouralink::tools::oura_data::OuraDataTool;
//! use ouralink::tools::ToolRegistry;
//!
//! # fn example() {
//! let store = Arc::new(ConfigStore::at_default_path().unwrap());
//! let guard = Arc::new(TokenGuard::new(store, OauthClient::new(), TokenPolicy::default()));
//! let mut tools = ToolRegistry::new();
//! tools.register(OuraDataTool::new(guard.clone(), OuraClient::new()));
//! let _refresher = spawn_refresh_task(guard);
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod cron;
pub mod error;
pub mod refresh;
pub mod store;
pub mod tools;
pub mod types;
pub mod wizard;
