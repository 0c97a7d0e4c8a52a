//! Persistent store for the plugin's single config record.
//!
//! The record lives as one JSON object at a fixed per-installation path
//! (`~/.config/ouralink/config.json`). The store owns an in-memory cache and
//! serializes every mutation through one async mutex, so the token guard,
//! the background sweep, and the setup wizard never interleave their
//! read-modify-write cycles even though they are logically independent.

mod record;

pub use record::{unix_now_millis, OuraConfig, TokenGrant, TokenPolicy};

use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::StoreError;

/// File-backed store for the [`OuraConfig`] record.
pub struct ConfigStore {
    path: PathBuf,
    /// Cached record; `None` until the first load.
    cached: Mutex<Option<OuraConfig>>,
}

impl ConfigStore {
    /// Create a store backed by an explicit file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cached: Mutex::new(None),
        }
    }

    /// Create a store at the default per-installation location when the
    /// platform config directory can be resolved.
    pub fn at_default_path() -> Option<Self> {
        default_config_path().map(Self::new)
    }

    /// Backing file path for this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole record.
    ///
    /// A missing or unreadable file yields an empty record, so first-run and
    /// post-corruption both degrade to "not configured" rather than erroring.
    pub async fn get(&self) -> OuraConfig {
        let mut cached = self.cached.lock().await;
        if let Some(config) = cached.as_ref() {
            return config.clone();
        }
        let loaded = load_record(&self.path);
        *cached = Some(loaded.clone());
        loaded
    }

    /// Read-modify-write the record under the store lock.
    ///
    /// This is the only mutation primitive: callers patch whichever fields
    /// they own and the whole record is written back. On a write failure the
    /// cache is dropped so the next read reflects what is actually on disk.
    pub async fn update<F>(&self, apply: F) -> Result<OuraConfig, StoreError>
    where
        F: FnOnce(&mut OuraConfig),
    {
        let mut cached = self.cached.lock().await;
        let mut config = match cached.take() {
            Some(config) => config,
            None => load_record(&self.path),
        };
        apply(&mut config);
        write_record(&self.path, &config)?;
        *cached = Some(config.clone());
        Ok(config)
    }

    /// Persist a grant response: both tokens and the recomputed absolute
    /// expiry are written together, never individually.
    pub async fn save_tokens(&self, grant: &TokenGrant) -> Result<(), StoreError> {
        let expires_at = unix_now_millis().saturating_add(grant.expires_in.saturating_mul(1000));
        self.update(|config| {
            config.access_token = Some(grant.access_token.clone());
            config.refresh_token = Some(grant.refresh_token.clone());
            config.token_expires_at = Some(expires_at);
        })
        .await?;
        Ok(())
    }
}

/// Default record location under the platform config root.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ouralink").join("config.json"))
}

fn load_record(path: &Path) -> OuraConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
            tracing::warn!(
                "config record at {} is unreadable ({err}); treating as empty",
                path.display()
            );
            OuraConfig::default()
        }),
        Err(_) => OuraConfig::default(),
    }
}

fn write_record(path: &Path, config: &OuraConfig) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700));
        }
    }

    let text = serde_json::to_string_pretty(config)?;
    let mut options = std::fs::OpenOptions::new();
    options.create(true).truncate(true).write(true);
    #[cfg(unix)]
    {
        // The record holds bearer credentials; keep it owner-only.
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(text.as_bytes())?;
    file.flush()?;
    Ok(())
}
