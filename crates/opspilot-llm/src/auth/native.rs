//! Native credential importer
//!
//! Reads the OAuth session file written by the Codex CLI login
//! (`~/.codex/auth.json`) and turns it into an [`AuthProfile`].
//!
//! The file is a JSON object with `access_token` and optionally
//! `refresh_token`, `account_id`, `expires_at` or `expires_in`. The CLI nests
//! these under a `tokens` object; both layouts are accepted:
//! ```json
//! {
//!   "OPENAI_API_KEY": null,
//!   "tokens": { "access_token": "eyJ...", "refresh_token": "rt_...", "account_id": "..." },
//!   "last_refresh": "2026-02-01T00:00:00Z"
//! }
//! ```

use super::claims::UnverifiedTokenClaims;
use super::expiry::resolve_expiry;
use super::profile::{profile_id_for, AuthProfile};
use crate::env::{AuthEnv, EnvSource};
use crate::error::{Error, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Provider the native session authenticates against
pub const NATIVE_PROVIDER: &str = "openai-codex";

/// Environment variable naming the CLI home directory
pub const CODEX_HOME_ENV: &str = "CODEX_HOME";

const CODEX_DIR: &str = ".codex";
const CODEX_AUTH_FILE: &str = "auth.json";

/// `$CODEX_HOME/auth.json`, else `~/.codex/auth.json`
pub fn default_native_path(env: &dyn EnvSource) -> Option<PathBuf> {
    env.non_blank_var(CODEX_HOME_ENV)
        .map(|home| PathBuf::from(home).join(CODEX_AUTH_FILE))
        .or_else(|| env.home_dir().map(|h| h.join(CODEX_DIR).join(CODEX_AUTH_FILE)))
}

/// Importer for the native OAuth session file
#[derive(Debug, Clone)]
pub struct NativeImporter {
    auth_env: AuthEnv,
    provider: String,
}

impl NativeImporter {
    /// Importer producing `openai-codex` profiles
    #[must_use]
    pub fn new(auth_env: AuthEnv) -> Self {
        Self {
            auth_env,
            provider: NATIVE_PROVIDER.to_string(),
        }
    }

    /// Override the provider stamped on imported profiles
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    /// Import from `path`, or from the default location when `None`
    pub fn import(&self, path: Option<&Path>) -> Result<AuthProfile> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_native_path(self.auth_env.env.as_ref()).ok_or_else(|| {
                Error::NotConfigured(format!(
                    "home directory not found; set {CODEX_HOME_ENV} or pass a path"
                ))
            })?,
        };

        debug!(path = %path.display(), "importing native credentials");

        let content = self
            .auth_env
            .fs
            .read_to_string(&path)
            .map_err(|e| Error::io(&path, e))?;

        let profile = self.parse(&content, &path)?;
        info!(
            profile = %profile.id,
            provider = %profile.provider,
            expires_at = ?profile.expires_at,
            "imported native credentials"
        );
        Ok(profile)
    }

    /// Build a profile from file contents; `origin` is used for messages
    pub fn parse(&self, content: &str, origin: &Path) -> Result<AuthProfile> {
        let root: Value = serde_json::from_str(content).map_err(|e| Error::parse(origin, e))?;
        let root = root
            .as_object()
            .ok_or_else(|| Error::parse(origin, "expected a JSON object"))?;

        // CLI layout nests the token fields under "tokens"
        let fields = match root.get("tokens") {
            Some(Value::Object(nested)) => nested,
            _ => root,
        };

        let access_token = string_field(fields, "access_token")
            .ok_or_else(|| Error::NoUsableToken(origin.display().to_string()))?;
        let refresh_token = string_field(fields, "refresh_token");

        let expires_at = resolve_expiry(
            field(fields, root, "expires_at"),
            field(fields, root, "expires_in"),
            self.auth_env.clock.now(),
        )
        .map_err(|e| Error::parse(origin, e))?;

        let account_id = string_field(fields, "account_id")
            .or_else(|| string_field(root, "account_id"))
            .or_else(|| UnverifiedTokenClaims::decode(&access_token).and_then(|c| c.account_id()));

        let mut profile = AuthProfile::new(
            profile_id_for(&self.provider, account_id.as_deref()),
            self.provider.clone(),
        )
        .with_access_token(access_token)
        .with_source(format!("native-import:{}", origin.display()));
        profile.refresh_token = refresh_token;
        profile.account_id = account_id;
        profile.expires_at = expires_at;

        Ok(profile)
    }
}

fn field<'a>(fields: &'a Map<String, Value>, root: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).or_else(|| root.get(key))
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
