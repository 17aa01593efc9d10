//! On-disk profile store
//!
//! The store file is plain JSON written with owner-only permissions. It is
//! read fresh on every load; there is no in-memory cache and no locking, so
//! concurrent writers race and the last `save` wins.

use super::profile::AuthProfiles;
use crate::env::{AuthEnv, EnvSource, FileSystem, OsFileSystem};
use crate::error::{Error, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Environment override for the store location
pub const STORE_PATH_ENV: &str = "OPSPILOT_AUTH_STORE";

/// Directory under `$HOME` holding the default store
pub const STORE_DIR: &str = ".opspilot";

/// Default store file name
pub const STORE_FILE: &str = "auth-profiles.json";

/// Store path: `$OPSPILOT_AUTH_STORE`, else `~/.opspilot/auth-profiles.json`
pub fn default_store_path(env: &dyn EnvSource) -> Option<PathBuf> {
    env.non_blank_var(STORE_PATH_ENV)
        .map(PathBuf::from)
        .or_else(|| env.home_dir().map(|h| h.join(STORE_DIR).join(STORE_FILE)))
}

/// Profile store bound to one file
#[derive(Clone)]
pub struct ProfileStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl std::fmt::Debug for ProfileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ProfileStore {
    /// Store at `path` using the OS filesystem
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::with_fs(path, Arc::new(OsFileSystem))
    }

    /// Store at `path` using the given filesystem
    #[must_use]
    pub fn with_fs(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    /// Store at the default location for `auth_env`
    pub fn from_env(auth_env: &AuthEnv) -> Result<Self> {
        let path = default_store_path(auth_env.env.as_ref()).ok_or_else(|| {
            Error::NotConfigured(format!(
                "home directory not found; set {STORE_PATH_ENV} to locate the auth store"
            ))
        })?;
        Ok(Self::with_fs(path, Arc::clone(&auth_env.fs)))
    }

    /// File backing this store
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document.
    ///
    /// A missing or empty file is an empty store, not an error.
    pub fn load(&self) -> Result<AuthProfiles> {
        let content = match self.fs.read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "auth store not found, starting empty");
                return Ok(AuthProfiles::new());
            }
            Err(e) => return Err(Error::io(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(AuthProfiles::new());
        }

        serde_json::from_str(&content).map_err(|e| Error::parse(&self.path, e))
    }

    /// Write the document, creating parent directories
    pub fn save(&self, profiles: &AuthProfiles) -> Result<()> {
        let json = serde_json::to_string_pretty(profiles)
            .map_err(|e| Error::Encoding(format!("failed to serialize auth store: {e}")))?;

        self.fs
            .write_private(&self.path, json.as_bytes())
            .map_err(|e| Error::io(&self.path, e))?;

        debug!(
            path = %self.path.display(),
            profiles = profiles.profiles.len(),
            "saved auth store"
        );
        Ok(())
    }

    /// Load, apply `f`, save
    pub fn update<T>(&self, f: impl FnOnce(&mut AuthProfiles) -> Result<T>) -> Result<T> {
        let mut profiles = self.load()?;
        let out = f(&mut profiles)?;
        self.save(&profiles)?;
        Ok(out)
    }
}

/// Load the store at `path`
pub fn load(path: impl Into<PathBuf>) -> Result<AuthProfiles> {
    ProfileStore::open(path).load()
}

/// Save `profiles` to `path`
pub fn save(path: impl Into<PathBuf>, profiles: &AuthProfiles) -> Result<()> {
    ProfileStore::open(path).save(profiles)
}
