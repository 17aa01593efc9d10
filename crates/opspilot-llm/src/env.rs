//! Process environment seam
//!
//! Credential lookup depends on the clock, environment variables, the home
//! directory and the filesystem. Each is a trait injected through [`AuthEnv`]
//! so importers and the resolver can be exercised without touching the real
//! process environment.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

// ============================================================================
// Clock
// ============================================================================

/// Source of "now"
pub trait Clock: Send + Sync {
    /// Current UTC time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a fixed instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// ============================================================================
// Environment variables and home directory
// ============================================================================

/// Environment variable and home directory lookup
pub trait EnvSource: Send + Sync {
    /// Value of an environment variable, if set
    fn var(&self, key: &str) -> Option<String>;

    /// The user's home directory
    fn home_dir(&self) -> Option<PathBuf>;

    /// Value of a variable, ignoring blank values
    fn non_blank_var(&self, key: &str) -> Option<String> {
        self.var(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

/// The real process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }
}

/// Fixed set of variables and home directory
#[derive(Debug, Default, Clone)]
pub struct StaticEnv {
    vars: HashMap<String, String>,
    home: Option<PathBuf>,
}

impl StaticEnv {
    /// Empty environment without a home directory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable
    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Set the home directory
    #[must_use]
    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }
}

impl EnvSource for StaticEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }
}

// ============================================================================
// Filesystem
// ============================================================================

/// Filesystem operations used by the credential store and importers
pub trait FileSystem: Send + Sync {
    /// Read a UTF-8 file
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write a file readable by the owner only, creating parent directories
    fn write_private(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Last modification time
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;

    /// Entries of a directory
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;

    /// Whether `path` is an existing regular file
    fn is_file(&self, path: &Path) -> bool;
}

/// `std::fs` backed filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_private(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "credentials".to_string());
        let tmp = path.with_file_name(format!(".{file_name}.tmp"));

        write_owner_only(&tmp, contents)?;
        std::fs::rename(&tmp, path)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[cfg(unix)]
fn write_owner_only(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation; tighten a pre-existing file too
    file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_owner_only(path: &Path, contents: &[u8]) -> io::Result<()> {
    std::fs::write(path, contents)
}

// ============================================================================
// Bundle
// ============================================================================

/// Clock, environment and filesystem handed to auth components
#[derive(Clone)]
pub struct AuthEnv {
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Environment variables and home directory
    pub env: Arc<dyn EnvSource>,
    /// Filesystem
    pub fs: Arc<dyn FileSystem>,
}

impl AuthEnv {
    /// The real process: wall clock, process env, OS filesystem
    #[must_use]
    pub fn system() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            env: Arc::new(ProcessEnv),
            fs: Arc::new(OsFileSystem),
        }
    }

    /// Replace the clock
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replace the environment
    #[must_use]
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Replace the filesystem
    #[must_use]
    pub fn with_fs(mut self, fs: impl FileSystem + 'static) -> Self {
        self.fs = Arc::new(fs);
        self
    }
}

impl Default for AuthEnv {
    fn default() -> Self {
        Self::system()
    }
}

impl fmt::Debug for AuthEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthEnv").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_static_env_lookup() {
        let env = StaticEnv::new()
            .with_var("A", "1")
            .with_var("BLANK", "   ")
            .with_home("/home/ops");

        assert_eq!(env.var("A").as_deref(), Some("1"));
        assert_eq!(env.var("MISSING"), None);
        assert_eq!(env.non_blank_var("BLANK"), None);
        assert_eq!(env.home_dir(), Some(PathBuf::from("/home/ops")));
    }

    #[test]
    fn test_fixed_clock() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        assert_eq!(FixedClock(at).now(), at);
    }

    #[test]
    fn test_write_private_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("creds.json");

        OsFileSystem.write_private(&path, b"{}").unwrap();

        assert_eq!(OsFileSystem.read_to_string(&path).unwrap(), "{}");
        assert!(OsFileSystem.is_file(&path));
        // temp file is renamed away
        assert!(!path.with_file_name(".creds.json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_write_private_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creds.json");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        OsFileSystem.write_private(&path, b"new").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_read_dir_lists_entries() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        std::fs::write(dir.path().join("b.json"), "").unwrap();

        let mut entries = OsFileSystem.read_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with("a"));
    }
}
