//! On-disk cache files with an mtime-based time-to-live.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Environment variable that overrides the per-user cache root.
pub const CACHE_HOME_ENV: &str = "XDG_CACHE_HOME";

/// Directory under the cache root that holds our files.
const APP_DIR: &str = "noir";

/// Resolve `<cache-root>/noir`, preferring `$XDG_CACHE_HOME` when it is set
/// and non-empty, falling back to the platform cache directory.
pub fn resolve_cache_dir() -> Option<PathBuf> {
    let root = std::env::var_os(CACHE_HOME_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::cache_dir)?;
    Some(root.join(APP_DIR))
}

/// A file is fresh while its age is strictly below the TTL.
pub fn is_fresh(age: Duration, ttl: Duration) -> bool {
    age < ttl
}

/// A cached artifact that is only trusted while younger than `ttl`.
#[derive(Debug, Clone)]
pub struct CachedFile {
    path: PathBuf,
    ttl: Duration,
}

impl CachedFile {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Age of the file at `now`, or `None` if it cannot be stat'ed.
    /// A modification time in the future counts as age zero.
    pub fn age_at(&self, now: SystemTime) -> Option<Duration> {
        let modified = std::fs::metadata(&self.path).ok()?.modified().ok()?;
        Some(now.duration_since(modified).unwrap_or_default())
    }

    /// Contents of the file if it exists and is fresh at `now`.
    pub fn read_fresh_at(&self, now: SystemTime) -> Option<Vec<u8>> {
        let age = self.age_at(now)?;
        if !is_fresh(age, self.ttl) {
            tracing::debug!(path = %self.path.display(), ?age, "cache file is stale");
            return None;
        }
        match std::fs::read(&self.path) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read cache file");
                None
            }
        }
    }

    pub fn read_fresh(&self) -> Option<Vec<u8>> {
        self.read_fresh_at(SystemTime::now())
    }

    /// Overwrite the file, creating parent directories as needed.
    pub fn store(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, bytes)
    }
}
