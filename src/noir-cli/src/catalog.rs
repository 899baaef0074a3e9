//! The Steam app list: fetched once a day and cached on disk.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::cache::CachedFile;
use crate::error::{FetchError, InputError};
use crate::http;

pub const CATALOG_URL: &str = "https://api.steampowered.com/ISteamApps/GetAppList/v0002/";

/// How long a downloaded app list is trusted.
pub const CATALOG_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const CATALOG_FILE: &str = "steam_app_list.json";

// ============================================================================
// Steam API types
// ============================================================================

#[derive(Deserialize)]
struct AppListResponse {
    applist: AppList,
}

#[derive(Deserialize)]
struct AppList {
    apps: Vec<Game>,
}

/// One entry of the app list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Game {
    #[serde(rename = "appid")]
    pub id: u32,
    pub name: String,
}

// ============================================================================
// Catalog
// ============================================================================

/// Name → app id index built from a complete app list.
///
/// Names are unique keys; when the list contains the same name twice the
/// later entry wins.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    index: HashMap<String, u32>,
}

impl Catalog {
    pub fn from_games(games: impl IntoIterator<Item = Game>) -> Self {
        let index = games.into_iter().map(|g| (g.name, g.id)).collect();
        Self { index }
    }

    /// Decode the raw app list response body.
    pub fn parse(bytes: &[u8]) -> Result<Self, FetchError> {
        let response: AppListResponse = serde_json::from_slice(bytes)?;
        Ok(Self::from_games(response.applist.apps))
    }

    /// Exact, case-sensitive lookup of a game name.
    pub fn resolve(&self, name: &str) -> Result<u32, InputError> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| InputError::Unresolved(name.to_string()))
    }

    /// All names, sorted, for use as search suggestions.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.index.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

// ============================================================================
// Cache-backed loader
// ============================================================================

/// Loads the catalog from the cache file, refetching when it is stale.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    file: Option<CachedFile>,
    url: String,
    client: reqwest::blocking::Client,
}

impl CatalogCache {
    /// `cache_dir` is `None` when no cache root could be resolved; loading
    /// then fails with [`FetchError::NoCacheDir`].
    pub fn new(cache_dir: Option<&Path>, url: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        Self {
            file: cache_dir.map(|dir| CachedFile::new(dir.join(CATALOG_FILE), CATALOG_TTL)),
            url: url.into(),
            client,
        }
    }

    pub fn load(&self) -> Result<Catalog, FetchError> {
        let file = self.file.as_ref().ok_or(FetchError::NoCacheDir)?;

        if let Some(bytes) = file.read_fresh() {
            match Catalog::parse(&bytes) {
                Ok(catalog) => {
                    tracing::info!(games = catalog.len(), "loaded game list from cache");
                    return Ok(catalog);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "cached game list is corrupt, refetching");
                }
            }
        }

        let bytes = http::get_bytes(&self.client, &self.url)?;
        if let Err(e) = file.store(&bytes) {
            tracing::warn!(path = %file.path().display(), error = %e, "failed to cache game list");
        }

        let catalog = Catalog::parse(&bytes)?;
        tracing::info!(games = catalog.len(), "fetched game list");
        Ok(catalog)
    }
}
