//! Tests for the cached app list.
//!
//! Covers:
//!   - freshness      - a cache younger than 24h is served without a request
//!   - boundary       - a cache exactly 24h old is stale and refetched
//!   - corrupt cache  - an unparseable fresh file is refetched
//!   - resolution     - exact, case-sensitive name lookup
//!
//! The endpoint points at a closed local port, so a refetch shows up as a
//! request failure.

use noir_cli::catalog::{CATALOG_TTL, CatalogCache};
use noir_cli::FetchError;
use std::fs::File;
use std::path::Path;
use std::time::{Duration, SystemTime};

const UNREACHABLE: &str = "http://127.0.0.1:9/applist";

const APP_LIST: &str = r#"{
    "applist": {
        "apps": [
            {"appid": 400, "name": "Portal"},
            {"appid": 620, "name": "Portal 2"},
            {"appid": 70, "name": "Half-Life"},
            {"appid": 71, "name": "Half-Life"}
        ]
    }
}"#;

fn write_cache(dir: &Path, body: &str, age: Duration) {
    let path = dir.join("steam_app_list.json");
    std::fs::write(&path, body).unwrap();
    let file = File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

fn cache(dir: &Path) -> CatalogCache {
    CatalogCache::new(Some(dir), UNREACHABLE, reqwest::blocking::Client::new())
}

#[test]
fn fresh_cache_is_used_without_network() {
    let dir = tempfile::tempdir().unwrap();
    write_cache(dir.path(), APP_LIST, Duration::from_secs(60));

    let catalog = cache(dir.path()).load().unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.resolve("Portal 2"), Ok(620));
    assert_eq!(catalog.resolve("Half-Life"), Ok(71));
    assert!(catalog.resolve("portal").is_err());
}

#[test]
fn cache_just_under_ttl_is_fresh() {
    let dir = tempfile::tempdir().unwrap();
    write_cache(dir.path(), APP_LIST, CATALOG_TTL - Duration::from_secs(60));
    assert!(cache(dir.path()).load().is_ok());
}

#[test]
fn cache_at_ttl_triggers_refetch() {
    let dir = tempfile::tempdir().unwrap();
    write_cache(dir.path(), APP_LIST, CATALOG_TTL);
    assert!(matches!(
        cache(dir.path()).load(),
        Err(FetchError::Http { .. })
    ));
}

#[test]
fn missing_cache_triggers_fetch() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        cache(dir.path()).load(),
        Err(FetchError::Http { .. })
    ));
}

#[test]
fn corrupt_fresh_cache_is_refetched() {
    let dir = tempfile::tempdir().unwrap();
    write_cache(dir.path(), "not json", Duration::from_secs(60));
    assert!(matches!(
        cache(dir.path()).load(),
        Err(FetchError::Http { .. })
    ));
}
