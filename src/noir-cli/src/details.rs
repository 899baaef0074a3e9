//! Per-app store metadata.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::error::FetchError;
use crate::http;

pub const DETAILS_URL: &str = "https://store.steampowered.com/api/appdetails";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReleaseDate {
    #[serde(default)]
    pub coming_soon: bool,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Platforms {
    #[serde(default, rename = "mac")]
    pub macos: bool,
    #[serde(default)]
    pub linux: bool,
    #[serde(default)]
    pub windows: bool,
}

impl Platforms {
    /// Supported platforms in display order: macOS, Linux, Windows.
    pub fn supported(&self) -> Vec<Platform> {
        [
            (self.macos, Platform::MacOs),
            (self.linux, Platform::Linux),
            (self.windows, Platform::Windows),
        ]
        .into_iter()
        .filter_map(|(on, platform)| on.then_some(platform))
        .collect()
    }
}

/// A target platform steamcmd can be forced to download for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
}

impl Platform {
    /// Value for `@sSteamCmdForcePlatformType`.
    pub fn steamcmd_name(self) -> &'static str {
        match self {
            Platform::MacOs => "macos",
            Platform::Linux => "linux",
            Platform::Windows => "windows",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Platform::MacOs => "MacOS",
            Platform::Linux => "Linux",
            Platform::Windows => "Windows",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.steamcmd_name())
    }
}

/// Store metadata for one app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GameDetails {
    #[serde(rename = "steam_appid")]
    pub id: u32,
    #[serde(rename = "name")]
    pub title: String,
    #[serde(rename = "short_description", default)]
    pub description: String,
    #[serde(alias = "developer", default)]
    pub developers: Vec<String>,
    #[serde(default)]
    pub release_date: ReleaseDate,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub platforms: Platforms,
}

/// Inner level of the appdetails response: `{ "success": .., "data": .. }`.
#[derive(Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<GameDetails>,
}

/// Decode an appdetails body of the form `{ "<id>": { "success": .., "data": {..} } }`.
///
/// An entry that reports `success: false` (or carries no data) is an error
/// rather than an empty record.
pub fn decode_details(bytes: &[u8], id: u32) -> Result<GameDetails, FetchError> {
    let mut outer: HashMap<String, Envelope> = serde_json::from_slice(bytes)?;
    let envelope = outer
        .remove(&id.to_string())
        .ok_or(FetchError::MissingEntry(id))?;
    if !envelope.success {
        return Err(FetchError::Unavailable(id));
    }
    envelope.data.ok_or(FetchError::Unavailable(id))
}

/// Fetches store metadata for single apps.
#[derive(Debug, Clone)]
pub struct DetailFetcher {
    url: String,
    client: reqwest::blocking::Client,
}

impl DetailFetcher {
    pub fn new(url: impl Into<String>, client: reqwest::blocking::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    pub fn request_url(&self, id: u32) -> String {
        format!("{}?appids={}", self.url, id)
    }

    pub fn fetch(&self, id: u32) -> Result<GameDetails, FetchError> {
        let bytes = http::get_bytes(&self.client, &self.request_url(id))?;
        let details = decode_details(&bytes, id)?;
        tracing::info!(id, title = %details.title, "fetched details");
        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supported_platforms_keep_fixed_order() {
        let all = Platforms {
            macos: true,
            linux: true,
            windows: true,
        };
        assert_eq!(
            all.supported(),
            [Platform::MacOs, Platform::Linux, Platform::Windows]
        );

        let some = Platforms {
            macos: false,
            linux: true,
            windows: true,
        };
        assert_eq!(some.supported(), [Platform::Linux, Platform::Windows]);
        assert!(Platforms::default().supported().is_empty());
    }

    #[test]
    fn request_url_appends_appids() {
        let fetcher = DetailFetcher::new(DETAILS_URL, reqwest::blocking::Client::new());
        assert_eq!(
            fetcher.request_url(620),
            "https://store.steampowered.com/api/appdetails?appids=620"
        );
    }

    #[test]
    fn failed_entry_is_an_error() {
        let body = br#"{"620":{"success":false}}"#;
        assert!(matches!(
            decode_details(body, 620),
            Err(FetchError::Unavailable(620))
        ));
    }

    #[test]
    fn entry_for_other_id_is_missing() {
        let body = br#"{"400":{"success":true,"data":{"steam_appid":400,"name":"Portal"}}}"#;
        assert!(matches!(
            decode_details(body, 620),
            Err(FetchError::MissingEntry(620))
        ));
    }

    #[test]
    fn null_website_decodes_as_none() {
        let body = br#"{"400":{"success":true,"data":{"steam_appid":400,"name":"Portal","website":null}}}"#;
        let details = decode_details(body, 400).unwrap();
        assert_eq!(details.website, None);
        assert_eq!(details.platforms, Platforms::default());
    }
}
