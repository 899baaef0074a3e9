//! Blocking HTTP helpers shared by the catalog and detail fetchers.

use crate::error::FetchError;

const USER_AGENT: &str = concat!("noir/", env!("CARGO_PKG_VERSION"));

/// Build the blocking client used for every store request.
pub fn client() -> Result<reqwest::blocking::Client, FetchError> {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(FetchError::Client)
}

/// GET `url` and return the body, failing on non-success status codes.
pub fn get_bytes(client: &reqwest::blocking::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    tracing::debug!(url, "GET");
    let response = client.get(url).send().map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let bytes = response.bytes().map_err(|source| FetchError::Http {
        url: url.to_string(),
        source,
    })?;
    Ok(bytes.to_vec())
}
