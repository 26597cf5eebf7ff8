// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::{Client, IntoUrl};

use crate::error::Result;
use crate::models::FetchConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &FetchConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Fetch a resource and return its body, failing on non-success status.
pub async fn fetch_bytes(client: &Client, url: impl IntoUrl) -> Result<Vec<u8>> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
