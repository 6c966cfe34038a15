// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::error::{AppError, Result};
use crate::models::FetchConfig;

/// Create a configured asynchronous HTTP client.
///
/// When a token is given it is sent as a bearer token on every request.
pub fn create_client(config: &FetchConfig, token: Option<&str>) -> Result<Client> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
        let value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|e| AppError::config(format!("invalid API token: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }

    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .default_headers(headers)
        .build()?;
    Ok(client)
}

/// Fetch a URL and return its body, treating non-2xx as an error.
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AppError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

/// Fetch a URL, retrying up to `max_retries` extra times with linear backoff.
pub async fn fetch_text_with_retry(
    client: &Client,
    url: &str,
    max_retries: u32,
    backoff: Duration,
) -> Result<String> {
    let mut attempt = 0;
    loop {
        match fetch_text(client, url).await {
            Ok(body) => return Ok(body),
            Err(e) if attempt < max_retries => {
                attempt += 1;
                log::debug!("Retry {}/{} for {}: {}", attempt, max_retries, url, e);
                tokio::time::sleep(backoff * attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
}
