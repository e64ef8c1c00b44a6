// SPDX-License-Identifier: Apache-2.0

use crate::StoreError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff_ms: 120,
        }
    }
}

pub(crate) fn client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

pub(crate) fn auth_headers(bearer: Option<&str>) -> Result<HeaderMap, StoreError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = bearer {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| StoreError(format!("invalid auth header: {e}")))?;
        headers.insert(AUTHORIZATION, value);
    }
    Ok(headers)
}

/// GET with bounded linear-backoff retry. `Ok(None)` maps a 404 so callers
/// can distinguish absence from unavailability.
#[instrument(name = "store_get_with_retry", skip(bearer, retry, timeout))]
pub(crate) async fn get_with_retry(
    url: &str,
    bearer: Option<&str>,
    retry: &RetryPolicy,
    timeout: Duration,
) -> Result<Option<Vec<u8>>, StoreError> {
    let client = client(timeout);
    let headers = auth_headers(bearer)?;
    let mut attempt = 0;
    loop {
        attempt += 1;
        let req = client.get(url).headers(headers.clone());
        match req.send().await {
            Ok(resp) if resp.status().as_u16() == 404 => return Ok(None),
            Ok(resp) if resp.status().is_success() => {
                return resp
                    .bytes()
                    .await
                    .map(|b| Some(b.to_vec()))
                    .map_err(|e| StoreError(format!("read body failed: {e}")));
            }
            Ok(resp) => {
                if attempt >= retry.max_attempts {
                    return Err(StoreError(format!(
                        "download failed status={} url={url}",
                        resp.status()
                    )));
                }
            }
            Err(e) => {
                if attempt >= retry.max_attempts {
                    return Err(StoreError(format!("download failed url={url}: {e}")));
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(
            retry.base_backoff_ms.saturating_mul(attempt as u64),
        ))
        .await;
    }
}
