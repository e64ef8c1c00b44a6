// SPDX-License-Identifier: Apache-2.0

use crate::transport::{get_with_retry, RetryPolicy};
use crate::StoreError;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, instrument};

pub const CATALOG_OBJECT: &str = "wine_data.db";
pub const CATALOG_CHECKSUM_OBJECT: &str = "wine_data.db.sha256";

#[derive(Debug, Clone)]
pub struct RemoteCatalogConfig {
    pub base_url: String,
    /// Local directory the downloaded database lands in.
    pub cache_root: PathBuf,
    pub auth_bearer: Option<String>,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

/// Downloads the catalog database from the bucket into `cache_root` and
/// returns the local path. When the bucket publishes a sha256 sidecar
/// object, the downloaded bytes must match it.
#[instrument(name = "catalog_remote_fetch", skip(cfg))]
pub async fn fetch_remote_catalog(cfg: &RemoteCatalogConfig) -> Result<PathBuf, StoreError> {
    let base = cfg.base_url.trim_end_matches('/');
    let bearer = cfg.auth_bearer.as_deref();
    let bytes = get_with_retry(
        &format!("{base}/{CATALOG_OBJECT}"),
        bearer,
        &cfg.retry,
        cfg.timeout,
    )
    .await?
    .ok_or_else(|| StoreError(format!("catalog object missing in bucket: {CATALOG_OBJECT}")))?;

    let checksum = get_with_retry(
        &format!("{base}/{CATALOG_CHECKSUM_OBJECT}"),
        bearer,
        &cfg.retry,
        cfg.timeout,
    )
    .await?;
    if let Some(raw) = checksum {
        let expected = parse_sha256_bytes(&raw)?;
        let actual = sha256_hex(&bytes);
        if expected != actual {
            return Err(StoreError(format!(
                "catalog checksum mismatch: expected {expected}, got {actual}"
            )));
        }
    }

    std::fs::create_dir_all(&cfg.cache_root)
        .map_err(|e| StoreError(format!("cache root create failed: {e}")))?;
    let path = cfg.cache_root.join(CATALOG_OBJECT);
    std::fs::write(&path, &bytes)
        .map_err(|e| StoreError(format!("catalog cache write failed: {e}")))?;
    info!(path = %path.display(), size = bytes.len(), "catalog database cached");
    Ok(path)
}

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn parse_sha256_bytes(bytes: &[u8]) -> Result<String, StoreError> {
    let raw = String::from_utf8(bytes.to_vec())
        .map_err(|e| StoreError(format!("checksum file is not utf8: {e}")))?;
    let token = raw
        .split_whitespace()
        .next()
        .ok_or_else(|| StoreError("checksum file is empty".to_string()))?
        .to_ascii_lowercase();
    if token.len() != 64 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(StoreError(format!("invalid sha256 checksum: {token}")));
    }
    Ok(token)
}
