// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use async_trait::async_trait;
use std::fmt::{Display, Formatter};
use vinoteca_model::{LabelEntry, WineRecord};

mod catalog;
pub mod fake;
mod labels;
mod transport;

pub use catalog::remote::{
    fetch_remote_catalog, RemoteCatalogConfig, CATALOG_CHECKSUM_OBJECT, CATALOG_OBJECT,
};
pub use catalog::sqlite::{SqliteCatalog, SqliteCatalogConfig};
pub use labels::bucket::{BucketLabelConfig, BucketLabelSource};
pub use labels::fs::DirLabelSource;
pub use transport::RetryPolicy;

/// Network/auth/IO failure talking to a store. Callers surface it as a
/// degraded-health condition, never a crash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(pub String);

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// A fetched label object ready to stream back to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Enumerates available bottle-label images, each tagged with a raw
/// category code.
#[async_trait]
pub trait LabelIndexSource: Send + Sync + 'static {
    fn source_tag(&self) -> &'static str;

    /// Lists every available label as a flat snapshot. Consistency of the
    /// listing across calls is not guaranteed and not required.
    async fn list_labels(&self) -> Result<Vec<LabelEntry>, StoreError>;

    /// Fetches one object by key. `Ok(None)` means the key does not exist.
    async fn fetch_label_bytes(&self, key: &str) -> Result<Option<LabelObject>, StoreError>;

    /// Liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Queryable collection of wine records tagged with category names.
#[async_trait]
pub trait WineCatalog: Send + Sync + 'static {
    fn catalog_tag(&self) -> &'static str;

    /// Uniformly-random row whose `category_2` equals `category`, or `None`
    /// when the catalog has no row for that category.
    async fn random_in_category(&self, category: &str) -> Result<Option<WineRecord>, StoreError>;

    /// Uniformly-random row over the whole catalog, or `None` when the
    /// catalog is empty.
    async fn random_any(&self) -> Result<Option<WineRecord>, StoreError>;

    /// Liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

pub(crate) fn content_type_for_key(key: &str) -> &'static str {
    let ext = key.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}
