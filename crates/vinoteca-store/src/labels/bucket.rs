// SPDX-License-Identifier: Apache-2.0

use crate::transport::{get_with_retry, RetryPolicy};
use crate::{content_type_for_key, LabelIndexSource, LabelObject, StoreError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{instrument, warn};
use vinoteca_model::LabelEntry;

#[derive(Debug, Clone)]
pub struct BucketLabelConfig {
    /// Bucket base URL, e.g. `https://minio.example/wine-labels`.
    pub base_url: String,
    /// Key prefix the labels live under.
    pub prefix: String,
    pub auth_bearer: Option<String>,
    pub retry: RetryPolicy,
    pub timeout: Duration,
}

impl Default for BucketLabelConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            prefix: "labels/".to_string(),
            auth_bearer: None,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Label source backed by an S3-compatible bucket, listed via
/// `ListObjectsV2` with continuation-token paging.
pub struct BucketLabelSource {
    cfg: BucketLabelConfig,
}

impl BucketLabelSource {
    #[must_use]
    pub fn new(cfg: BucketLabelConfig) -> Self {
        Self {
            cfg: BucketLabelConfig {
                base_url: cfg.base_url.trim_end_matches('/').to_string(),
                ..cfg
            },
        }
    }

    fn list_url(&self, continuation: Option<&str>, max_keys: usize) -> String {
        let mut url = format!(
            "{}/?list-type=2&prefix={}&max-keys={max_keys}",
            self.cfg.base_url, self.cfg.prefix
        );
        if let Some(token) = continuation {
            url.push_str("&continuation-token=");
            url.push_str(token);
        }
        url
    }

    async fn get(&self, url: &str) -> Result<Option<Vec<u8>>, StoreError> {
        get_with_retry(
            url,
            self.cfg.auth_bearer.as_deref(),
            &self.cfg.retry,
            self.cfg.timeout,
        )
        .await
    }

    async fn list_page(&self, url: &str) -> Result<String, StoreError> {
        let body = self
            .get(url)
            .await?
            .ok_or_else(|| StoreError(format!("bucket listing missing url={url}")))?;
        String::from_utf8(body).map_err(|e| StoreError(format!("bucket listing is not utf8: {e}")))
    }
}

// The listing grammar needed here is a flat <Key> sequence plus two scalar
// fields, so a substring scan stands in for an XML parser.
fn xml_values<'a>(body: &'a str, tag: &str) -> Vec<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut out = Vec::new();
    let mut rest = body;
    while let Some(start) = rest.find(&open) {
        rest = &rest[start + open.len()..];
        let Some(end) = rest.find(&close) else { break };
        out.push(&rest[..end]);
        rest = &rest[end + close.len()..];
    }
    out
}

fn xml_value<'a>(body: &'a str, tag: &str) -> Option<&'a str> {
    xml_values(body, tag).into_iter().next()
}

#[async_trait]
impl LabelIndexSource for BucketLabelSource {
    fn source_tag(&self) -> &'static str {
        "bucket"
    }

    #[instrument(name = "labels_bucket_list", skip(self))]
    async fn list_labels(&self) -> Result<Vec<LabelEntry>, StoreError> {
        let mut out = Vec::new();
        let mut continuation: Option<String> = None;
        loop {
            let url = self.list_url(continuation.as_deref(), 1000);
            let body = self.list_page(&url).await?;
            for key in xml_values(&body, "Key") {
                if key.ends_with('/') {
                    continue;
                }
                match LabelEntry::from_key(key) {
                    Some(entry) => out.push(entry),
                    None => warn!(key, "skipping object outside the cat_<code>_ naming convention"),
                }
            }
            if xml_value(&body, "IsTruncated") != Some("true") {
                break;
            }
            continuation = xml_value(&body, "NextContinuationToken").map(ToString::to_string);
            if continuation.is_none() {
                // Truncated listing without a token would loop forever.
                return Err(StoreError(
                    "bucket listing truncated without a continuation token".to_string(),
                ));
            }
        }
        Ok(out)
    }

    async fn fetch_label_bytes(&self, key: &str) -> Result<Option<LabelObject>, StoreError> {
        let url = format!("{}/{key}", self.cfg.base_url);
        Ok(self.get(&url).await?.map(|bytes| LabelObject {
            bytes,
            content_type: content_type_for_key(key).to_string(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let url = self.list_url(None, 1);
        self.list_page(&url).await.map(|_| ())
    }
}
