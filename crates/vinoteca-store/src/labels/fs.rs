// SPDX-License-Identifier: Apache-2.0

use crate::{content_type_for_key, LabelIndexSource, LabelObject, StoreError};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::warn;
use vinoteca_model::LabelEntry;

/// Label source backed by a flat local directory of image files.
pub struct DirLabelSource {
    root: PathBuf,
}

impl DirLabelSource {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl LabelIndexSource for DirLabelSource {
    fn source_tag(&self) -> &'static str {
        "localfs"
    }

    async fn list_labels(&self) -> Result<Vec<LabelEntry>, StoreError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            let dir = std::fs::read_dir(&root)
                .map_err(|e| StoreError(format!("label dir listing failed: {e}")))?;
            let mut out = Vec::new();
            for item in dir {
                let item =
                    item.map_err(|e| StoreError(format!("label dir entry failed: {e}")))?;
                if !item.file_type().map(|t| t.is_file()).unwrap_or(false) {
                    continue;
                }
                let name = item.file_name();
                let Some(name) = name.to_str() else { continue };
                match LabelEntry::from_key(name) {
                    Some(entry) => out.push(entry),
                    None => warn!(file = name, "skipping file outside the cat_<code>_ naming convention"),
                }
            }
            Ok(out)
        })
        .await
        .map_err(|e| StoreError(e.to_string()))?
    }

    async fn fetch_label_bytes(&self, key: &str) -> Result<Option<LabelObject>, StoreError> {
        // Keys come from URLs; anything stepping out of the root is treated
        // as absent. Absolute keys would make `join` discard the root.
        if std::path::Path::new(key).is_absolute() || key.split('/').any(|part| part == "..") {
            return Ok(None);
        }
        let path = self.root.join(key);
        let content_type = content_type_for_key(key).to_string();
        tokio::task::spawn_blocking(move || match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(LabelObject {
                bytes,
                content_type,
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError(format!("label read failed: {e}"))),
        })
        .await
        .map_err(|e| StoreError(e.to_string()))?
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::metadata(&root)
                .map(|_| ())
                .map_err(|e| StoreError(format!("label dir unreachable: {e}")))
        })
        .await
        .map_err(|e| StoreError(e.to_string()))?
    }
}
