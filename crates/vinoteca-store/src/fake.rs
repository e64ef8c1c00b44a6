// SPDX-License-Identifier: Apache-2.0

use crate::{content_type_for_key, LabelIndexSource, LabelObject, StoreError, WineCatalog};
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use vinoteca_model::{LabelEntry, WineRecord};

/// In-memory label source for tests. Flip `unavailable` to simulate a store
/// outage.
#[derive(Default)]
pub struct FakeLabelSource {
    pub entries: Mutex<Vec<LabelEntry>>,
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
    pub unavailable: AtomicBool,
}

impl FakeLabelSource {
    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError("label store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LabelIndexSource for FakeLabelSource {
    fn source_tag(&self) -> &'static str {
        "fake"
    }

    async fn list_labels(&self) -> Result<Vec<LabelEntry>, StoreError> {
        self.check()?;
        Ok(self.entries.lock().await.clone())
    }

    async fn fetch_label_bytes(&self, key: &str) -> Result<Option<LabelObject>, StoreError> {
        self.check()?;
        Ok(self.objects.lock().await.get(key).map(|bytes| LabelObject {
            bytes: bytes.clone(),
            content_type: content_type_for_key(key).to_string(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}

/// In-memory wine catalog for tests.
#[derive(Default)]
pub struct FakeCatalog {
    pub wines: Mutex<Vec<WineRecord>>,
    pub unavailable: AtomicBool,
}

impl FakeCatalog {
    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError("catalog unavailable".to_string()));
        }
        Ok(())
    }

    /// Convenience constructor for fixture rows.
    #[must_use]
    pub fn wine(id: &str, name: &str, category_2: &str) -> WineRecord {
        WineRecord {
            id: id.to_string(),
            name: name.to_string(),
            category_1: "Red".to_string(),
            category_2: category_2.to_string(),
            origin: "Chile".to_string(),
            description: "A test pour.".to_string(),
        }
    }
}

fn pick_random(candidates: &[&WineRecord]) -> Option<WineRecord> {
    if candidates.is_empty() {
        return None;
    }
    let ix = rand::rng().random_range(0..candidates.len());
    Some(candidates[ix].clone())
}

#[async_trait]
impl WineCatalog for FakeCatalog {
    fn catalog_tag(&self) -> &'static str {
        "fake"
    }

    async fn random_in_category(&self, category: &str) -> Result<Option<WineRecord>, StoreError> {
        self.check()?;
        let wines = self.wines.lock().await;
        let matching: Vec<&WineRecord> =
            wines.iter().filter(|w| w.category_2 == category).collect();
        Ok(pick_random(&matching))
    }

    async fn random_any(&self) -> Result<Option<WineRecord>, StoreError> {
        self.check()?;
        let wines = self.wines.lock().await;
        let all: Vec<&WineRecord> = wines.iter().collect();
        Ok(pick_random(&all))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}
