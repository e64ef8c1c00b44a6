// SPDX-License-Identifier: Apache-2.0

use rand::Rng;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;
use vinoteca_model::{CategoryMap, LabelEntry, SampleResult};
use vinoteca_store::{LabelIndexSource, StoreError, WineCatalog};

#[derive(Debug, Clone, Default)]
pub struct SamplerConfig {
    pub refresh_labels_per_request: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SampleError {
    /// The catalog has zero rows in total; the fallback is exhausted too.
    EmptyCatalog,
    /// No labels listed at all.
    EmptyLabelIndex,
    /// A listed label carries a code with no category-map entry.
    UnknownCategory(u8),
    Store(StoreError),
}

impl Display for SampleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCatalog => f.write_str("wine catalog has no rows"),
            Self::EmptyLabelIndex => f.write_str("label index has no entries"),
            Self::UnknownCategory(code) => {
                write!(f, "label category code {code} has no category-map entry")
            }
            Self::Store(e) => write!(f, "store unavailable: {e}"),
        }
    }
}

impl std::error::Error for SampleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for SampleError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

/// Produces one random, internally-consistent (label, wine) pair per call.
///
/// Stores are injected capabilities so tests can substitute fakes; the
/// sampler holds no credentials and no connections of its own.
pub struct Sampler {
    cfg: SamplerConfig,
    labels: Arc<dyn LabelIndexSource>,
    catalog: Arc<dyn WineCatalog>,
    snapshot: RwLock<Option<Arc<Vec<LabelEntry>>>>,
}

impl Sampler {
    #[must_use]
    pub fn new(
        cfg: SamplerConfig,
        labels: Arc<dyn LabelIndexSource>,
        catalog: Arc<dyn WineCatalog>,
    ) -> Self {
        Self {
            cfg,
            labels,
            catalog,
            snapshot: RwLock::new(None),
        }
    }

    /// The label snapshot, listed on first use when caching is enabled.
    /// The cached value is an `Arc` swapped whole; in-flight readers keep
    /// whatever snapshot they already hold.
    async fn label_snapshot(&self) -> Result<Arc<Vec<LabelEntry>>, SampleError> {
        if !self.cfg.refresh_labels_per_request {
            if let Some(cached) = self.snapshot.read().await.clone() {
                return Ok(cached);
            }
        }
        let listed = Arc::new(self.labels.list_labels().await?);
        if !self.cfg.refresh_labels_per_request {
            *self.snapshot.write().await = Some(Arc::clone(&listed));
        }
        Ok(listed)
    }

    /// Draws one label uniformly over the full index, resolves its category
    /// and pairs it with a uniformly-random matching wine.
    ///
    /// Categories with more label images are proportionally more likely to
    /// be drawn; that skew is accepted, not corrected. When the catalog has
    /// no row for the label's category, the draw degrades to a single
    /// any-category pick. There is no retry loop anywhere in this path.
    pub async fn sample_one(&self) -> Result<SampleResult, SampleError> {
        let labels = self.label_snapshot().await?;
        if labels.is_empty() {
            return Err(SampleError::EmptyLabelIndex);
        }
        let ix = rand::rng().random_range(0..labels.len());
        let label = labels[ix].clone();
        let category =
            CategoryMap::lookup(label.category).map_err(|e| SampleError::UnknownCategory(e.0))?;
        let wine = match self.catalog.random_in_category(category).await? {
            Some(wine) => wine,
            None => {
                warn!(
                    category,
                    code = label.category,
                    "no catalog rows for label category, serving any-category wine"
                );
                self.catalog
                    .random_any()
                    .await?
                    .ok_or(SampleError::EmptyCatalog)?
            }
        };
        Ok(SampleResult { label, wine })
    }
}
