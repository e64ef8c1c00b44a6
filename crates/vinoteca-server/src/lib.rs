// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use axum::routing::get;
use axum::Router;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use vinoteca_store::{LabelIndexSource, WineCatalog};

mod config;
mod http;
mod sampler;

pub use config::{validate_startup_config, ApiConfig};
pub use sampler::{SampleError, Sampler, SamplerConfig};
pub use vinoteca_store::fake::{FakeCatalog, FakeLabelSource};

pub const CRATE_NAME: &str = "vinoteca-server";

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<ApiConfig>,
    pub sampler: Arc<Sampler>,
    pub labels: Arc<dyn LabelIndexSource>,
    pub catalog: Arc<dyn WineCatalog>,
    pub request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    #[must_use]
    pub fn new(
        api: ApiConfig,
        labels: Arc<dyn LabelIndexSource>,
        catalog: Arc<dyn WineCatalog>,
    ) -> Self {
        let sampler = Arc::new(Sampler::new(
            SamplerConfig {
                refresh_labels_per_request: api.refresh_labels_per_request,
            },
            Arc::clone(&labels),
            Arc::clone(&catalog),
        ));
        Self {
            api: Arc::new(api),
            sampler,
            labels,
            catalog,
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(http::handlers::wine_page_handler))
        .route("/wine", get(http::handlers::wine_page_handler))
        .route("/image", get(http::handlers::fallback_image_handler))
        .route("/health", get(http::handlers::health_handler))
        .route("/labels/*key", get(http::handlers::label_proxy_handler))
        .with_state(state)
}
