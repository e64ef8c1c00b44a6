use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    pub sql_timeout: Duration,
    pub store_timeout: Duration,
    pub max_catalog_connections: usize,
    /// Rebuild the label snapshot per request instead of reusing the
    /// startup listing.
    pub refresh_labels_per_request: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            sql_timeout: Duration::from_secs(3),
            store_timeout: Duration::from_secs(5),
            max_catalog_connections: 8,
            refresh_labels_per_request: false,
        }
    }
}

pub fn validate_startup_config(api: &ApiConfig) -> Result<(), String> {
    if api.sql_timeout.is_zero() || api.store_timeout.is_zero() {
        return Err("timeouts must be > 0".to_string());
    }
    if api.max_catalog_connections == 0 {
        return Err("catalog connection pool must be > 0".to_string());
    }
    Ok(())
}
