#![forbid(unsafe_code)]

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use vinoteca_server::{build_router, validate_startup_config, ApiConfig, AppState};
use vinoteca_store::{
    fetch_remote_catalog, BucketLabelConfig, BucketLabelSource, DirLabelSource, LabelIndexSource,
    RemoteCatalogConfig, RetryPolicy, SqliteCatalog, SqliteCatalogConfig, WineCatalog,
};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_u64(name, default_ms))
}

fn env_nonempty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("VINOTECA_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate()).expect("register SIGTERM");
        let mut sigint = signal(SignalKind::interrupt()).expect("register SIGINT");
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let api = ApiConfig {
        sql_timeout: env_duration_ms("VINOTECA_SQL_TIMEOUT_MS", 3_000),
        store_timeout: env_duration_ms("VINOTECA_STORE_TIMEOUT_MS", 5_000),
        max_catalog_connections: env_usize("VINOTECA_MAX_CATALOG_CONNECTIONS", 8),
        refresh_labels_per_request: env_bool("VINOTECA_REFRESH_LABELS_PER_REQUEST", false),
    };
    validate_startup_config(&api)?;

    let retry = RetryPolicy::default();
    let bucket_url = env_nonempty("VINOTECA_BUCKET_URL");
    let bearer = env_nonempty("VINOTECA_BUCKET_BEARER");

    let labels: Arc<dyn LabelIndexSource> = if let Some(url) = &bucket_url {
        Arc::new(BucketLabelSource::new(BucketLabelConfig {
            base_url: url.clone(),
            prefix: env::var("VINOTECA_LABEL_PREFIX").unwrap_or_else(|_| "labels/".to_string()),
            auth_bearer: bearer.clone(),
            retry: retry.clone(),
            timeout: api.store_timeout,
        }))
    } else {
        let dir = env::var("VINOTECA_LABELS_DIR")
            .unwrap_or_else(|_| "static/labels_on_bottle".to_string());
        Arc::new(DirLabelSource::new(PathBuf::from(dir)))
    };

    let db_path = match env_nonempty("VINOTECA_CATALOG_DB") {
        Some(path) => PathBuf::from(path),
        None => {
            let url = bucket_url
                .clone()
                .ok_or_else(|| "set VINOTECA_CATALOG_DB or VINOTECA_BUCKET_URL".to_string())?;
            let cache_root = PathBuf::from(
                env::var("VINOTECA_CACHE_ROOT")
                    .unwrap_or_else(|_| "artifacts/catalog-cache".to_string()),
            );
            fetch_remote_catalog(&RemoteCatalogConfig {
                base_url: url,
                cache_root,
                auth_bearer: bearer,
                retry,
                timeout: api.store_timeout,
            })
            .await
            .map_err(|e| e.to_string())?
        }
    };

    let catalog: Arc<dyn WineCatalog> = Arc::new(
        SqliteCatalog::open(SqliteCatalogConfig {
            db_path,
            max_connections: api.max_catalog_connections,
            sql_timeout: api.sql_timeout,
        })
        .map_err(|e| e.to_string())?,
    );

    let bind_addr = env::var("VINOTECA_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let state = AppState::new(api, labels, catalog);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| e.to_string())?;
    info!(addr = %bind_addr, "vinoteca server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .map_err(|e| e.to_string())?;
    Ok(())
}
