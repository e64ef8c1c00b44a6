// SPDX-License-Identifier: Apache-2.0

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use vinoteca_model::LabelEntry;
use vinoteca_server::{build_router, ApiConfig, AppState, FakeCatalog, FakeLabelSource};
use vinoteca_store::{LabelIndexSource, WineCatalog};

async fn send_raw(addr: std::net::SocketAddr, path: &str) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let req = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("read response");
    let response = String::from_utf8_lossy(&response).to_string();
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head.to_string(), body.to_string())
}

struct Fixture {
    addr: std::net::SocketAddr,
    labels: Arc<FakeLabelSource>,
    catalog: Arc<FakeCatalog>,
}

async fn serve_fixture(entries: Vec<LabelEntry>, wines: Vec<vinoteca_model::WineRecord>) -> Fixture {
    let labels = Arc::new(FakeLabelSource::default());
    *labels.entries.lock().await = entries;
    let catalog = Arc::new(FakeCatalog::default());
    *catalog.wines.lock().await = wines;

    let api = ApiConfig {
        // Per-request listing so tests can flip fake state between calls.
        refresh_labels_per_request: true,
        ..ApiConfig::default()
    };
    let state = AppState::new(
        api,
        Arc::clone(&labels) as Arc<dyn LabelIndexSource>,
        Arc::clone(&catalog) as Arc<dyn WineCatalog>,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });

    Fixture {
        addr,
        labels,
        catalog,
    }
}

fn cabernet_fixture() -> (Vec<LabelEntry>, Vec<vinoteca_model::WineRecord>) {
    let entries = vec![LabelEntry {
        category: 2,
        key: "cat_2_a.png".to_string(),
    }];
    let wines = vec![FakeCatalog::wine("w1", "Test Wine", "Cabernet Sauvignon")];
    (entries, wines)
}

#[tokio::test]
async fn wine_page_renders_the_sampled_pair_on_both_routes() {
    let (entries, wines) = cabernet_fixture();
    let fx = serve_fixture(entries, wines).await;
    fx.labels
        .objects
        .lock()
        .await
        .insert("cat_2_a.png".to_string(), b"png-bytes".to_vec());

    for path in ["/", "/wine"] {
        let (status, head, body) = send_raw(fx.addr, path).await;
        assert_eq!(status, 200, "route {path}");
        assert!(head.to_ascii_lowercase().contains("content-type: text/html"));
        assert!(head.to_ascii_lowercase().contains("x-request-id:"));
        assert!(body.contains("Test Wine"));
        assert!(body.contains("Cabernet Sauvignon"));
        assert!(body.contains("/labels/cat_2_a.png"));
    }
}

#[tokio::test]
async fn empty_catalog_surfaces_as_a_server_error() {
    let (entries, _) = cabernet_fixture();
    let fx = serve_fixture(entries, Vec::new()).await;
    let (status, _, body) = send_raw(fx.addr, "/").await;
    assert_eq!(status, 500);
    let err: serde_json::Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(err["error"]["code"], "empty_catalog");
}

#[tokio::test]
async fn empty_label_index_surfaces_as_a_server_error() {
    let (_, wines) = cabernet_fixture();
    let fx = serve_fixture(Vec::new(), wines).await;
    let (status, _, body) = send_raw(fx.addr, "/wine").await;
    assert_eq!(status, 500);
    let err: serde_json::Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(err["error"]["code"], "empty_label_index");
}

#[tokio::test]
async fn label_proxy_streams_objects_and_404s_missing_keys() {
    let (entries, wines) = cabernet_fixture();
    let fx = serve_fixture(entries, wines).await;
    fx.labels
        .objects
        .lock()
        .await
        .insert("cat_2_a.png".to_string(), b"png-bytes".to_vec());

    let (status, head, body) = send_raw(fx.addr, "/labels/cat_2_a.png").await;
    assert_eq!(status, 200);
    assert!(head.to_ascii_lowercase().contains("content-type: image/png"));
    assert_eq!(body, "png-bytes");

    let (status, _, body) = send_raw(fx.addr, "/labels/cat_9_missing.png").await;
    assert_eq!(status, 404);
    let err: serde_json::Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(err["error"]["code"], "label_not_found");
}

#[tokio::test]
async fn fixed_fallback_image_is_always_served() {
    let (entries, wines) = cabernet_fixture();
    let fx = serve_fixture(entries, wines).await;
    let (status, head, _) = send_raw(fx.addr, "/image").await;
    assert_eq!(status, 200);
    assert!(head.to_ascii_lowercase().contains("content-type: image/png"));
}

#[tokio::test]
async fn health_reports_each_dependency_independently() {
    let (entries, wines) = cabernet_fixture();
    let fx = serve_fixture(entries, wines).await;

    let (status, _, body) = send_raw(fx.addr, "/health").await;
    assert_eq!(status, 200);
    let health: serde_json::Value = serde_json::from_str(&body).expect("health json");
    assert_eq!(health["catalog"], "healthy");
    assert_eq!(health["labels"], "healthy");

    fx.catalog.unavailable.store(true, Ordering::Relaxed);
    let (status, _, body) = send_raw(fx.addr, "/health").await;
    assert_eq!(status, 503);
    let health: serde_json::Value = serde_json::from_str(&body).expect("health json");
    assert_eq!(health["catalog"], "unhealthy");
    assert_eq!(health["labels"], "healthy");

    fx.catalog.unavailable.store(false, Ordering::Relaxed);
    fx.labels.unavailable.store(true, Ordering::Relaxed);
    let (status, _, body) = send_raw(fx.addr, "/health").await;
    assert_eq!(status, 503);
    let health: serde_json::Value = serde_json::from_str(&body).expect("health json");
    assert_eq!(health["catalog"], "healthy");
    assert_eq!(health["labels"], "unhealthy");
}

#[tokio::test]
async fn store_outage_fails_the_page_with_503() {
    let (entries, wines) = cabernet_fixture();
    let fx = serve_fixture(entries, wines).await;
    fx.catalog.unavailable.store(true, Ordering::Relaxed);
    let (status, _, body) = send_raw(fx.addr, "/").await;
    assert_eq!(status, 503);
    let err: serde_json::Value = serde_json::from_str(&body).expect("error json");
    assert_eq!(err["error"]["code"], "store_unavailable");
}
