use crate::sampler::SampleError;
use crate::AppState;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::sync::atomic::Ordering;
use tracing::{error, warn};
use vinoteca_model::SampleResult;

// 1x1 transparent PNG, the fixed fallback served on /image.
const FALLBACK_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub(crate) fn make_request_id(state: &AppState) -> String {
    let id = state.request_id_seed.fetch_add(1, Ordering::Relaxed);
    format!("req-{id:016x}")
}

pub(crate) fn propagated_request_id(headers: &HeaderMap, state: &AppState) -> String {
    if let Some(raw) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    make_request_id(state)
}

pub(crate) fn with_request_id(mut response: Response, request_id: &str) -> Response {
    if let Ok(v) = HeaderValue::from_str(request_id) {
        response.headers_mut().insert("x-request-id", v);
    }
    response
}

fn error_response(status: StatusCode, code: &str, message: &str, details: Value) -> Response {
    let body = Json(json!({"error": {"code": code, "message": message, "details": details}}));
    (status, body).into_response()
}

fn sample_error_response(err: &SampleError) -> Response {
    match err {
        SampleError::EmptyCatalog => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "empty_catalog",
            "wine catalog has no rows",
            json!({}),
        ),
        SampleError::EmptyLabelIndex => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "empty_label_index",
            "label index has no entries",
            json!({}),
        ),
        SampleError::UnknownCategory(code) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "unknown_category",
            "label category has no category-map entry",
            json!({"code": code}),
        ),
        SampleError::Store(e) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "store_unavailable",
            "backing store unreachable",
            json!({"message": e.to_string()}),
        ),
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_page(sample: &SampleResult) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Vinoteca</title></head><body>\
<h1>{name}</h1>\
<p><em>{category} &middot; {origin}</em></p>\
<img src=\"/labels/{key}\" alt=\"bottle label\" onerror=\"this.src='/image'\">\
<p>{description}</p>\
</body></html>",
        name = escape_html(&sample.wine.name),
        category = escape_html(&sample.wine.category_2),
        origin = escape_html(&sample.wine.origin),
        key = escape_html(&sample.label.key),
        description = escape_html(&sample.wine.description),
    )
}

fn html_response(body: String) -> Response {
    let mut resp = Response::new(Body::from(body));
    resp.headers_mut().insert(
        "content-type",
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    resp
}

pub(crate) async fn wine_page_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let request_id = propagated_request_id(&headers, &state);
    let resp = match state.sampler.sample_one().await {
        Ok(sample) => html_response(render_page(&sample)),
        Err(err) => {
            error!(%request_id, error = %err, "sampling failed");
            sample_error_response(&err)
        }
    };
    with_request_id(resp, &request_id)
}

pub(crate) async fn fallback_image_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let request_id = propagated_request_id(&headers, &state);
    let mut resp = Response::new(Body::from(FALLBACK_PNG));
    resp.headers_mut()
        .insert("content-type", HeaderValue::from_static("image/png"));
    with_request_id(resp, &request_id)
}

pub(crate) async fn label_proxy_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let request_id = propagated_request_id(&headers, &state);
    let resp = match state.labels.fetch_label_bytes(&key).await {
        Ok(Some(object)) => {
            let mut resp = Response::new(Body::from(object.bytes));
            if let Ok(value) = HeaderValue::from_str(&object.content_type) {
                resp.headers_mut().insert("content-type", value);
            }
            resp
        }
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            "label_not_found",
            "no such label object",
            json!({"key": key}),
        ),
        Err(e) => {
            error!(%request_id, error = %e, "label fetch failed");
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                "label store unreachable",
                json!({"key": key}),
            )
        }
    };
    with_request_id(resp, &request_id)
}

pub(crate) async fn health_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let request_id = propagated_request_id(&headers, &state);
    let (catalog, labels) = tokio::join!(state.catalog.ping(), state.labels.ping());
    if let Err(e) = &catalog {
        warn!(error = %e, "catalog health probe failed");
    }
    if let Err(e) = &labels {
        warn!(error = %e, "label store health probe failed");
    }
    let healthy = catalog.is_ok() && labels.is_ok();
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let body = Json(json!({
        "catalog": if catalog.is_ok() { "healthy" } else { "unhealthy" },
        "labels": if labels.is_ok() { "healthy" } else { "unhealthy" },
    }));
    with_request_id((status, body).into_response(), &request_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vinoteca_model::{LabelEntry, WineRecord};

    #[test]
    fn page_escapes_catalog_text() {
        let sample = SampleResult {
            label: LabelEntry {
                category: 2,
                key: "cat_2_a.png".to_string(),
            },
            wine: WineRecord {
                id: "w1".to_string(),
                name: "<script>Wine</script>".to_string(),
                category_1: "Red".to_string(),
                category_2: "Cabernet Sauvignon".to_string(),
                origin: "Chile & Argentina".to_string(),
                description: "Notes of \"cherry\".".to_string(),
            },
        };
        let page = render_page(&sample);
        assert!(page.contains("&lt;script&gt;Wine&lt;/script&gt;"));
        assert!(page.contains("Chile &amp; Argentina"));
        assert!(page.contains("/labels/cat_2_a.png"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn page_escapes_the_label_key_in_the_img_attribute() {
        let sample = SampleResult {
            label: LabelEntry {
                category: 2,
                key: "cat_2_a\"><script>.png".to_string(),
            },
            wine: WineRecord {
                id: "w1".to_string(),
                name: "Test Wine".to_string(),
                category_1: "Red".to_string(),
                category_2: "Cabernet Sauvignon".to_string(),
                origin: "Chile".to_string(),
                description: "A test pour.".to_string(),
            },
        };
        let page = render_page(&sample);
        assert!(page.contains("/labels/cat_2_a&quot;&gt;&lt;script&gt;.png"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn fallback_png_is_a_png() {
        assert_eq!(&FALLBACK_PNG[..8], b"\x89PNG\r\n\x1a\n");
    }
}
