//! Real HTTP stack against a local server that only speaks the legacy query layout.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

use newsdesk::upload::{HttpObjectStore, ObjectStore};
use newsdesk::{Config, Error, Newsdesk};

#[derive(Default)]
struct Uploads {
    received: Mutex<Vec<(String, String, String, usize)>>,
}

async fn legacy_route(Query(q): Query<HashMap<String, String>>) -> impl IntoResponse {
    match q.get("route").map(String::as_str) {
        Some("/v2/posts") => Json(json!([
            {
                "id": 41,
                "slug": "hypersonic-test",
                "title": { "rendered": "Hypersonic test" },
                "date": "2025-03-01T12:00:00Z",
                "categories": [5],
                "tags": [9],
                "_embedded": { "media": [{ "source_url": "https://img.example/41.jpg" }] }
            }
        ]))
        .into_response(),
        Some("/v2/categories") => Json(json!([{ "id": 5, "slug": "missiles", "name": "Missiles" }])).into_response(),
        Some("/v2/tags") => Json(json!([{ "id": 9, "slug": "trending", "name": "Trending" }])).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn modern_route() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "no such route")
}

async fn put_blob(
    State(uploads): State<Arc<Uploads>>,
    Path((container, name)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let header = |k: &str| headers.get(k).and_then(|v| v.to_str().ok()).unwrap_or_default().to_string();
    if header("x-ms-blob-type") != "BlockBlob" {
        return StatusCode::BAD_REQUEST;
    }
    uploads
        .received
        .lock()
        .unwrap()
        .push((format!("{container}/{name}"), header("content-type"), header("x-ms-blob-type"), body.len()));
    StatusCode::CREATED
}

async fn spawn_server(uploads: Arc<Uploads>) -> Url {
    let app = Router::new()
        .route("/", get(legacy_route))
        .route("/api/v2/:resource", get(modern_route))
        .route("/blobs/:container/:name", put(put_blob))
        .with_state(uploads);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

#[tokio::test]
async fn falls_back_to_legacy_layout_over_http() {
    let base = spawn_server(Arc::new(Uploads::default())).await;
    let config = Config::new(base.as_str()).unwrap();
    let desk = Newsdesk::connect(&config).await.unwrap();

    let page = desk.news(Some("missiles")).await.unwrap();
    let news = page.bucket("news").unwrap();
    assert_eq!(news.items.len(), 1);
    let item = &news.items[0];
    assert_eq!(item.id, 41);
    assert_eq!(item.image_url, "https://img.example/41.jpg");
    assert_eq!(item.category_label, "Missiles");
    assert_eq!(item.href().as_deref(), Some("/news/hypersonic-test"));
}

#[tokio::test]
async fn unreachable_source_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = Config::new(&format!("http://{addr}")).unwrap();
    let desk = Newsdesk::connect(&config).await.unwrap();
    let err = desk.home().await.unwrap_err();
    assert!(matches!(err, Error::Transport { .. } | Error::Timeout { .. }), "got {err:?}");
}

#[tokio::test]
async fn blob_upload_puts_block_blob() {
    let uploads = Arc::new(Uploads::default());
    let base = spawn_server(uploads.clone()).await;
    let container = base.join("/blobs/blog-images?sig=secret").unwrap();

    let store = HttpObjectStore::new(container).unwrap();
    let url = store.upload("77", "Cover.PNG", vec![0u8; 16]).await.unwrap();

    assert_eq!(url, format!("{base}blobs/blog-images/77.png"));
    let received = uploads.received.lock().unwrap().clone();
    assert_eq!(received, vec![("blog-images/77.png".to_string(), "image/png".to_string(), "BlockBlob".to_string(), 16)]);
}
