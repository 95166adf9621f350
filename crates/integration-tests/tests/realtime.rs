//! Live catalog event stream.

use std::time::Duration;

use axum::body::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::time::timeout;

use emporium_integration_tests::{TestApp, id_of};

/// How long to wait for an event that should arrive.
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait before concluding no event is coming.
const QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Reads `products` events off an SSE response body.
struct EventReader {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    buffer: String,
}

impl EventReader {
    async fn open(app: &TestApp) -> Self {
        let response = app
            .client()
            .get(app.url("/realtime/products"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers()["content-type"]
                .to_str()
                .unwrap()
                .starts_with("text/event-stream")
        );
        Self {
            body: response.bytes_stream().boxed(),
            buffer: String::new(),
        }
    }

    /// The next `products` event's data, parsed.
    async fn next_snapshot(&mut self) -> Value {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let frame: String = self.buffer.drain(..end + 2).collect();
                let mut name = None;
                let mut data = String::new();
                for line in frame.lines() {
                    if let Some(value) = line.strip_prefix("event:") {
                        name = Some(value.trim().to_string());
                    } else if let Some(value) = line.strip_prefix("data:") {
                        data.push_str(value.trim_start());
                    }
                }
                if name.as_deref() == Some("products") {
                    return serde_json::from_str(&data).unwrap();
                }
                continue;
            }
            let chunk = self.body.next().await.unwrap().unwrap();
            self.buffer.push_str(std::str::from_utf8(&chunk).unwrap());
        }
    }

    async fn expect_snapshot(&mut self) -> Value {
        timeout(EVENT_TIMEOUT, self.next_snapshot()).await.unwrap()
    }

    async fn expect_quiet(&mut self) {
        assert!(
            timeout(QUIET_PERIOD, self.next_snapshot()).await.is_err(),
            "unexpected catalog event"
        );
    }
}

fn ids(snapshot: &Value) -> Vec<String> {
    snapshot
        .as_array()
        .unwrap()
        .iter()
        .map(id_of)
        .collect()
}

#[tokio::test]
async fn test_observer_receives_initial_snapshot() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let lamp = id_of(&app.create_product(&token, "Lamp", 25.0, "Home").await);

    let mut reader = EventReader::open(&app).await;
    let snapshot = reader.expect_snapshot().await;
    assert_eq!(ids(&snapshot), [lamp]);
    assert_eq!(snapshot[0]["title"], json!("Lamp"));
}

#[tokio::test]
async fn test_catalog_writes_broadcast_full_list() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let mut reader = EventReader::open(&app).await;
    assert_eq!(reader.expect_snapshot().await, json!([]));

    let lamp = id_of(&app.create_product(&token, "Lamp", 25.0, "Home").await);
    assert_eq!(ids(&reader.expect_snapshot().await), [lamp.clone()]);

    let rug = id_of(&app.create_product(&token, "Rug", 80.0, "Home").await);
    assert_eq!(ids(&reader.expect_snapshot().await), [lamp.clone(), rug.clone()]);

    let response = app
        .client()
        .put(app.url(&format!("/api/products/{rug}")))
        .bearer_auth(&token)
        .json(&json!({"stock": 0}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let snapshot = reader.expect_snapshot().await;
    assert_eq!(snapshot[1]["stock"], json!(0));

    let response = app
        .client()
        .delete(app.url(&format!("/api/products/{lamp}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(ids(&reader.expect_snapshot().await), [rug]);

    // exactly one event per write
    reader.expect_quiet().await;
}

#[tokio::test]
async fn test_failed_writes_and_cart_changes_do_not_broadcast() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let lamp = id_of(&app.create_product(&token, "Lamp", 25.0, "Home").await);
    let cart = app.create_cart().await;

    let mut reader = EventReader::open(&app).await;
    reader.expect_snapshot().await;

    let response = app
        .client()
        .delete(app.url("/api/products/00000000-0000-4000-8000-000000000000"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .client()
        .post(app.url("/api/products"))
        .json(&json!({"title": "Sneaky", "price": 1.0, "category": "Home"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .client()
        .post(app.url(&format!("/api/carts/{cart}/products/{lamp}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    reader.expect_quiet().await;
}

#[tokio::test]
async fn test_realtime_page_lists_products() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    app.create_product(&token, "Lamp", 25.0, "Home").await;

    let response = app
        .client()
        .get(app.url("/realtimeproducts"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("Lamp"));
    assert!(html.contains("/static/js/realtime.js"));
}
