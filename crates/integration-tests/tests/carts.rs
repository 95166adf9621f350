//! Cart API behaviour over a running server.

use reqwest::StatusCode;
use serde_json::{Value, json};

use emporium_integration_tests::{TestApp, id_of};

async fn cart_lines(app: &TestApp, cart_id: &str) -> Vec<Value> {
    let body: Value = app
        .client()
        .get(app.url(&format!("/api/carts/{cart_id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["payload"]["products"].as_array().unwrap().clone()
}

// ============================================================================
// Add & Set Quantity
// ============================================================================

#[tokio::test]
async fn test_add_merges_quantities() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let p1 = id_of(&app.create_product(&token, "Notebook", 4.5, "Stationery").await);
    let cart = app.create_cart().await;
    let client = app.client();

    assert!(cart_lines(&app, &cart).await.is_empty());

    let response = client
        .post(app.url(&format!("/api/carts/{cart}/products/{p1}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["payload"]["products"], json!([{"product": p1, "quantity": 1}]));

    let body: Value = client
        .post(app.url(&format!("/api/carts/{cart}/products/{p1}")))
        .json(&json!({"quantity": 2}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["payload"]["products"], json!([{"product": p1, "quantity": 3}]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_sum_into_one_line() {
    const ADDS: u64 = 20;

    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let p1 = id_of(&app.create_product(&token, "Marker", 3.0, "Stationery").await);
    let cart = app.create_cart().await;
    let client = app.client();
    let url = app.url(&format!("/api/carts/{cart}/products/{p1}"));

    let adds = (0..ADDS).map(|_| {
        let client = client.clone();
        let url = url.clone();
        tokio::spawn(async move {
            client
                .post(url)
                .json(&json!({"quantity": 2}))
                .send()
                .await
                .unwrap()
                .status()
        })
    });
    for status in futures::future::join_all(adds).await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }

    let lines = cart_lines(&app, &cart).await;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["productId"], json!(p1));
    assert_eq!(lines[0]["quantity"], json!(2 * ADDS));
}

#[tokio::test]
async fn test_add_new_product_appends_one_line() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let p1 = id_of(&app.create_product(&token, "Pen", 2.0, "Stationery").await);
    let p2 = id_of(&app.create_product(&token, "Ink", 7.0, "Stationery").await);
    let cart = app.create_cart().await;
    let client = app.client();

    for (pid, quantity) in [(&p1, 1), (&p2, 4)] {
        let response = client
            .post(app.url(&format!("/api/carts/{cart}/products/{pid}")))
            .json(&json!({"quantity": quantity}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let lines = cart_lines(&app, &cart).await;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["productId"], json!(p2));
    assert_eq!(lines[1]["quantity"], json!(4));
    assert_eq!(lines[1]["product"]["title"], json!("Ink"));
}

#[tokio::test]
async fn test_add_rejects_bad_quantity_and_unknown_ids() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let p1 = id_of(&app.create_product(&token, "Pen", 2.0, "Stationery").await);
    let cart = app.create_cart().await;
    let client = app.client();

    for quantity in [json!(0), json!(-2), json!(1.5), json!("many")] {
        let response = client
            .post(app.url(&format!("/api/carts/{cart}/products/{p1}")))
            .json(&json!({"quantity": quantity}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{quantity}");
    }

    let response = client
        .post(app.url(&format!("/api/carts/not-a-uuid/products/{p1}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let missing = "00000000-0000-4000-8000-000000000000";
    let response = client
        .post(app.url(&format!("/api/carts/{cart}/products/{missing}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert!(cart_lines(&app, &cart).await.is_empty());
}

#[tokio::test]
async fn test_set_quantity_on_non_member_is_not_found() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let p1 = id_of(&app.create_product(&token, "Pen", 2.0, "Stationery").await);
    let p2 = id_of(&app.create_product(&token, "Ink", 7.0, "Stationery").await);
    let cart = app.create_cart().await;
    let client = app.client();

    client
        .post(app.url(&format!("/api/carts/{cart}/products/{p1}")))
        .send()
        .await
        .unwrap();

    let response = client
        .put(app.url(&format!("/api/carts/{cart}/products/{p2}")))
        .json(&json!({"quantity": 5}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], json!("error"));

    let lines = cart_lines(&app, &cart).await;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["productId"], json!(p1));
    assert_eq!(lines[0]["quantity"], json!(1));

    let body: Value = client
        .put(app.url(&format!("/api/carts/{cart}/products/{p1}")))
        .json(&json!({"quantity": "6"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["payload"]["products"][0]["quantity"], json!(6));
}

// ============================================================================
// Replace, Remove & Clear
// ============================================================================

#[tokio::test]
async fn test_replace_clamps_quantities() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let p1 = id_of(&app.create_product(&token, "Pen", 2.0, "Stationery").await);
    let p2 = id_of(&app.create_product(&token, "Ink", 7.0, "Stationery").await);
    let p3 = id_of(&app.create_product(&token, "Paper", 3.0, "Stationery").await);
    let cart = app.create_cart().await;

    let response = app
        .client()
        .put(app.url(&format!("/api/carts/{cart}")))
        .json(&json!({"products": [
            {"product": p1, "quantity": 0},
            {"product": p2, "quantity": "lots"},
            {"product": p3, "quantity": -4},
        ]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let lines = cart_lines(&app, &cart).await;
    assert_eq!(lines.len(), 3);
    assert!(lines.iter().all(|line| line["quantity"] == json!(1)));
}

#[tokio::test]
async fn test_replace_with_unknown_product_changes_nothing() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let p1 = id_of(&app.create_product(&token, "Pen", 2.0, "Stationery").await);
    let cart = app.create_cart().await;
    let client = app.client();

    client
        .post(app.url(&format!("/api/carts/{cart}/products/{p1}")))
        .json(&json!({"quantity": 2}))
        .send()
        .await
        .unwrap();

    let unknown = "00000000-0000-4000-8000-000000000001";
    let response = client
        .put(app.url(&format!("/api/carts/{cart}")))
        .json(&json!({"products": [
            {"product": p1, "quantity": 9},
            {"product": unknown, "quantity": 1},
        ]}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let lines = cart_lines(&app, &cart).await;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["quantity"], json!(2));
}

#[tokio::test]
async fn test_remove_and_clear() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let p1 = id_of(&app.create_product(&token, "Pen", 2.0, "Stationery").await);
    let p2 = id_of(&app.create_product(&token, "Ink", 7.0, "Stationery").await);
    let cart = app.create_cart().await;
    let client = app.client();

    for pid in [&p1, &p2] {
        client
            .post(app.url(&format!("/api/carts/{cart}/products/{pid}")))
            .send()
            .await
            .unwrap();
    }

    let response = client
        .delete(app.url(&format!("/api/carts/{cart}/products/{p1}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .delete(app.url(&format!("/api/carts/{cart}/products/{p1}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], json!("product is not in the cart"));

    let response = client
        .delete(app.url(&format!("/api/carts/{cart}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cart_lines(&app, &cart).await.is_empty());

    let missing = "00000000-0000-4000-8000-000000000002";
    let response = client
        .delete(app.url(&format!("/api/carts/{missing}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], json!("cart not found"));
}

#[tokio::test]
async fn test_deleted_product_resolves_to_null() {
    let app = TestApp::spawn().await;
    let token = app.admin_token().await;
    let p1 = id_of(&app.create_product(&token, "Pen", 2.0, "Stationery").await);
    let cart = app.create_cart().await;
    let client = app.client();

    client
        .post(app.url(&format!("/api/carts/{cart}/products/{p1}")))
        .send()
        .await
        .unwrap();
    let response = client
        .delete(app.url(&format!("/api/products/{p1}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let lines = cart_lines(&app, &cart).await;
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["productId"], json!(p1));
    assert!(lines[0]["product"].is_null());
}
