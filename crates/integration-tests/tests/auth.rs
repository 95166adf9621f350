//! Registration, login, tokens and account access rules.

use reqwest::{StatusCode, header::LOCATION};
use serde_json::{Value, json};

use emporium_core::Role;
use emporium_integration_tests::{TEST_PASSWORD, TestApp};

fn location(response: &reqwest::Response) -> &str {
    response.headers()[LOCATION].to_str().unwrap()
}

#[tokio::test]
async fn test_register_creates_account_with_cart() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client
        .post(app.url("/api/users"))
        .json(&json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "Ada@Example.com",
            "age": 36,
            "password": TEST_PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = response.json().await.unwrap();
    let account = &body["payload"];
    assert_eq!(account["email"], json!("ada@example.com"));
    assert_eq!(account["role"], json!("user"));
    assert!(account.get("password_hash").is_none());

    let cart_id = account["cart"].as_str().unwrap();
    let response = client
        .get(app.url(&format!("/api/carts/{cart_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .post(app.url("/api/users"))
        .json(&json!({
            "first_name": "Ada",
            "last_name": "Again",
            "email": "ada@example.com",
            "password": TEST_PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let app = TestApp::spawn().await;

    for (email, password) in [("not-an-email", TEST_PASSWORD), ("ok@example.com", "short")] {
        let response = app
            .client()
            .post(app.url("/api/users"))
            .json(&json!({
                "first_name": "Ada",
                "last_name": "Lovelace",
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{email}");
    }
}

#[tokio::test]
async fn test_api_login_issues_token() {
    let app = TestApp::spawn().await;
    let account = app.register("grace@example.com", Role::user()).await;
    let client = app.client();

    let response = client
        .post(app.url("/api/sessions/api-login"))
        .json(&json!({"email": "grace@example.com", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let wrong_password: Value = response.json().await.unwrap();

    let response = client
        .post(app.url("/api/sessions/api-login"))
        .json(&json!({"email": "nobody@example.com", "password": "wrong-password"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let unknown_email: Value = response.json().await.unwrap();
    assert_eq!(wrong_password["error"], unknown_email["error"]);

    let response = client
        .post(app.url("/api/sessions/api-login"))
        .json(&json!({"email": "grace@example.com", "password": TEST_PASSWORD}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], json!("success"));
    let token = body["token"].as_str().unwrap();

    let claims = app.state.tokens().verify(token).unwrap();
    assert_eq!(claims.sub, account.id);
    assert_eq!(claims.role, Role::user());
    assert_eq!(claims.exp - claims.iat, 3600);

    let response = client
        .get(app.url("/api/sessions/current"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["payload"]["email"], json!("grace@example.com"));
    assert!(body["payload"].get("password_hash").is_none());

    let response = client
        .get(app.url("/api/sessions/current"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_account_is_rejected() {
    let app = TestApp::spawn().await;
    let account = app.register("gone@example.com", Role::user()).await;
    let token = app.state.auth().issue_token(&account).unwrap();
    let client = app.client();

    let response = client
        .delete(app.url(&format!("/api/users/{}", account.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(app.url("/api/sessions/current"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_account_access_rules() {
    let app = TestApp::spawn().await;
    let alice = app.register("alice@example.com", Role::user()).await;
    let bob = app.register("bob@example.com", Role::user()).await;
    let alice_token = app.state.auth().issue_token(&alice).unwrap();
    let admin_token = app.admin_token().await;
    let client = app.client();

    let response = client
        .get(app.url(&format!("/api/users/{}", bob.id)))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .put(app.url(&format!("/api/users/{}", alice.id)))
        .bearer_auth(&alice_token)
        .json(&json!({"first_name": "Alicia"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["payload"]["first_name"], json!("Alicia"));

    let response = client
        .put(app.url(&format!("/api/users/{}", alice.id)))
        .bearer_auth(&alice_token)
        .json(&json!({"role": "admin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .get(app.url("/api/users"))
        .bearer_auth(&alice_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .get(app.url("/api/users"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["payload"].as_array().unwrap().len(), 3);

    let response = client
        .put(app.url(&format!("/api/users/{}", bob.id)))
        .bearer_auth(&admin_token)
        .json(&json!({"role": "admin"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["payload"]["role"], json!("admin"));

    let response = client
        .get(app.url("/api/users/not-a-uuid"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_negative_age_is_rejected() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let response = client
        .post(app.url("/api/users"))
        .json(&json!({
            "first_name": "Ada",
            "last_name": "Lovelace",
            "email": "ada@example.com",
            "age": -5,
            "password": TEST_PASSWORD,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], json!("error"));

    let alice = app.register("alice@example.com", Role::user()).await;
    let token = app.state.auth().issue_token(&alice).unwrap();
    let response = client
        .put(app.url(&format!("/api/users/{}", alice.id)))
        .bearer_auth(&token)
        .json(&json!({"age": -5}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = client
        .get(app.url(&format!("/api/users/{}", alice.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["payload"]["age"], json!(30));
}

#[tokio::test]
async fn test_session_login_and_logout() {
    let app = TestApp::spawn().await;
    app.register("lin@example.com", Role::user()).await;
    let client = app.client();

    let response = client
        .post(app.url("/api/sessions/login"))
        .form(&[("email", "lin@example.com"), ("password", "nope-nope-nope")])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login?error=true");

    let response = client.get(app.url("/current")).send().await.unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login");

    let response = client
        .post(app.url("/login"))
        .form(&[("email", "lin@example.com"), ("password", TEST_PASSWORD)])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/current");

    let response = client.get(app.url("/current")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("lin@example.com"));

    // the session cookie also authenticates the API
    let response = client
        .get(app.url("/api/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client.get(app.url("/login")).send().await.unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/current");

    let response = client
        .get(app.url("/api/sessions/logout"))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login");

    let response = client.get(app.url("/current")).send().await.unwrap();
    assert_eq!(location(&response), "/login");
}
