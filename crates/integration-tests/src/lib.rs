//! Integration test harness for Emporium.
//!
//! Every test spawns the real router on an ephemeral port over in-memory
//! stores and talks to it with `reqwest`, so sessions, redirects and the
//! event stream behave exactly as they do for a browser.
//!
//! ```bash
//! cargo test -p emporium-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::SocketAddr;

use reqwest::{Client, redirect::Policy};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use emporium_core::Role;
use emporium_server::config::ServerConfig;
use emporium_server::db::Stores;
use emporium_server::models::Account;
use emporium_server::services::Registration;
use emporium_server::state::AppState;

/// Signing secret for test tokens.
const TEST_JWT_SECRET: &str = "q7Vn2Lx9Kd4Rt8Wm3Zp6Hs1Jf5Gb0Yc-integration";

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// A running server plus direct access to its state.
pub struct TestApp {
    pub addr: SocketAddr,
    pub state: AppState,
}

impl TestApp {
    /// Start a server on `127.0.0.1:0` with empty in-memory stores.
    pub async fn spawn() -> Self {
        let config = ServerConfig::in_memory(SecretString::from(TEST_JWT_SECRET));
        let state = AppState::new(config, Stores::memory());
        let app = emporium_server::app(state.clone(), tower_sessions::MemoryStore::default());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// A client with its own cookie jar. Redirects are not followed so tests
    /// can assert on them.
    #[must_use]
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .unwrap()
    }

    /// Register an account directly through the auth service.
    pub async fn register(&self, email: &str, role: Role) -> Account {
        self.state
            .auth()
            .register_with_role(
                Registration {
                    first_name: "Test".to_string(),
                    last_name: "Account".to_string(),
                    email: email.to_string(),
                    age: Some(30),
                    password: TEST_PASSWORD.to_string(),
                },
                role,
            )
            .await
            .unwrap()
    }

    /// Bearer token for a fresh admin account.
    pub async fn admin_token(&self) -> String {
        let admin = self.register("admin@example.com", Role::admin()).await;
        self.state.auth().issue_token(&admin).unwrap()
    }

    /// Create a product through the API and return its JSON.
    pub async fn create_product(&self, token: &str, title: &str, price: f64, category: &str) -> Value {
        let response = self
            .client()
            .post(self.url("/api/products"))
            .bearer_auth(token)
            .json(&json!({
                "title": title,
                "description": format!("{title} description"),
                "price": price,
                "category": category,
                "stock": 10,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: Value = response.json().await.unwrap();
        body["payload"].clone()
    }

    /// Create an empty cart through the API and return its id.
    pub async fn create_cart(&self) -> String {
        let body: Value = self
            .client()
            .post(self.url("/api/carts"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["payload"]["id"].as_str().unwrap().to_string()
    }
}

/// The `id` field of a JSON resource.
#[must_use]
pub fn id_of(resource: &Value) -> String {
    resource["id"].as_str().unwrap().to_string()
}
