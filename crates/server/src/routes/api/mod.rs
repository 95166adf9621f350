//! JSON API.
//!
//! Every response uses the envelope
//! `{"status": "success" | "error", "payload"?, "message"?, "error"?}`.
//! Errors are rendered by [`AppError`](crate::error::AppError).

pub mod carts;
pub mod products;
pub mod sessions;
pub mod users;

use axum::{Json, Router, extract::FromRequest, http::StatusCode};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// JSON body extractor whose rejections become 400 envelopes.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    #[must_use]
    pub const fn success(payload: T) -> Self {
        Self {
            status: "success",
            message: None,
            payload: Some(payload),
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl Envelope<()> {
    /// Envelope with a message and no payload.
    #[must_use]
    pub const fn message(message: &'static str) -> Self {
        Self {
            status: "success",
            message: Some(message),
            payload: None,
        }
    }
}

/// `200` with `payload`.
pub fn ok<T: Serialize>(payload: T) -> Json<Envelope<T>> {
    Json(Envelope::success(payload))
}

/// `201` with the created resource.
pub fn created<T: Serialize>(payload: T) -> (StatusCode, Json<Envelope<T>>) {
    (StatusCode::CREATED, Json(Envelope::success(payload)))
}

/// Create all `/api` routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/carts", carts::routes())
        .nest("/products", products::routes())
        .nest("/users", users::routes())
        .nest("/sessions", sessions::routes())
}
