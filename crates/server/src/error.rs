//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. API handlers return `Result<T, AppError>` and
//! render the JSON envelope `{"status": "error", "error": ...}`; view
//! handlers return `Result<T, ViewError>` and render the HTML error page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json,
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use emporium_core::{IdError, QuantityError};

use crate::db::RepositoryError;
use crate::filters;
use crate::services::{AccountError, AuthError, CartError, CatalogError};

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Account management failed.
    #[error("Account error: {0}")]
    Account(#[from] AccountError),

    /// Malformed or invalid client input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Nothing (valid) is authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// State conflict, such as a duplicate email.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<IdError> for AppError {
    fn from(e: IdError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl From<QuantityError> for AppError {
    fn from(e: QuantityError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidArgument(rejection.body_text())
    }
}

impl From<FormRejection> for AppError {
    fn from(rejection: FormRejection) -> Self {
        Self::InvalidArgument(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidArgument(rejection.body_text())
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(e: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session error: {e}"))
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict(_) => StatusCode::CONFLICT,
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => repository_status(err),
            Self::Cart(err) => match err {
                CartError::CartNotFound(_)
                | CartError::ProductNotFound(_)
                | CartError::LineItemNotFound(_) => StatusCode::NOT_FOUND,
                CartError::InvalidQuantity(_)
                | CartError::UnknownProducts(_)
                | CartError::InvalidId(_) => StatusCode::BAD_REQUEST,
                CartError::Repository(err) => repository_status(err),
            },
            Self::Catalog(err) => match err {
                CatalogError::Invalid(_) => StatusCode::BAD_REQUEST,
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Repository(err) => repository_status(err),
            },
            Self::Auth(err) => auth_status(err),
            Self::Account(err) => match err {
                AccountError::NotFound(_) => StatusCode::NOT_FOUND,
                AccountError::Forbidden(_) => StatusCode::FORBIDDEN,
                AccountError::InvalidEmail(_)
                | AccountError::InvalidRole(_)
                | AccountError::InvalidAge(_) => {
                    StatusCode::BAD_REQUEST
                }
                AccountError::Password(err) => auth_status(err),
                AccountError::Repository(err) => repository_status(err),
            },
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.status().is_server_error() {
            return "Internal server error".to_string();
        }
        match self {
            Self::Database(err) => err.to_string(),
            Self::Cart(err) => err.to_string(),
            Self::Catalog(err) => err.to_string(),
            Self::Auth(err) | Self::Account(AccountError::Password(err)) => match err {
                AuthError::InvalidCredentials => "Invalid credentials".to_string(),
                AuthError::InvalidToken => "Invalid or expired token".to_string(),
                AuthError::UserAlreadyExists => {
                    "An account with this email already exists".to_string()
                }
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                other => other.to_string(),
            },
            Self::Account(err) => err.to_string(),
            Self::InvalidArgument(msg)
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::Conflict(msg)
            | Self::Internal(msg) => msg.clone(),
        }
    }

    /// Log and capture server-side failures.
    fn report(&self) {
        if self.status().is_server_error() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }
    }
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
        AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        AuthError::WeakPassword(_)
        | AuthError::InvalidEmail(_)
        | AuthError::InvalidAge(_)
        | AuthError::MissingField(_) => StatusCode::BAD_REQUEST,
        AuthError::Repository(err) => repository_status(err),
        AuthError::PasswordHash | AuthError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.report();
        let status = self.status();
        let body = json!({
            "status": "error",
            "error": self.public_message(),
        });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

// =============================================================================
// HTML errors
// =============================================================================

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub reason: &'static str,
    pub message: String,
}

/// [`AppError`] rendered as an HTML page, for view handlers.
#[derive(Debug)]
pub struct ViewError(pub AppError);

impl<E> From<E> for ViewError
where
    E: Into<AppError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        self.0.report();
        let status = self.0.status();
        let page = ErrorTemplate {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Error"),
            message: self.0.public_message(),
        };
        (status, page).into_response()
    }
}

/// Set the Sentry user context from an account id.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(account_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(account_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use emporium_core::{CartId, ProductId};

    use super::*;

    fn get_status(err: impl Into<AppError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::InvalidArgument("invalid input".to_string());
        assert_eq!(err.to_string(), "Invalid argument: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::InvalidArgument("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Conflict("x".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_layered_errors_map_to_status() {
        assert_eq!(
            get_status(CartError::CartNotFound(CartId::generate())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CartError::UnknownProducts(vec![ProductId::generate()])),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ProductId::parse("nope").unwrap_err()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AuthError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AuthError::UserAlreadyExists), StatusCode::CONFLICT);
        assert_eq!(get_status(AuthError::InvalidAge(-5)), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(AccountError::InvalidAge(-5)), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(RepositoryError::DataCorruption("bad".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("secret".to_string()));
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_not_found_messages_are_distinct() {
        let missing_cart = AppError::from(CartError::CartNotFound(CartId::generate()));
        let missing_item = AppError::from(CartError::LineItemNotFound(ProductId::generate()));
        assert_eq!(missing_cart.public_message(), "cart not found");
        assert_eq!(missing_item.public_message(), "product is not in the cart");
    }
}
