//! Authentication view handlers.
//!
//! Login itself is posted to [`api::sessions::form_login`]; these handlers
//! render the pages and handle registration.
//!
//! [`api::sessions::form_login`]: super::api::sessions::form_login

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::error::{AppError, ViewError};
use crate::filters;
use crate::middleware::{PrivateOnly, PublicOnly, log_in};
use crate::models::Account;
use crate::services::Registration;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Registration form data. Browsers send every field as text.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<String>,
    pub password: String,
}

impl RegisterForm {
    fn into_registration(self) -> Result<Registration, String> {
        let age = match self.age.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i32>()
                    .ok()
                    .filter(|age| *age >= 0)
                    .ok_or_else(|| "age must be a whole number".to_string())?,
            ),
        };
        Ok(Registration {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            age,
            password: self.password,
        })
    }
}

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Current account page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/current.html")]
pub struct CurrentTemplate {
    pub account: Account,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(_: PublicOnly, Query(query): Query<LoginQuery>) -> LoginTemplate {
    LoginTemplate {
        error: query
            .error
            .map(|_| "Invalid email or password".to_string()),
    }
}

/// Display the registration page.
pub async fn register_page(_: PublicOnly) -> RegisterTemplate {
    RegisterTemplate {
        error: None,
        first_name: String::new(),
        last_name: String::new(),
        email: String::new(),
    }
}

/// Handle registration. Success logs the new account in.
///
/// Invalid input re-renders the form with a 400.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    _: PublicOnly,
    Form(form): Form<RegisterForm>,
) -> Result<Response, ViewError> {
    let retry = |error: String, form: &RegisterForm| {
        (
            StatusCode::BAD_REQUEST,
            RegisterTemplate {
                error: Some(error),
                first_name: form.first_name.clone(),
                last_name: form.last_name.clone(),
                email: form.email.clone(),
            },
        )
            .into_response()
    };

    let echo = RegisterForm {
        first_name: form.first_name.clone(),
        last_name: form.last_name.clone(),
        email: form.email.clone(),
        age: None,
        password: String::new(),
    };

    let registration = match form.into_registration() {
        Ok(registration) => registration,
        Err(message) => return Ok(retry(message, &echo)),
    };

    match state.auth().register(registration).await {
        Ok(account) => {
            log_in(&session, &account).await?;
            Ok(Redirect::to("/current").into_response())
        }
        Err(err) => {
            let err = AppError::from(err);
            if err.status().is_client_error() {
                warn!(error = %err, "registration rejected");
                Ok(retry(err.public_message(), &echo))
            } else {
                Err(err.into())
            }
        }
    }
}

/// Display the logged-in account.
pub async fn current(PrivateOnly(account): PrivateOnly) -> CurrentTemplate {
    CurrentTemplate { account }
}
