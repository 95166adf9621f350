//! Session API.
//!
//! ```text
//! POST /api/sessions/api-login - Email + password -> bearer token
//! GET  /api/sessions/current   - Profile for a bearer token
//! POST /api/sessions/login     - Form login into the session cookie
//! GET  /api/sessions/logout    - Clear the session
//! ```
//!
//! The form routes answer with redirects since browsers post to them
//! directly; `/login` is mounted on the same handler.

use axum::{
    Form, Json, Router,
    extract::State,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{instrument, warn};

use emporium_core::{AccountId, Email, Role};

use super::{ApiJson, Envelope, ok};
use crate::error::{AppError, Result, ViewError};
use crate::middleware::{BearerAuth, log_in, log_out};
use crate::models::Account;
use crate::services::AuthError;
use crate::state::AppState;

/// Email and password, from JSON or a form.
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub token: String,
}

/// Account profile without credentials.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub role: Role,
}

impl From<Account> for Profile {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            first_name: account.first_name,
            last_name: account.last_name,
            email: account.email,
            role: account.role,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api-login", post(api_login))
        .route("/current", get(current))
        .route("/login", post(form_login))
        .route("/logout", get(logout))
}

#[instrument(skip(state, credentials), fields(email = %credentials.email))]
pub async fn api_login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<TokenResponse>> {
    let auth = state.auth();
    let account = auth
        .login(&credentials.email, &credentials.password)
        .await?;
    let token = auth.issue_token(&account)?;
    Ok(Json(TokenResponse {
        status: "success",
        message: "login successful",
        token,
    }))
}

#[instrument(skip(account))]
pub async fn current(BearerAuth(account): BearerAuth) -> Json<Envelope<Profile>> {
    ok(Profile::from(account))
}

/// Session login. Bad credentials go back to `/login?error=true`.
#[instrument(skip(state, session, credentials), fields(email = %credentials.email))]
pub async fn form_login(
    State(state): State<AppState>,
    session: Session,
    Form(credentials): Form<Credentials>,
) -> std::result::Result<Response, ViewError> {
    match state
        .auth()
        .login(&credentials.email, &credentials.password)
        .await
    {
        Ok(account) => {
            log_in(&session, &account).await?;
            Ok(Redirect::to("/current").into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            warn!("session login rejected");
            Ok(Redirect::to("/login?error=true").into_response())
        }
        Err(other) => Err(AppError::from(other).into()),
    }
}

#[instrument(skip(session))]
pub async fn logout(session: Session) -> std::result::Result<Redirect, ViewError> {
    log_out(&session).await?;
    Ok(Redirect::to("/login"))
}
