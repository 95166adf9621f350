//! Authentication extractors.
//!
//! API handlers authenticate with an `Authorization: Bearer <token>` header or,
//! failing that, the session cookie. View handlers only look at the session.
//!
//! | Extractor        | Anonymous                | Wrong role |
//! |------------------|--------------------------|------------|
//! | [`Authenticated`]| 401                      | -          |
//! | [`RequireRole`]  | 401                      | 403        |
//! | [`BearerAuth`]   | 401 (token required)     | -          |
//! | [`PrivateOnly`]  | redirect to `/login`     | -          |
//! | [`PublicOnly`]   | passes                   | -          |
//!
//! [`PublicOnly`] redirects a logged-in visitor to `/current`.

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use emporium_core::{AccountId, Role};

use crate::error::{AppError, ViewError, clear_sentry_user, set_sentry_user};
use crate::models::{Account, session_keys};
use crate::state::AppState;

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}

async fn account_from_token(state: &AppState, token: &str) -> Result<Account, AppError> {
    let account = state.auth().authenticate_token(token).await?;
    set_sentry_user(&account.id, Some(account.email.as_str()));
    Ok(account)
}

/// The account logged in through the session cookie, if any.
///
/// A session naming a deleted account counts as anonymous.
async fn account_from_session(parts: &Parts, state: &AppState) -> Result<Option<Account>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Ok(None);
    };
    let Some(id) = session.get::<AccountId>(session_keys::ACCOUNT_ID).await? else {
        return Ok(None);
    };
    Ok(state.accounts().get(id).await?)
}

/// Extractor that requires an authenticated account (token or session).
pub struct Authenticated(pub Account);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer_token(parts) {
            return account_from_token(state, token).await.map(Self);
        }
        account_from_session(parts, state)
            .await?
            .map(Self)
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))
    }
}

/// Extractor that requires a valid bearer token; the session is ignored.
pub struct BearerAuth(pub Account);

impl FromRequestParts<AppState> for BearerAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("bearer token required".to_string()))?;
        account_from_token(state, token).await.map(Self)
    }
}

/// Roles permitted by a [`RequireRole`] gate.
pub trait AllowedRoles {
    const ROLES: &'static [&'static str];
}

/// Admins only.
pub struct AdminOnly;

impl AllowedRoles for AdminOnly {
    const ROLES: &'static [&'static str] = &[Role::ADMIN];
}

/// Extractor that requires an authenticated account holding one of `P::ROLES`.
pub struct RequireRole<P>(pub Account, PhantomData<P>);

/// Shorthand for the admin gate.
pub type RequireAdmin = RequireRole<AdminOnly>;

impl<P> FromRequestParts<AppState> for RequireRole<P>
where
    P: AllowedRoles + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Authenticated(account) = Authenticated::from_request_parts(parts, state).await?;
        if !account.role.is_one_of(P::ROLES) {
            tracing::warn!(account_id = %account.id, role = %account.role, "role check failed");
            return Err(AppError::Forbidden("insufficient permissions".to_string()));
        }
        Ok(Self(account, PhantomData))
    }
}

/// Extractor that optionally gets the session account.
///
/// Unlike [`PrivateOnly`], this does not reject anonymous visitors.
pub struct OptionalAuth(pub Option<Account>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = ViewError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        account_from_session(parts, state)
            .await
            .map(Self)
            .map_err(ViewError)
    }
}

// =============================================================================
// View guards
// =============================================================================

/// Rejection for the view guards.
pub enum ViewRejection {
    RedirectToLogin,
    RedirectToCurrent,
    Failed(AppError),
}

impl IntoResponse for ViewRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
            Self::RedirectToCurrent => Redirect::to("/current").into_response(),
            Self::Failed(err) => ViewError(err).into_response(),
        }
    }
}

/// Page only for logged-in visitors; anonymous ones go to `/login`.
pub struct PrivateOnly(pub Account);

impl FromRequestParts<AppState> for PrivateOnly {
    type Rejection = ViewRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        account_from_session(parts, state)
            .await
            .map_err(ViewRejection::Failed)?
            .map(Self)
            .ok_or(ViewRejection::RedirectToLogin)
    }
}

/// Page only for anonymous visitors; logged-in ones go to `/current`.
pub struct PublicOnly;

impl FromRequestParts<AppState> for PublicOnly {
    type Rejection = ViewRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match account_from_session(parts, state).await {
            Ok(Some(_)) => Err(ViewRejection::RedirectToCurrent),
            Ok(None) => Ok(Self),
            Err(err) => Err(ViewRejection::Failed(err)),
        }
    }
}

// =============================================================================
// Session login state
// =============================================================================

/// Log `account` into the session and adopt its cart as the session cart.
///
/// The session id is rotated first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn log_in(session: &Session, account: &Account) -> Result<(), AppError> {
    session.cycle_id().await?;
    session.insert(session_keys::ACCOUNT_ID, account.id).await?;
    if let Some(cart) = account.cart {
        session.insert(session_keys::CART_ID, cart).await?;
    }
    set_sentry_user(&account.id, Some(account.email.as_str()));
    Ok(())
}

/// Drop everything in the session (logout).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn log_out(session: &Session) -> Result<(), AppError> {
    session.flush().await?;
    clear_sentry_user();
    Ok(())
}
