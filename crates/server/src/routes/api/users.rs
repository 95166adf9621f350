//! User API.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
};
use tracing::instrument;

use emporium_core::AccountId;

use super::{ApiJson, Envelope, created, ok};
use crate::error::Result;
use crate::middleware::{Authenticated, RequireAdmin};
use crate::models::Account;
use crate::services::{ProfileChanges, Registration};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(register))
        .route("/{uid}", get(show).put(update).delete(delete))
}

/// Register a new account (201). The account gets its own empty cart.
#[instrument(skip(state, input), fields(email = %input.email))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<Registration>,
) -> Result<impl IntoResponse> {
    let account = state.auth().register(input).await?;
    Ok(created(account))
}

#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Envelope<Vec<Account>>>> {
    let accounts = state.account_service().list().await?;
    Ok(ok(accounts))
}

#[instrument(skip(state, actor))]
pub async fn show(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Path(uid): Path<String>,
) -> Result<Json<Envelope<Account>>> {
    let account = state
        .account_service()
        .get(&actor, AccountId::parse(&uid)?)
        .await?;
    Ok(ok(account))
}

#[instrument(skip(state, actor, changes))]
pub async fn update(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Path(uid): Path<String>,
    ApiJson(changes): ApiJson<ProfileChanges>,
) -> Result<Json<Envelope<Account>>> {
    let account = state
        .account_service()
        .update(&actor, AccountId::parse(&uid)?, changes)
        .await?;
    Ok(ok(account))
}

#[instrument(skip(state, actor))]
pub async fn delete(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    Path(uid): Path<String>,
) -> Result<Json<Envelope<()>>> {
    state
        .account_service()
        .delete(&actor, AccountId::parse(&uid)?)
        .await?;
    Ok(Json(Envelope::message("user deleted")))
}
