//! Admin account management.
//!
//! # Usage
//!
//! ```bash
//! emporium-cli admin create -e admin@example.com -f Ada -l Lovelace --password '...'
//! ```
//!
//! # Environment Variables
//!
//! The server's own environment: `EMPORIUM_DATABASE_URL` and
//! `EMPORIUM_JWT_SECRET` (see `emporium_server::config`).

use thiserror::Error;

use emporium_core::Role;
use emporium_server::config::{ConfigError, ServerConfig, StoreBackend};
use emporium_server::db::{self, Stores};
use emporium_server::services::{AuthError, Registration};
use emporium_server::state::AppState;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configured store is not `PostgreSQL`.
    #[error("admin accounts can only be created in the postgres store")]
    NotPostgres,

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Registration failed (bad email, weak password, duplicate).
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create an admin account with its own cart.
///
/// # Errors
///
/// Returns an error if configuration is missing, the input is rejected or an
/// account already uses the email.
pub async fn create(
    email: &str,
    first_name: &str,
    last_name: &str,
    password: String,
) -> Result<(), AdminError> {
    let config = ServerConfig::from_env()?;
    if config.store != StoreBackend::Postgres {
        return Err(AdminError::NotPostgres);
    }
    let database_url = config.database_url.clone().ok_or(AdminError::NotPostgres)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    let state = AppState::new(config, Stores::postgres(&pool));

    let registration = Registration {
        first_name: first_name.to_owned(),
        last_name: last_name.to_owned(),
        email: email.to_owned(),
        age: None,
        password,
    };
    let account = state
        .auth()
        .register_with_role(registration, Role::admin())
        .await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        account.id,
        account.email
    );
    Ok(())
}
