//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] emporium_core::EmailError),

    /// Wrong password or no such account. The two are indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Bearer token is malformed, forged, expired or names a deleted account.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Email already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Age below zero.
    #[error("age must not be negative")]
    InvalidAge(i32),

    /// A required registration field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Token signing failed.
    #[error("token signing failed: {0}")]
    Token(jsonwebtoken::errors::Error),
}
