//! Authentication service.
//!
//! Password registration and login backed by argon2, plus bearer tokens for
//! API clients (see [`token`]).

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenKeys};

use std::sync::LazyLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Deserialize;
use tracing::{info, warn};

use emporium_core::{Email, Role};

use crate::db::{AccountStore, CartStore, RepositoryError};
use crate::models::{Account, NewAccount};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Verified against on unknown-email logins so both failures cost one argon2 run.
static DUMMY_PASSWORD_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("emporium-unknown-account").ok());

/// Registration input.
#[derive(Clone, Deserialize)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub age: Option<i32>,
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("age", &self.age)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Authentication service.
///
/// Handles registration, password login and bearer-token resolution.
pub struct AuthService<'a> {
    accounts: &'a dyn AccountStore,
    carts: &'a dyn CartStore,
    tokens: &'a TokenKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        accounts: &'a dyn AccountStore,
        carts: &'a dyn CartStore,
        tokens: &'a TokenKeys,
    ) -> Self {
        Self {
            accounts,
            carts,
            tokens,
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new account with the `user` role.
    ///
    /// # Errors
    ///
    /// See [`AuthService::register_with_role`].
    pub async fn register(&self, input: Registration) -> Result<Account, AuthError> {
        self.register_with_role(input, Role::user()).await
    }

    /// Register a new account and give it an empty cart of its own.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` for a blank name,
    /// `AuthError::InvalidEmail` if the email format is invalid,
    /// `AuthError::WeakPassword` if the password doesn't meet requirements and
    /// `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register_with_role(
        &self,
        input: Registration,
        role: Role,
    ) -> Result<Account, AuthError> {
        let first_name = required(&input.first_name, "first_name")?;
        let last_name = required(&input.last_name, "last_name")?;
        let email = Email::parse(&input.email)?;
        let age = validate_age(input.age)?;
        validate_password(&input.password)?;
        let password_hash = hash_password(&input.password)?;

        // Checked up front so a duplicate does not leave an orphaned cart.
        if self.accounts.get_credentials(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists);
        }

        let cart = self.carts.create().await?;
        let account = self
            .accounts
            .create(NewAccount {
                first_name,
                last_name,
                email,
                age,
                role,
                cart: Some(cart.id),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(account_id = %account.id, role = %account.role, "account registered");
        Ok(account)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown or
    /// malformed, or the password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Err(AuthError::InvalidCredentials);
        };

        let Some((account, password_hash)) = self.accounts.get_credentials(&email).await? else {
            if let Some(dummy) = DUMMY_PASSWORD_HASH.as_deref() {
                let _ = verify_password(password, dummy);
            }
            warn!("login attempt for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        verify_password(password, &password_hash).inspect_err(|_| {
            warn!(account_id = %account.id, "login attempt with wrong password");
        })?;

        Ok(account)
    }

    // =========================================================================
    // Bearer Tokens
    // =========================================================================

    /// Issue a bearer token for `account`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue_token(&self, account: &Account) -> Result<String, AuthError> {
        self.tokens.issue(&Claims::for_account(account))
    }

    /// Resolve a bearer token to its (current) account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token does not verify or its
    /// account no longer exists.
    pub async fn authenticate_token(&self, token: &str) -> Result<Account, AuthError> {
        let claims = self.tokens.verify(token)?;
        self.accounts
            .get(claims.sub)
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}

fn required(value: &str, field: &'static str) -> Result<String, AuthError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(trimmed.to_owned())
}

/// Ages are optional but never negative.
pub(crate) fn validate_age(age: Option<i32>) -> Result<Option<i32>, AuthError> {
    match age {
        Some(age) if age < 0 => Err(AuthError::InvalidAge(age)),
        age => Ok(age),
    }
}

/// Validate password meets requirements.
pub(crate) fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
pub(crate) fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::db::MemoryStore;

    fn token_keys() -> TokenKeys {
        TokenKeys::new(&SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%"))
    }

    fn registration(email: &str) -> Registration {
        Registration {
            first_name: " Ana ".to_string(),
            last_name: "Lopez".to_string(),
            email: email.to_string(),
            age: Some(31),
            password: "correct horse".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_links_a_fresh_cart() {
        let store = MemoryStore::new();
        let keys = token_keys();
        let auth = AuthService::new(&store, &store, &keys);

        let account = auth.register(registration("ana@example.com")).await.unwrap();

        assert_eq!(account.first_name, "Ana");
        assert_eq!(account.role, Role::user());
        let cart_id = account.cart.unwrap();
        assert!(CartStore::get(&store, cart_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        let keys = token_keys();
        let auth = AuthService::new(&store, &store, &keys);
        auth.register(registration("ana@example.com")).await.unwrap();

        let err = auth
            .register(registration("ANA@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserAlreadyExists));
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let store = MemoryStore::new();
        let keys = token_keys();
        let auth = AuthService::new(&store, &store, &keys);
        let mut input = registration("ana@example.com");
        input.password = "short".to_string();

        let err = auth.register(input).await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_negative_age() {
        let store = MemoryStore::new();
        let keys = token_keys();
        let auth = AuthService::new(&store, &store, &keys);
        let mut input = registration("ana@example.com");
        input.age = Some(-5);

        let err = auth.register(input).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidAge(-5)));
        assert!(AccountStore::list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let keys = token_keys();
        let auth = AuthService::new(&store, &store, &keys);
        auth.register(registration("ana@example.com")).await.unwrap();

        let wrong_password = auth
            .login("ana@example.com", "incorrect horse")
            .await
            .unwrap_err();
        let unknown_email = auth
            .login("bob@example.com", "correct horse")
            .await
            .unwrap_err();
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_dummy_hash_never_verifies() {
        let dummy = DUMMY_PASSWORD_HASH.as_deref().unwrap();
        assert!(PasswordHash::new(dummy).is_ok());
        assert!(matches!(
            verify_password("correct horse", dummy),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_token_resolves_to_account() {
        let store = MemoryStore::new();
        let keys = token_keys();
        let auth = AuthService::new(&store, &store, &keys);
        auth.register(registration("ana@example.com")).await.unwrap();

        let account = auth.login("ana@example.com", "correct horse").await.unwrap();
        let token = auth.issue_token(&account).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, account.id);
        assert_eq!(claims.role, account.role);
        assert_eq!(claims.exp - claims.iat, token::TOKEN_TTL_SECONDS);

        let resolved = auth.authenticate_token(&token).await.unwrap();
        assert_eq!(resolved.id, account.id);
    }

    #[tokio::test]
    async fn test_token_for_deleted_account_is_rejected() {
        let store = MemoryStore::new();
        let keys = token_keys();
        let auth = AuthService::new(&store, &store, &keys);
        let account = auth.register(registration("ana@example.com")).await.unwrap();
        let token = auth.issue_token(&account).unwrap();

        AccountStore::delete(&store, account.id).await.unwrap();

        let err = auth.authenticate_token(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken));
    }
}
