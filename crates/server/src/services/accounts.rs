//! Account management.
//!
//! An account may read, change and delete itself; an admin may do so for any
//! account. Only an admin may change a role.

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use emporium_core::{AccountId, Email, EmailError, Role, RoleError};

use super::auth::{self, AuthError};
use crate::db::{AccountStore, RepositoryError};
use crate::models::{Account, AccountUpdate};

/// Errors raised by account management.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("user not found")]
    NotFound(AccountId),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("age must not be negative")]
    InvalidAge(i32),

    #[error("invalid role: {0}")]
    InvalidRole(#[from] RoleError),

    #[error(transparent)]
    Password(#[from] AuthError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Requested profile changes, as sent by the client. Absent fields are kept.
#[derive(Clone, Default, Deserialize)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub role: Option<String>,
    pub password: Option<String>,
}

impl ProfileChanges {
    fn into_update(self) -> Result<AccountUpdate, AccountError> {
        let password_hash = match self.password {
            Some(password) => {
                auth::validate_password(&password)?;
                Some(auth::hash_password(&password)?)
            }
            None => None,
        };
        Ok(AccountUpdate {
            first_name: trimmed(self.first_name),
            last_name: trimmed(self.last_name),
            email: self.email.as_deref().map(Email::parse).transpose()?,
            age: match self.age {
                Some(age) if age < 0 => return Err(AccountError::InvalidAge(age)),
                age => age,
            },
            role: self.role.as_deref().map(Role::parse).transpose()?,
            password_hash,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

pub struct AccountService<'a> {
    accounts: &'a dyn AccountStore,
}

impl<'a> AccountService<'a> {
    #[must_use]
    pub const fn new(accounts: &'a dyn AccountStore) -> Self {
        Self { accounts }
    }

    /// Every account, oldest first. Callers gate this to admins.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` if the store fails.
    pub async fn list(&self) -> Result<Vec<Account>, AccountError> {
        Ok(self.accounts.list().await?)
    }

    /// # Errors
    ///
    /// Returns `AccountError::Forbidden` unless `actor` is the account or an
    /// admin, and `AccountError::NotFound` if it does not exist.
    pub async fn get(&self, actor: &Account, id: AccountId) -> Result<Account, AccountError> {
        ensure_access(actor, id)?;
        self.accounts
            .get(id)
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    /// # Errors
    ///
    /// Returns `AccountError::Forbidden` when a non-admin touches another
    /// account or any role, validation errors for bad fields and
    /// `AccountError::Repository` with a conflict for a taken email.
    pub async fn update(
        &self,
        actor: &Account,
        id: AccountId,
        changes: ProfileChanges,
    ) -> Result<Account, AccountError> {
        ensure_access(actor, id)?;
        if changes.role.is_some() && !actor.role.is_admin() {
            return Err(AccountError::Forbidden("only an admin may change a role"));
        }
        let update = changes.into_update()?;
        let account = self
            .accounts
            .update(id, &update)
            .await?
            .ok_or(AccountError::NotFound(id))?;
        info!(account_id = %id, actor = %actor.id, "account updated");
        Ok(account)
    }

    /// # Errors
    ///
    /// Returns `AccountError::Forbidden` or `AccountError::NotFound`.
    pub async fn delete(&self, actor: &Account, id: AccountId) -> Result<(), AccountError> {
        ensure_access(actor, id)?;
        if !self.accounts.delete(id).await? {
            return Err(AccountError::NotFound(id));
        }
        info!(account_id = %id, actor = %actor.id, "account deleted");
        Ok(())
    }
}

fn ensure_access(actor: &Account, id: AccountId) -> Result<(), AccountError> {
    if actor.id == id || actor.role.is_admin() {
        Ok(())
    } else {
        Err(AccountError::Forbidden("not allowed to access this account"))
    }
}
