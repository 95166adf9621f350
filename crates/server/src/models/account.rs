//! Account domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emporium_core::{AccountId, CartId, Email, Role};

/// A registered account.
///
/// The password hash is intentionally absent; it is only ever returned by
/// [`AccountStore::get_credentials`](crate::db::AccountStore::get_credentials).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub age: Option<i32>,
    pub role: Role,
    /// Cart owned by this account, created at registration.
    pub cart: Option<CartId>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Display name for templates.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for creating an account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub age: Option<i32>,
    pub role: Role,
    pub cart: Option<CartId>,
    pub password_hash: String,
}

/// Partial account update. Absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Email>,
    pub age: Option<i32>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

impl AccountUpdate {
    /// Apply the present profile fields to `account`.
    ///
    /// The password hash is stored separately and is not touched here.
    pub fn apply(&self, account: &mut Account, now: DateTime<Utc>) {
        if let Some(first_name) = &self.first_name {
            account.first_name.clone_from(first_name);
        }
        if let Some(last_name) = &self.last_name {
            account.last_name.clone_from(last_name);
        }
        if let Some(email) = &self.email {
            account.email = email.clone();
        }
        if let Some(age) = self.age {
            account.age = Some(age);
        }
        if let Some(role) = &self.role {
            account.role = role.clone();
        }
        account.updated_at = now;
    }
}
