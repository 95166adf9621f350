//! Account role labels.
//!
//! A role is a free-form label on an account. Two labels carry meaning today:
//! [`Role::ADMIN`] may mutate the catalog and manage other accounts, and
//! [`Role::USER`] is what every self-registered account gets.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Role`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RoleError {
    /// The label is empty after trimming.
    #[error("role cannot be empty")]
    Empty,
    /// The label is longer than [`Role::MAX_LENGTH`].
    #[error("role must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// Role label attached to an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Role(String);

impl Role {
    /// Label for catalog administrators.
    pub const ADMIN: &'static str = "admin";

    /// Label for regular shoppers.
    pub const USER: &'static str = "user";

    /// Maximum label length.
    pub const MAX_LENGTH: usize = 32;

    /// Parse a role label, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`RoleError`] if the label is empty or too long.
    pub fn parse(label: &str) -> Result<Self, RoleError> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(RoleError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(RoleError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// The administrator role.
    #[must_use]
    pub fn admin() -> Self {
        Self(Self::ADMIN.to_owned())
    }

    /// The default shopper role.
    #[must_use]
    pub fn user() -> Self {
        Self(Self::USER.to_owned())
    }

    /// Whether this is the administrator role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0 == Self::ADMIN
    }

    /// Whether the label is one of `allowed`.
    #[must_use]
    pub fn is_one_of(&self, allowed: &[&str]) -> bool {
        allowed.contains(&self.0.as_str())
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::user()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Role {
    type Error = RoleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(&s)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Role {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_user() {
        assert_eq!(Role::default().as_str(), "user");
        assert!(!Role::default().is_admin());
    }

    #[test]
    fn test_admin() {
        assert!(Role::admin().is_admin());
        assert!(Role::parse(" admin ").unwrap().is_admin());
    }

    #[test]
    fn test_free_form_labels_are_allowed() {
        let role = Role::parse("premium").unwrap();
        assert!(role.is_one_of(&["premium", "admin"]));
        assert!(!role.is_one_of(&[Role::ADMIN]));
    }

    #[test]
    fn test_parse_rejects_empty_and_long() {
        assert_eq!(Role::parse("  "), Err(RoleError::Empty));
        assert!(matches!(
            Role::parse(&"x".repeat(40)),
            Err(RoleError::TooLong { .. })
        ));
    }

    #[test]
    fn test_admin_check_is_case_sensitive() {
        assert!(!Role::parse("Admin").unwrap().is_admin());
    }
}
