//! Bearer tokens.
//!
//! HS256 JWTs signed with the server's `EMPORIUM_JWT_SECRET`. A token is valid
//! for one hour and carries the account id, role and email.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use emporium_core::{AccountId, Email, Role};

use super::AuthError;
use crate::models::Account;

/// Token lifetime in seconds.
pub const TOKEN_TTL_SECONDS: i64 = 60 * 60;

/// JWT claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: AccountId,
    pub role: Role,
    pub email: Email,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Claims for `account`, issued now.
    #[must_use]
    pub fn for_account(account: &Account) -> Self {
        let iat = Utc::now().timestamp();
        Self {
            sub: account.id,
            role: account.role.clone(),
            email: account.email.clone(),
            iat,
            exp: iat + TOKEN_TTL_SECONDS,
        }
    }
}

/// Signing and verification keys derived from the JWT secret.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Sign `claims`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if encoding fails.
    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(AuthError::Token)
    }

    /// Verify signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, forged or
    /// expired token.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected bearer token");
                AuthError::InvalidToken
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> TokenKeys {
        TokenKeys::new(&SecretString::from(secret.to_string()))
    }

    fn claims() -> Claims {
        let iat = Utc::now().timestamp();
        Claims {
            sub: AccountId::generate(),
            role: Role::admin(),
            email: Email::parse("root@example.com").unwrap(),
            iat,
            exp: iat + TOKEN_TTL_SECONDS,
        }
    }

    #[test]
    fn test_issued_token_verifies() {
        let keys = keys("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let claims = claims();
        let token = keys.issue(&claims).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), claims);
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let token = keys("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%")
            .issue(&claims())
            .unwrap();
        let other = keys("Zq8!vR2#tY6&uI0*oP4^aS9%dF3$gH7@");
        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let keys = keys("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        let mut claims = claims();
        claims.iat -= 3 * TOKEN_TTL_SECONDS;
        claims.exp = claims.iat + TOKEN_TTL_SECONDS;
        let token = keys.issue(&claims).unwrap();
        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let keys = keys("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%");
        assert!(matches!(keys.verify("not.a.jwt"), Err(AuthError::InvalidToken)));
    }
}
