//! HS256 access/refresh tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use academy_core::model::UserId;

use crate::error::AccountError;

pub const DEFAULT_ACCESS_TTL_MINUTES: i64 = 30;
pub const DEFAULT_REFRESH_TTL_DAYS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    /// Parse the subject back into a user id.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidToken` when `sub` is not a numeric id.
    pub fn user_id(&self) -> Result<UserId, AccountError> {
        self.sub.parse().map_err(|_| AccountError::InvalidToken)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signing secret and token lifetimes.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenConfig {
    #[must_use]
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
            access_ttl: Duration::minutes(DEFAULT_ACCESS_TTL_MINUTES),
            refresh_ttl: Duration::days(DEFAULT_REFRESH_TTL_DAYS),
        }
    }

    #[must_use]
    pub fn with_ttls(mut self, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        self.access_ttl = access_ttl;
        self.refresh_ttl = refresh_ttl;
        self
    }

    /// Sign a token of the given type for `user`, issued at `now`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Encoding` if signing fails.
    pub fn issue(
        &self,
        user: UserId,
        token_type: TokenType,
        now: DateTime<Utc>,
    ) -> Result<String, AccountError> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user.to_string(),
            token_type,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AccountError::Encoding(e.to_string()))
    }

    /// Check signature, type and expiry against `now`.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidToken` for any malformed, foreign,
    /// expired or wrongly typed token.
    pub fn verify(
        &self,
        token: &str,
        expected: TokenType,
        now: DateTime<Utc>,
    ) -> Result<Claims, AccountError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the service clock below.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let claims = decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map_err(|_| AccountError::InvalidToken)?
            .claims;

        if claims.token_type != expected || claims.exp <= now.timestamp() {
            return Err(AccountError::InvalidToken);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_core::time::fixed_now;

    #[test]
    fn access_token_roundtrips() {
        let config = TokenConfig::new("secret");
        let token = config
            .issue(UserId::new(7), TokenType::Access, fixed_now())
            .unwrap();
        let claims = config.verify(&token, TokenType::Access, fixed_now()).unwrap();
        assert_eq!(claims.user_id().unwrap(), UserId::new(7));
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let config = TokenConfig::new("secret");
        let token = config
            .issue(UserId::new(7), TokenType::Refresh, fixed_now())
            .unwrap();
        assert!(matches!(
            config.verify(&token, TokenType::Access, fixed_now()),
            Err(AccountError::InvalidToken)
        ));
        assert!(config.verify(&token, TokenType::Refresh, fixed_now()).is_ok());
    }

    #[test]
    fn expired_and_foreign_tokens_are_rejected() {
        let config = TokenConfig::new("secret");
        let token = config
            .issue(UserId::new(1), TokenType::Access, fixed_now())
            .unwrap();
        let later = fixed_now() + Duration::minutes(31);
        assert!(config.verify(&token, TokenType::Access, later).is_err());

        let other = TokenConfig::new("other-secret");
        assert!(other.verify(&token, TokenType::Access, fixed_now()).is_err());
        assert!(config.verify("not.a.jwt", TokenType::Access, fixed_now()).is_err());
    }
}
