use std::sync::{Arc, LazyLock};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use tracing::{debug, info};

use academy_core::model::{Registration, User};
use storage::repository::{NewUserRecord, StorageError, UserRepository};

use crate::Clock;
use crate::error::AccountError;
use crate::tokens::{TokenConfig, TokenPair, TokenType};

/// Registration, password login and bearer token checks.
#[derive(Clone)]
pub struct AccountService {
    clock: Clock,
    users: Arc<dyn UserRepository>,
    tokens: TokenConfig,
}

impl AccountService {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>, tokens: TokenConfig) -> Self {
        Self {
            clock,
            users,
            tokens,
        }
    }

    /// Create an account from a registration form.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Validation` for invalid fields.
    /// Returns `AccountError::UsernameTaken` when the username exists.
    /// Returns `AccountError::Storage` if persistence fails.
    pub async fn register(&self, form: Registration) -> Result<User, AccountError> {
        let valid = form.validate()?;
        let password_hash = hash_password_blocking(valid.password).await?;

        let user = self
            .users
            .insert_user(NewUserRecord {
                username: valid.username,
                email: valid.email,
                first_name: valid.first_name,
                last_name: valid.last_name,
                password_hash,
                date_joined: self.clock.now(),
            })
            .await
            .map_err(|err| match err {
                StorageError::Conflict => AccountError::UsernameTaken,
                other => AccountError::Storage(other),
            })?;

        info!(user_id = %user.id, username = %user.username, "registered user");
        Ok(user)
    }

    /// Exchange credentials for an access/refresh pair.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidCredentials` for an unknown user or a
    /// wrong password.
    pub async fn obtain_tokens(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TokenPair, AccountError> {
        let record = self.users.find_by_username(username.trim()).await?;
        let stored = record.as_ref().map(|r| r.password_hash.clone());
        let verified = verify_password_blocking(password.to_owned(), stored).await;
        let Some(record) = record.filter(|_| verified) else {
            debug!(username, "login rejected");
            return Err(AccountError::InvalidCredentials);
        };

        let now = self.clock.now();
        Ok(TokenPair {
            access: self.tokens.issue(record.user.id, TokenType::Access, now)?,
            refresh: self.tokens.issue(record.user.id, TokenType::Refresh, now)?,
        })
    }

    /// Issue a fresh access token from a refresh token.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidToken` if the token is not a live refresh
    /// token of an existing user.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AccountError> {
        let now = self.clock.now();
        let claims = self.tokens.verify(refresh_token, TokenType::Refresh, now)?;
        let user = self
            .users
            .get_user(claims.user_id()?)
            .await?
            .ok_or(AccountError::InvalidToken)?;
        self.tokens.issue(user.id, TokenType::Access, now)
    }

    /// Resolve a bearer access token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidToken` if the token is invalid, expired,
    /// not an access token, or its user no longer exists.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, AccountError> {
        let claims = self
            .tokens
            .verify(access_token, TokenType::Access, self.clock.now())?;
        self.users
            .get_user(claims.user_id()?)
            .await?
            .ok_or(AccountError::InvalidToken)
    }
}

/// Stand-in hash checked for unknown usernames so every login runs argon2 once.
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("not-a-real-account").unwrap_or_default());

async fn hash_password_blocking(password: String) -> Result<String, AccountError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AccountError::Hashing(e.to_string()))?
}

/// `None` verifies against `DUMMY_HASH` and always fails.
async fn verify_password_blocking(password: String, stored: Option<String>) -> bool {
    tokio::task::spawn_blocking(move || match stored {
        Some(stored) => verify_password(&password, &stored),
        None => {
            verify_password(&password, &DUMMY_HASH);
            false
        }
    })
    .await
    .unwrap_or(false)
}

fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AccountError::Hashing(e.to_string()))
}

fn verify_password(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored)
        .is_ok_and(|hash| Argon2::default().verify_password(password.as_bytes(), &hash).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_core::model::UserValidationError;
    use academy_core::time::fixed_clock;
    use storage::repository::Storage;

    fn service() -> AccountService {
        AccountService::new(
            fixed_clock(),
            Storage::in_memory().users,
            TokenConfig::new("test-secret"),
        )
    }

    fn form(username: &str, password: &str) -> Registration {
        Registration {
            username: Some(username.into()),
            password: Some(password.into()),
            email: Some("me@example.com".into()),
            ..Registration::default()
        }
    }

    #[tokio::test]
    async fn register_login_and_authenticate() {
        let accounts = service();
        let user = accounts.register(form("ana", "correct-horse")).await.unwrap();
        assert_eq!(user.username.as_str(), "ana");

        let pair = accounts.obtain_tokens("ana", "correct-horse").await.unwrap();
        let me = accounts.authenticate(&pair.access).await.unwrap();
        assert_eq!(me.id, user.id);

        let access = accounts.refresh(&pair.refresh).await.unwrap();
        assert_eq!(accounts.authenticate(&access).await.unwrap().id, user.id);
        assert!(matches!(
            accounts.authenticate(&pair.refresh).await,
            Err(AccountError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let accounts = service();
        accounts.register(form("ana", "password1")).await.unwrap();
        let err = accounts.register(form("ana", "password2")).await.unwrap_err();
        assert!(matches!(err, AccountError::UsernameTaken));
        assert_eq!(err.to_string(), "A user with that username already exists.");
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let err = service().register(form("ana", "short")).await.unwrap_err();
        assert!(matches!(
            err,
            AccountError::Validation(UserValidationError::PasswordTooShort)
        ));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let accounts = service();
        accounts.register(form("ana", "password1")).await.unwrap();
        let wrong = accounts.obtain_tokens("ana", "password2").await.unwrap_err();
        let unknown = accounts.obtain_tokens("bob", "password1").await.unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, AccountError::InvalidCredentials));
    }

    #[test]
    fn password_hash_is_phc_string() {
        let hash = hash_password("password1").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("password1", &hash));
        assert!(!verify_password("password2", &hash));
        assert!(!verify_password("password1", "not-a-hash"));
    }

    #[tokio::test]
    async fn unknown_user_is_checked_against_a_real_hash() {
        assert!(DUMMY_HASH.starts_with("$argon2"));
        assert!(!verify_password_blocking("not-a-real-account".into(), None).await);

        let hash = hash_password_blocking("password1".into()).await.unwrap();
        assert!(verify_password_blocking("password1".into(), Some(hash.clone())).await);
        assert!(!verify_password_blocking("password2".into(), Some(hash)).await);
    }
}
