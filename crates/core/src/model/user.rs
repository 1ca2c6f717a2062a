use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::UserId;

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UserValidationError {
    #[error("username is required")]
    MissingUsername,

    #[error("username must be at most {USERNAME_MAX_LEN} characters")]
    UsernameTooLong,

    #[error("username may contain only letters, digits and @/./+/-/_")]
    InvalidUsername,

    #[error("password is required")]
    MissingPassword,

    #[error("password must contain at least {PASSWORD_MIN_LEN} characters")]
    PasswordTooShort,

    #[error("enter a valid email address")]
    InvalidEmail,
}

/// Validated login name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Validate a username.
    ///
    /// # Errors
    ///
    /// Returns `UserValidationError` when the name is blank, too long, or has
    /// characters outside letters, digits and `@.+-_`.
    pub fn parse(raw: impl Into<String>) -> Result<Self, UserValidationError> {
        let raw = raw.into();
        let name = raw.trim();
        if name.is_empty() {
            return Err(UserValidationError::MissingUsername);
        }
        if name.chars().count() > USERNAME_MAX_LEN {
            return Err(UserValidationError::UsernameTooLong);
        }
        if !name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err(UserValidationError::InvalidUsername);
        }
        Ok(Self(name.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A registered account, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: Username,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

/// Registration form as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Registration that passed validation; the password is still plain text and
/// must be hashed before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub username: Username,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Registration {
    /// # Errors
    ///
    /// Returns the first `UserValidationError` found.
    pub fn validate(self) -> Result<ValidRegistration, UserValidationError> {
        let username = Username::parse(self.username.unwrap_or_default())?;
        let password = self
            .password
            .filter(|p| !p.is_empty())
            .ok_or(UserValidationError::MissingPassword)?;
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(UserValidationError::PasswordTooShort);
        }
        let email = self.email.unwrap_or_default().trim().to_string();
        if !email.is_empty() && !is_plausible_email(&email) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(ValidRegistration {
            username,
            password,
            email,
            first_name: self.first_name.unwrap_or_default().trim().to_string(),
            last_name: self.last_name.unwrap_or_default().trim().to_string(),
        })
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, password: &str) -> Registration {
        Registration {
            username: Some(username.into()),
            password: Some(password.into()),
            ..Registration::default()
        }
    }

    #[test]
    fn accepts_django_style_usernames() {
        let valid = form("ana.maria+test@uni", "long-enough").validate().unwrap();
        assert_eq!(valid.username.as_str(), "ana.maria+test@uni");
        assert_eq!(valid.email, "");
    }

    #[test]
    fn rejects_spaces_in_username() {
        assert_eq!(
            form("ana maria", "long-enough").validate(),
            Err(UserValidationError::InvalidUsername)
        );
    }

    #[test]
    fn rejects_missing_fields() {
        assert_eq!(
            Registration::default().validate(),
            Err(UserValidationError::MissingUsername)
        );
        let no_password = Registration {
            username: Some("ana".into()),
            ..Registration::default()
        };
        assert_eq!(
            no_password.validate(),
            Err(UserValidationError::MissingPassword)
        );
    }

    #[test]
    fn rejects_short_password() {
        assert_eq!(
            form("ana", "short").validate(),
            Err(UserValidationError::PasswordTooShort)
        );
    }

    #[test]
    fn rejects_malformed_email() {
        let mut f = form("ana", "long-enough");
        f.email = Some("not-an-email".into());
        assert_eq!(f.validate(), Err(UserValidationError::InvalidEmail));
    }

    #[test]
    fn username_length_limit() {
        let long = "a".repeat(USERNAME_MAX_LEN + 1);
        assert_eq!(
            Username::parse(long),
            Err(UserValidationError::UsernameTooLong)
        );
    }
}
