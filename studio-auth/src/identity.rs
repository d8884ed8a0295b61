//! Identity backend contract

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::user::{User, UserId};

mod mock;

pub use mock::{Latency, MockIdentity};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Malformed token")]
    MalformedToken,
    #[error("User {0} not found")]
    UserNotFound(UserId),
    #[error("Identity service unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Newtype for the opaque access token issued by the identity backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Login form input
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Keep the session across application restarts
    pub remember_me: bool,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            remember_me: false,
        }
    }

    pub fn remember_me(self, remember_me: bool) -> Self {
        Self {
            remember_me,
            ..self
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

/// Successful login result
#[derive(Debug, Clone, PartialEq)]
pub struct AuthResponse {
    pub token: Token,
    pub user: User,
}

/// Remote authentication API
///
/// The session controller depends only on this contract. [`MockIdentity`] simulates the API
/// in-process; a network client would be another implementation picked when composing the
/// application.
pub trait IdentityService: Send + Sync {
    /// Checks credentials issuing a token on success
    fn login(&self, credentials: &Credentials) -> impl Future<Output = Result<AuthResponse>> + Send;

    /// Closes the remote session
    fn logout(&self) -> impl Future<Output = Result<()>> + Send;

    /// Resolves the user a token was issued for
    fn verify_token(&self, token: &Token) -> impl Future<Output = Result<User>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hidden_in_debug() {
        let credentials = Credentials::new("admin@example.local", "secret-password");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("admin@example.local"));
        assert!(!debug.contains("secret-password"));
    }

    #[test]
    fn remember_me_defaults_to_false() {
        let credentials: Credentials =
            serde_json::from_str(r#"{ "email": "a@b.c", "password": "p" }"#).unwrap();
        assert!(!credentials.remember_me);

        let credentials: Credentials =
            serde_json::from_str(r#"{ "email": "a@b.c", "password": "p", "rememberMe": true }"#)
                .unwrap();
        assert_eq!(credentials, Credentials::new("a@b.c", "p").remember_me(true));
    }
}
