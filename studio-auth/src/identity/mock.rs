//! In-process identity backend with a fixed set of accounts

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use derivative::Derivative;
use regex::Regex;
use tracing::{info, warn};

use super::{AuthResponse, Credentials, Error, IdentityService, Result, Token};
use crate::user::{Role, User, UserId};

/// Extracts user id from the mock token. Not anchored: anything around the pattern is ignored.
static TOKEN_USER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"mock_token_(\d+)_").expect("token pattern is valid"));

/// Time when the builtin accounts were created, 2026-01-12T00:00:00Z
const BUILTIN_CREATED_AT: i64 = 1_768_176_000;

/// Artificial delays of the remote calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Derivative)]
#[derivative(Default)]
pub struct Latency {
    #[derivative(Default(value = "Duration::from_millis(500)"))]
    pub login: Duration,
    #[derivative(Default(value = "Duration::from_millis(200)"))]
    pub logout: Duration,
    #[derivative(Default(value = "Duration::from_millis(300)"))]
    pub verify: Duration,
}

impl Latency {
    /// Immediate responses
    pub fn none() -> Self {
        Self {
            login: Duration::ZERO,
            logout: Duration::ZERO,
            verify: Duration::ZERO,
        }
    }
}

/// Known account: public user data and the password it logs in with
#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

/// Simulated identity API
///
/// Tokens are `mock_token_{user_id}_{epoch_millis}` and carry no security at all - anyone able to
/// guess an user id can forge one.
#[derive(Debug, Clone)]
pub struct MockIdentity {
    accounts: Vec<Account>,
    latency: Latency,
}

impl MockIdentity {
    /// Identity service with builtin administrator and regular user accounts
    pub fn new(latency: Latency) -> Self {
        let created_at = DateTime::from_timestamp(BUILTIN_CREATED_AT, 0).unwrap_or_default();

        let accounts = vec![
            Account {
                user: User {
                    id: UserId::new("1"),
                    email: "admin@aiagent-studio-x.local".to_owned(),
                    name: "Administrator".to_owned(),
                    role: Role::Admin,
                    created_at,
                    last_login_at: None,
                },
                password: "DevAdmin2026!".to_owned(),
            },
            Account {
                user: User {
                    id: UserId::new("2"),
                    email: "testuser@aiagent-studio-x.local".to_owned(),
                    name: "Test User".to_owned(),
                    role: Role::User,
                    created_at,
                    last_login_at: None,
                },
                password: "TestUser2026!".to_owned(),
            },
        ];

        Self { accounts, latency }
    }

    /// Users known to the service
    pub fn users(&self) -> impl Iterator<Item = &User> {
        self.accounts.iter().map(|account| &account.user)
    }

    fn issue_token(user_id: &UserId, at: DateTime<Utc>) -> Token {
        Token::new(format!("mock_token_{user_id}_{}", at.timestamp_millis()))
    }
}

impl Default for MockIdentity {
    fn default() -> Self {
        Self::new(Latency::default())
    }
}

impl IdentityService for MockIdentity {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        info!(email = %credentials.email, "Login attempt");
        tokio::time::sleep(self.latency.login).await;

        let Some(account) = self.accounts.iter().find(|account| {
            account.user.email == credentials.email && account.password == credentials.password
        }) else {
            warn!(email = %credentials.email, "Login failed: invalid credentials");
            return Err(Error::InvalidCredentials);
        };

        let now = Utc::now();
        let token = Self::issue_token(&account.user.id, now);
        info!(user_id = %account.user.id, "Login successful");

        Ok(AuthResponse {
            token,
            user: account.user.logged_in_at(now),
        })
    }

    async fn logout(&self) -> Result<()> {
        info!("Logout");
        tokio::time::sleep(self.latency.logout).await;
        Ok(())
    }

    async fn verify_token(&self, token: &Token) -> Result<User> {
        info!("Verify token");
        tokio::time::sleep(self.latency.verify).await;

        let Some(captures) = TOKEN_USER_ID.captures(token.as_str()) else {
            warn!("Token verification failed: invalid token format");
            return Err(Error::MalformedToken);
        };
        let user_id = UserId::new(&captures[1]);

        let Some(account) = self.accounts.iter().find(|account| account.user.id == user_id) else {
            warn!(%user_id, "Token verification failed: user not found");
            return Err(Error::UserNotFound(user_id));
        };

        info!(%user_id, "Token verified");
        Ok(account.user.logged_in_at(Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const ADMIN: (&str, &str) = ("admin@aiagent-studio-x.local", "DevAdmin2026!");
    const USER: (&str, &str) = ("testuser@aiagent-studio-x.local", "TestUser2026!");

    #[tokio::test(start_paused = true)]
    async fn login_with_valid_credentials() {
        let identity = MockIdentity::default();

        for ((email, password), id) in [(ADMIN, "1"), (USER, "2")] {
            let before = Utc::now();
            let AuthResponse { token, user } = identity
                .login(&Credentials::new(email, password))
                .await
                .unwrap();

            assert_eq!(user.id, UserId::new(id));
            assert_eq!(user.email, email);
            assert!(user.last_login_at.unwrap() >= before);
            assert!(token.as_str().starts_with(&format!("mock_token_{id}_")));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn login_with_invalid_credentials() {
        let identity = MockIdentity::default();

        let attempts = [
            (ADMIN.0, USER.1),
            (USER.0, ADMIN.1),
            ("nobody@aiagent-studio-x.local", ADMIN.1),
            ("ADMIN@aiagent-studio-x.local", ADMIN.1),
            (ADMIN.0, ""),
            ("", ""),
        ];

        for (email, password) in attempts {
            let err = identity
                .login(&Credentials::new(email, password))
                .await
                .unwrap_err();
            assert_eq!(err, Error::InvalidCredentials);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn calls_take_configured_time() {
        let identity = MockIdentity::default();
        let started = tokio::time::Instant::now();

        let AuthResponse { token, .. } = identity
            .login(&Credentials::new(ADMIN.0, ADMIN.1))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));

        let started = tokio::time::Instant::now();
        identity.verify_token(&token).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(300));

        // Rejected tokens are delayed as well
        let started = tokio::time::Instant::now();
        identity.verify_token(&Token::new("fake")).await.unwrap_err();
        assert!(started.elapsed() >= Duration::from_millis(300));

        let started = tokio::time::Instant::now();
        identity.logout().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test(start_paused = true)]
    async fn verify_issued_token() {
        let identity = MockIdentity::new(Latency::none());
        let AuthResponse { token, user } = identity
            .login(&Credentials::new(USER.0, USER.1))
            .await
            .unwrap();

        let verified = identity.verify_token(&token).await.unwrap();
        assert_eq!(verified.id, user.id);
        assert!(verified.last_login_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn verify_malformed_token() {
        let identity = MockIdentity::new(Latency::none());

        for token in ["", "fake_token", "mock_token_", "mock_token_abc_1", "mock_token_1"] {
            assert_matches!(
                identity.verify_token(&Token::new(token)).await,
                Err(Error::MalformedToken)
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn verify_token_of_unknown_user() {
        let identity = MockIdentity::new(Latency::none());

        assert_matches!(
            identity.verify_token(&Token::new("mock_token_99_1700000000000")).await,
            Err(Error::UserNotFound(id)) if id == UserId::new("99")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn verify_ignores_surrounding_text() {
        let identity = MockIdentity::new(Latency::none());

        let user = identity
            .verify_token(&Token::new("prefix-mock_token_2_garbage"))
            .await
            .unwrap();
        assert_eq!(user.id, UserId::new("2"));
    }

    #[test]
    fn builtin_users() {
        let identity = MockIdentity::default();
        let users: Vec<_> = identity.users().collect();

        assert_eq!(users.len(), 2);
        assert!(users[0].is_admin());
        assert_eq!(users[1].role, Role::User);
        assert_eq!(
            users[0].created_at,
            "2026-01-12T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }
}
