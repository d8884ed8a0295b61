//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Newtype for user id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Console role of an user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::User => write!(f, "user"),
        }
    }
}

/// Authenticated user data
///
/// Everything except `last_login_at` is fixed by the identity backend. The last login time is
/// refreshed every time the backend issues or verifies a token for this user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// How user is visible to others.
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Returns copy of the user with the last login time set to `at`
    pub fn logged_in_at(&self, at: DateTime<Utc>) -> Self {
        Self {
            last_login_at: Some(at),
            ..self.clone()
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_eq;
    use serde_json::json;

    fn user() -> User {
        User {
            id: UserId::new("7"),
            email: "someone@example.local".to_owned(),
            name: "Someone".to_owned(),
            role: Role::User,
            created_at: DateTime::from_timestamp(1_768_176_000, 0).unwrap(),
            last_login_at: None,
        }
    }

    #[test]
    fn serialized_with_camel_case_fields() {
        let value = serde_json::to_value(user()).unwrap();
        assert_json_eq!(
            value,
            json!({
                "id": "7",
                "email": "someone@example.local",
                "name": "Someone",
                "role": "user",
                "createdAt": "2026-01-12T00:00:00Z",
            })
        );
    }

    #[test]
    fn last_login_is_optional_on_read() {
        let user: User = serde_json::from_value(json!({
            "id": "1",
            "email": "admin@example.local",
            "name": "Admin",
            "role": "admin",
            "createdAt": "2026-01-12T00:00:00Z",
            "lastLoginAt": "2026-02-01T10:00:00Z",
        }))
        .unwrap();

        assert!(user.is_admin());
        assert_eq!(
            user.last_login_at,
            Some("2026-02-01T10:00:00Z".parse().unwrap())
        );

        let mut without_login = serde_json::to_value(&user).unwrap();
        without_login.as_object_mut().unwrap().remove("lastLoginAt");
        let user: User = serde_json::from_value(without_login).unwrap();
        assert_eq!(user.last_login_at, None);
    }

    #[test]
    fn logged_in_at_only_touches_last_login() {
        let now = Utc::now();
        let logged = user().logged_in_at(now);
        assert_eq!(logged.last_login_at, Some(now));
        assert_eq!(
            User {
                last_login_at: None,
                ..logged
            },
            user()
        );
    }
}
