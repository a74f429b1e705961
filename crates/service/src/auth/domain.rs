use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authorization role stored on each user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration input. Missing fields deserialize as empty and fail validation.
#[derive(Clone, Default, Deserialize)]
pub struct RegisterInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Login input
#[derive(Clone, Default, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Refresh input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefreshInput {
    #[serde(default)]
    pub refresh_token: String,
}

/// Stored user record without its secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User record plus password hash, as read for login.
#[derive(Clone)]
pub struct Credentials {
    pub user: AuthUser,
    pub password_hash: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Values for a store insert; email is already normalized.
#[derive(Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Public user view returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&AuthUser> for UserView {
    fn from(u: &AuthUser) -> Self {
        Self { id: u.id, name: u.name.clone(), email: u.email.clone(), role: u.role }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Register/login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserView,
}

/// Refresh result: a new access token only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessGrant {
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" employee ".parse::<Role>(), Ok(Role::Employee));
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::Employee);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let input = LoginInput { email: "ann@x.com".into(), password: "secret123".into() };
        assert!(!format!("{input:?}").contains("secret123"));

        let creds = Credentials {
            user: AuthUser {
                id: Uuid::new_v4(),
                name: "Ann".into(),
                email: "ann@x.com".into(),
                role: Role::Employee,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            password_hash: "$argon2id$secret-hash".into(),
        };
        assert!(!format!("{creds:?}").contains("secret-hash"));
    }

    #[test]
    fn session_serializes_flat_without_hash() {
        let session = AuthSession {
            tokens: TokenPair { access_token: "a".into(), refresh_token: "r".into() },
            user: UserView { id: Uuid::nil(), name: "Ann".into(), email: "ann@x.com".into(), role: Role::Admin },
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["access_token"], "a");
        assert_eq!(json["refresh_token"], "r");
        assert_eq!(json["user"]["role"], "admin");
        assert!(json["user"].get("password_hash").is_none());
    }
}
