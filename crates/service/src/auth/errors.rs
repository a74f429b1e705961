use thiserror::Error;

use super::password::PasswordError;
use super::token::TokenError;

/// Business errors for auth workflows
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("user already exists")]
    DuplicateIdentity,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized: {0}")]
    Unauthorized(TokenError),
    #[error("credential store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("stored password hash is malformed: {0}")]
    HashFormat(String),
    #[error("hashing error: {0}")]
    Hashing(String),
    #[error("token issue error: {0}")]
    TokenIssue(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::DuplicateIdentity => 1002,
            AuthError::InvalidCredentials => 1003,
            AuthError::Unauthorized(_) => 1004,
            AuthError::HashFormat(_) => 1101,
            AuthError::Hashing(_) => 1102,
            AuthError::TokenIssue(_) => 1103,
            AuthError::StoreUnavailable(_) => 1200,
        }
    }

    /// Faults the caller cannot fix; reported as a generic server error.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::StoreUnavailable(_)
                | AuthError::HashFormat(_)
                | AuthError::Hashing(_)
                | AuthError::TokenIssue(_)
        )
    }

    /// Message safe to hand to a caller: never carries hashes, secrets or store detail.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Validation(msg) => format!("validation failed: {msg}"),
            AuthError::DuplicateIdentity => "user already exists".to_string(),
            AuthError::InvalidCredentials => "invalid credentials".to_string(),
            AuthError::Unauthorized(TokenError::Expired) => "token expired".to_string(),
            AuthError::Unauthorized(_) => "unauthorized".to_string(),
            _ => "internal server error".to_string(),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Encoding(msg) => AuthError::TokenIssue(msg),
            other => AuthError::Unauthorized(other),
        }
    }
}

impl From<PasswordError> for AuthError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::Format(msg) => AuthError::HashFormat(msg),
            PasswordError::Hash(msg) => AuthError::Hashing(msg),
        }
    }
}

impl From<models::errors::ModelError> for AuthError {
    fn from(e: models::errors::ModelError) -> Self {
        use models::errors::ModelError;
        match e {
            ModelError::Validation(msg) => AuthError::Validation(msg),
            ModelError::Duplicate(_) => AuthError::DuplicateIdentity,
            ModelError::Db(msg) => AuthError::StoreUnavailable(msg),
        }
    }
}
