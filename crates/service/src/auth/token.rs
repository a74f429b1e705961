//! Access and refresh token issuing and verification.
//!
//! Both classes are HS256 JWTs carrying only the subject id, a token-class
//! tag, a random `jti` and `iat`/`exp`. Each class has its own secret and
//! lifetime. `jsonwebtoken::decode` checks the signature before any claim is
//! deserialized; expiry and class are checked afterwards on the verified
//! claims.

use chrono::{DateTime, Duration, Utc};
use configs::AuthConfig;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("malformed token: {0}")]
    Malformed(String),
    #[error("token class mismatch")]
    WrongKind,
    #[error("token subject no longer exists")]
    SubjectNotFound,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub token_type: TokenKind,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl SigningKeys {
    fn new(secret: &str, ttl_secs: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs,
        }
    }
}

pub struct TokenIssuer {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(cfg: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // exp is compared by hand so that `now == exp` already counts as expired
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            access: SigningKeys::new(&cfg.access_secret, cfg.access_ttl_secs),
            refresh: SigningKeys::new(&cfg.refresh_secret, cfg.refresh_ttl_secs),
            validation,
        }
    }

    pub fn issue_access(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(TokenKind::Access, user_id, Utc::now())
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(TokenKind::Refresh, user_id, Utc::now())
    }

    /// Sign a token as if issued at `issued_at`; expiry is `issued_at + ttl` for the class.
    pub fn issue_at(&self, kind: TokenKind, user_id: Uuid, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let keys = self.keys(kind);
        let exp = Duration::try_seconds(keys.ttl_secs)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or_else(|| TokenError::Encoding(format!("token lifetime {}s out of range", keys.ttl_secs)))?;
        let claims = Claims {
            sub: user_id.to_string(),
            token_type: kind,
            jti: Uuid::new_v4().to_string(),
            iat: issued_at.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn verify_access(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify(TokenKind::Access, token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify(TokenKind::Refresh, token)
    }

    fn verify(&self, kind: TokenKind, token: &str) -> Result<Uuid, TokenError> {
        let data = decode::<Claims>(token, &self.keys(kind).decoding, &self.validation).map_err(classify)?;
        let claims = data.claims;
        if claims.token_type != kind {
            return Err(TokenError::WrongKind);
        }
        if Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Uuid::parse_str(&claims.sub).map_err(|e| TokenError::Malformed(e.to_string()))
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}

fn classify(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed(e.to_string()),
    }
}
