//! Argon2id password hashing.
//!
//! Every hash carries its own random salt and cost parameters in PHC string
//! form, so verification works even after the configured cost changes. The
//! digest comparison inside `argon2` is constant-time.

use std::sync::Arc;

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString},
    Algorithm, Argon2, Params, Version,
};
use configs::PasswordConfig;
use rand::rngs::OsRng;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PasswordError {
    /// Stored value is not a parseable hash; corrupted data, never produced by `hash`.
    #[error("malformed password hash: {0}")]
    Format(String),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    // Hash of a random throwaway password, verified against when the user does not exist.
    dummy: Arc<str>,
}

impl PasswordHasher {
    pub fn new(cfg: &PasswordConfig) -> Result<Self, PasswordError> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy = hash_with(&argon2, &Uuid::new_v4().to_string())?;
        Ok(Self { argon2, dummy: Arc::from(dummy) })
    }

    /// Salted one-way hash; two calls on the same input give different strings.
    pub fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        hash_with(&self.argon2, plaintext)
    }

    /// `Ok(false)` on mismatch; `Err(Format)` only when `hash` cannot be parsed.
    pub fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::Format(e.to_string()))?;
        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::Format(e.to_string())),
        }
    }

    /// Spend the same work as a real verify without any stored user.
    pub fn verify_dummy(&self, plaintext: &str) -> Result<(), PasswordError> {
        self.verify(plaintext, &self.dummy)?;
        Ok(())
    }
}

fn hash_with(argon2: &Argon2<'static>, plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?
        .to_string();
    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> PasswordHasher {
        PasswordHasher::new(&PasswordConfig { memory_kib: 1024, iterations: 1, parallelism: 1 }).unwrap()
    }

    #[test]
    fn same_input_hashes_differently_and_both_verify() {
        let hasher = light();
        let a = hasher.hash("secret123").unwrap();
        let b = hasher.hash("secret123").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2id$"));
        assert!(hasher.verify("secret123", &a).unwrap());
        assert!(hasher.verify("secret123", &b).unwrap());
    }

    #[test]
    fn different_plaintext_does_not_verify() {
        let hasher = light();
        let h = hasher.hash("secret123").unwrap();
        assert!(!hasher.verify("secret124", &h).unwrap());
        assert!(!hasher.verify("", &h).unwrap());
    }

    #[test]
    fn hash_never_contains_plaintext() {
        let hasher = light();
        let h = hasher.hash("plain-visible-password").unwrap();
        assert!(!h.contains("plain-visible-password"));
    }

    #[test]
    fn malformed_hash_is_format_error() {
        let hasher = light();
        assert!(matches!(hasher.verify("x", "not-a-hash"), Err(PasswordError::Format(_))));
        assert!(matches!(hasher.verify("x", ""), Err(PasswordError::Format(_))));
    }

    #[test]
    fn verifies_hash_made_with_other_cost() {
        let strong = PasswordHasher::new(&PasswordConfig { memory_kib: 2048, iterations: 2, parallelism: 1 }).unwrap();
        let h = strong.hash("secret123").unwrap();
        assert!(light().verify("secret123", &h).unwrap());
    }

    #[test]
    fn dummy_hash_ready_at_construction() {
        let hasher = light();
        let parsed = PasswordHash::new(&hasher.dummy).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert_eq!(parsed.params.get_decimal("m"), Some(1024));
        // clones share the same dummy rather than building their own
        assert!(Arc::ptr_eq(&hasher.dummy, &hasher.clone().dummy));
    }

    #[test]
    fn dummy_verify_succeeds_without_user() {
        let hasher = light();
        hasher.verify_dummy("anything").unwrap();
        hasher.verify_dummy("again").unwrap();
    }

    #[test]
    fn invalid_params_rejected() {
        let res = PasswordHasher::new(&PasswordConfig { memory_kib: 1, iterations: 1, parallelism: 1 });
        assert!(matches!(res, Err(PasswordError::Hash(_))));
    }
}
