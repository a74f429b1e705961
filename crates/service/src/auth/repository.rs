use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{AuthUser, Credentials, NewUser};
use super::errors::AuthError;

/// Credential store contract used by the auth service.
///
/// Emails passed in are already normalized. `create` must enforce email
/// uniqueness atomically and fail with `AuthError::DuplicateIdentity`.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError>;
    async fn find_by_email_with_secret(&self, email: &str) -> Result<Option<Credentials>, AuthError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError>;
    async fn create(&self, user: NewUser) -> Result<AuthUser, AuthError>;
}

/// Simple in-memory store for tests, doc examples and benches
pub mod memory {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::{Mutex, MutexGuard};

    #[derive(Default)]
    pub struct InMemoryCredentialStore {
        users: Mutex<HashMap<String, Credentials>>, // key: normalized email
    }

    impl InMemoryCredentialStore {
        fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Credentials>>, AuthError> {
            self.users
                .lock()
                .map_err(|_| AuthError::StoreUnavailable("in-memory store lock poisoned".into()))
        }

        pub fn len(&self) -> usize {
            self.lock().map(|users| users.len()).unwrap_or(0)
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }
    }

    #[async_trait]
    impl CredentialStore for InMemoryCredentialStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
            let users = self.lock()?;
            Ok(users.get(&models::user::normalize_email(email)).map(|c| c.user.clone()))
        }

        async fn find_by_email_with_secret(&self, email: &str) -> Result<Option<Credentials>, AuthError> {
            let users = self.lock()?;
            Ok(users.get(&models::user::normalize_email(email)).cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
            let users = self.lock()?;
            Ok(users.values().find(|c| c.user.id == id).map(|c| c.user.clone()))
        }

        async fn create(&self, user: NewUser) -> Result<AuthUser, AuthError> {
            let key = models::user::normalize_email(&user.email);
            let mut users = self.lock()?;
            if users.contains_key(&key) {
                return Err(AuthError::DuplicateIdentity);
            }
            let now = Utc::now();
            let created = AuthUser {
                id: Uuid::new_v4(),
                name: user.name,
                email: key.clone(),
                role: user.role,
                created_at: now,
                updated_at: now,
            };
            users.insert(key, Credentials { user: created.clone(), password_hash: user.password_hash });
            Ok(created)
        }
    }

}
