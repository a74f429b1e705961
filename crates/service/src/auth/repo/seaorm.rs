use chrono::Utc;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::domain::{AuthUser, Credentials, NewUser, Role};
use crate::auth::errors::AuthError;
use crate::auth::repository::CredentialStore;
use models::user::{self, PublicModel};

/// Postgres-backed store; the unique index on `user.email` serializes concurrent inserts.
pub struct SeaOrmCredentialStore {
    pub db: DatabaseConnection,
}

fn parse_role(raw: &str) -> Result<Role, AuthError> {
    raw.parse::<Role>().map_err(AuthError::StoreUnavailable)
}

fn from_public(u: PublicModel) -> Result<AuthUser, AuthError> {
    Ok(AuthUser {
        id: u.id,
        name: u.name,
        email: u.email,
        role: parse_role(&u.role)?,
        created_at: u.created_at.with_timezone(&Utc),
        updated_at: u.updated_at.with_timezone(&Utc),
    })
}

fn from_full(u: user::Model) -> Result<Credentials, AuthError> {
    Ok(Credentials {
        user: AuthUser {
            id: u.id,
            name: u.name,
            email: u.email,
            role: parse_role(&u.role)?,
            created_at: u.created_at.with_timezone(&Utc),
            updated_at: u.updated_at.with_timezone(&Utc),
        },
        password_hash: u.password_hash,
    })
}

#[async_trait::async_trait]
impl CredentialStore for SeaOrmCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthError> {
        user::find_public_by_email(&self.db, email).await?.map(from_public).transpose()
    }

    async fn find_by_email_with_secret(&self, email: &str) -> Result<Option<Credentials>, AuthError> {
        user::find_by_email_with_secret(&self.db, email).await?.map(from_full).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthError> {
        user::find_public_by_id(&self.db, id).await?.map(from_public).transpose()
    }

    async fn create(&self, new_user: NewUser) -> Result<AuthUser, AuthError> {
        let created = user::create(
            &self.db,
            &new_user.name,
            &new_user.email,
            &new_user.password_hash,
            new_user.role.as_str(),
        )
        .await?;
        Ok(from_full(created)?.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    fn row(role: &str) -> user::Model {
        let now = Utc::now().into();
        user::Model {
            id: Uuid::new_v4(),
            name: "Ann".into(),
            email: "ann@x.com".into(),
            password_hash: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdHNhbHQ$aGFzaGhhc2g".into(),
            role: role.into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn with_secret_read_carries_hash() {
        let r = row("admin");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![r.clone()]])
            .into_connection();
        let store = SeaOrmCredentialStore { db };
        let creds = store.find_by_email_with_secret("Ann@X.com").await.unwrap().unwrap();
        assert_eq!(creds.password_hash, r.password_hash);
        assert_eq!(creds.user.role, Role::Admin);
    }

    #[tokio::test]
    async fn default_read_maps_public_columns() {
        let r = row("employee");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![r.clone()]])
            .into_connection();
        let store = SeaOrmCredentialStore { db };
        let user = store.find_by_id(r.id).await.unwrap().unwrap();
        assert_eq!(user.id, r.id);
        assert_eq!(user.role, Role::Employee);
    }

    #[tokio::test]
    async fn unique_violation_is_duplicate_identity() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom(
                "duplicate key value violates unique constraint \"user_email_key\"".into(),
            )])
            .into_connection();
        let store = SeaOrmCredentialStore { db };
        let err = store
            .create(NewUser { name: "Ann".into(), email: "ann@x.com".into(), password_hash: "h".into(), role: Role::Employee })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::DuplicateIdentity));
    }

    #[tokio::test]
    async fn db_failure_is_store_unavailable() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();
        let store = SeaOrmCredentialStore { db };
        let err = store.find_by_email("ann@x.com").await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
    }

    #[tokio::test]
    async fn unknown_role_in_row_is_store_fault() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![row("superuser")]])
            .into_connection();
        let store = SeaOrmCredentialStore { db };
        let err = store.find_by_email("ann@x.com").await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable(_)));
    }
}
