use sea_orm::{entity::prelude::*, DatabaseConnection, FromQueryResult, QueryFilter, QuerySelect, Select, Set, SqlErr};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

pub const NAME_MAX_LEN: usize = 128;
pub const EMAIL_MAX_LEN: usize = 255;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Row without the password hash; what default reads return.
#[derive(Clone, Debug, PartialEq, FromQueryResult)]
pub struct PublicModel {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

/// Lowercase and trim an address so it can serve as the identity key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), errors::ModelError> {
    if email.len() > EMAIL_MAX_LEN {
        return Err(errors::ModelError::Validation("email too long".into()));
    }
    let shape_ok = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && domain.split('.').all(|label| !label.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !shape_ok {
        return Err(errors::ModelError::Validation("invalid email".into()));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<(), errors::ModelError> {
    if name.trim().is_empty() {
        return Err(errors::ModelError::Validation("name required".into()));
    }
    if name.chars().count() > NAME_MAX_LEN {
        return Err(errors::ModelError::Validation("name too long".into()));
    }
    Ok(())
}

pub async fn create(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password_hash: &str,
    role: &str,
) -> Result<Model, errors::ModelError> {
    let email = normalize_email(email);
    validate_email(&email)?;
    validate_name(name)?;
    if password_hash.trim().is_empty() {
        return Err(errors::ModelError::Validation("password hash required".into()));
    }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.trim().to_string()),
        email: Set(email),
        password_hash: Set(password_hash.to_string()),
        role: Set(role.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(insert_error)
}

/// Lookup by identity key, hash column excluded.
pub async fn find_public_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<PublicModel>, errors::ModelError> {
    public_columns()
        .filter(Column::Email.eq(normalize_email(email)))
        .into_model::<PublicModel>()
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

pub async fn find_public_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<PublicModel>, errors::ModelError> {
    public_columns()
        .filter(Column::Id.eq(id))
        .into_model::<PublicModel>()
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// Full row including `password_hash`; only the login path should call this.
pub async fn find_by_email_with_secret(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, errors::ModelError> {
    Entity::find()
        .filter(Column::Email.eq(normalize_email(email)))
        .one(db)
        .await
        .map_err(|e| errors::ModelError::Db(e.to_string()))
}

fn public_columns() -> Select<Entity> {
    Entity::find().select_only().columns([
        Column::Id,
        Column::Name,
        Column::Email,
        Column::Role,
        Column::CreatedAt,
        Column::UpdatedAt,
    ])
}

fn insert_error(e: DbErr) -> errors::ModelError {
    let unique = matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        || e.to_string().contains("duplicate key");
    if unique {
        errors::ModelError::Duplicate("email".into())
    } else {
        errors::ModelError::Db(e.to_string())
    }
}
