use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::repo_types::{Lookup, NewUserRecord, ProfileChanges, UserRecord};

/// Which unique constraint a write ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl UniqueField {
    pub fn as_str(self) -> &'static str {
        match self {
            UniqueField::Username => "username",
            UniqueField::Email => "email",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate {}", .0.as_str())]
    Duplicate(UniqueField),
    #[error("record rejected: {0}")]
    Rejected(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                let field = match db.constraint() {
                    Some(c) if c.contains("email") => UniqueField::Email,
                    _ => UniqueField::Username,
                };
                return StoreError::Duplicate(field);
            }
        }
        StoreError::Backend(e.into())
    }
}

/// Persistence for user records. Lookups are exact-match; implementations
/// must enforce uniqueness of `username` and `email` themselves.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_one(&self, lookup: &Lookup) -> Result<Option<UserRecord>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError>;
    async fn insert(&self, user: NewUserRecord) -> Result<UserRecord, StoreError>;
    /// Applies only the provided fields and returns the post-update record.
    async fn update_fields(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<UserRecord>, StoreError>;
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError>;
}
