use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{Lookup, NewUserRecord, ProfileChanges, UserRecord};
use super::store::{StoreError, UniqueField, UserStore};

/// In-process store used for development and tests. Records are kept in
/// insertion order and carry the same uniqueness constraints as the
/// `users` table.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<Vec<UserRecord>>,
    offline: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with a backend error.
    #[cfg(test)]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    /// Removes a record outright; account deletion is not a service operation.
    #[cfg(test)]
    pub async fn remove(&self, id: Uuid) -> Option<UserRecord> {
        let mut users = self.users.write().await;
        let pos = users.iter().position(|u| u.id == id)?;
        Some(users.remove(pos))
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow::anyhow!("memory store offline")));
        }
        Ok(())
    }
}

fn conflict(
    users: &[UserRecord],
    skip: Option<Uuid>,
    username: Option<&str>,
    email: Option<&str>,
) -> Option<UniqueField> {
    users
        .iter()
        .filter(|u| Some(u.id) != skip)
        .find_map(|u| {
            if username == Some(u.username.as_str()) {
                Some(UniqueField::Username)
            } else if email == Some(u.email.as_str()) {
                Some(UniqueField::Email)
            } else {
                None
            }
        })
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_one(&self, lookup: &Lookup) -> Result<Option<UserRecord>, StoreError> {
        self.ensure_online()?;
        let users = self.users.read().await;
        Ok(users.iter().find(|u| lookup.matches(u)).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        self.ensure_online()?;
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert(&self, user: NewUserRecord) -> Result<UserRecord, StoreError> {
        self.ensure_online()?;
        let mut users = self.users.write().await;
        if let Some(field) = conflict(&users, None, Some(&user.username), Some(&user.email)) {
            return Err(StoreError::Duplicate(field));
        }
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            fullname: user.fullname,
            password_hash: user.password_hash,
            gender: user.gender,
            dob: user.dob,
            country: user.country,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(record.clone());
        Ok(record)
    }

    async fn update_fields(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<UserRecord>, StoreError> {
        self.ensure_online()?;
        let mut users = self.users.write().await;
        if let Some(field) = conflict(&users, Some(id), None, changes.email.as_deref()) {
            return Err(StoreError::Duplicate(field));
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(fullname) = &changes.fullname {
            user.fullname = fullname.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        Ok(Some(user.clone()))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        self.ensure_online()?;
        let mut users = self.users.write().await;
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
