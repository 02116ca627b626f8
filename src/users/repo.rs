//! Model-level writes on top of a [`UserStore`].
//!
//! Password hashing happens here, so callers hand over plaintext and the
//! store only ever sees the hash. `create_user` and `update_profile` run the
//! record checks before writing; `save_password` writes without them.

use time::{Date, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::repo_types::{Gender, NewUserRecord, ProfileChanges, UserRecord};
use super::store::{StoreError, UserStore};
use crate::auth::password::hash_password;
use crate::validation::{is_alphanumeric, is_valid_email};

/// Plaintext registration data, already validated by the request layer.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub password: String,
    pub gender: Gender,
    pub dob: Date,
    pub country: String,
}

fn reject(reason: &str) -> StoreError {
    StoreError::Rejected(reason.to_string())
}

fn check_email(email: &str) -> Result<(), StoreError> {
    if !is_valid_email(email) {
        return Err(reject("email is not a valid address"));
    }
    Ok(())
}

fn check_fullname(fullname: &str) -> Result<(), StoreError> {
    if fullname.trim().is_empty() {
        return Err(reject("fullname is required"));
    }
    Ok(())
}

fn check_new_user(user: &NewUser) -> Result<(), StoreError> {
    if !is_alphanumeric(&user.username) || user.username != user.username.to_lowercase() {
        return Err(reject("username must be lowercase alphanumeric"));
    }
    check_email(&user.email)?;
    check_fullname(&user.fullname)?;
    if user.country.trim().is_empty() {
        return Err(reject("country is required"));
    }
    if user.dob.midnight().assume_utc() >= OffsetDateTime::now_utc() {
        return Err(reject("dob must be in the past"));
    }
    Ok(())
}

fn check_changes(changes: &ProfileChanges) -> Result<(), StoreError> {
    if let Some(email) = &changes.email {
        check_email(email)?;
    }
    if let Some(fullname) = &changes.fullname {
        check_fullname(fullname)?;
    }
    Ok(())
}

pub async fn create_user(store: &dyn UserStore, user: NewUser) -> Result<UserRecord, StoreError> {
    check_new_user(&user)?;
    let password_hash = hash_password(&user.password)?;
    let record = store
        .insert(NewUserRecord {
            username: user.username,
            email: user.email,
            fullname: user.fullname,
            password_hash,
            gender: user.gender,
            dob: user.dob,
            country: user.country,
        })
        .await?;
    debug!(user_id = %record.id, "user record inserted");
    Ok(record)
}

pub async fn update_profile(
    store: &dyn UserStore,
    id: Uuid,
    changes: &ProfileChanges,
) -> Result<Option<UserRecord>, StoreError> {
    check_changes(changes)?;
    store.update_fields(id, changes).await
}

/// Re-hashes and stores a new password. The record checks are skipped on
/// this path; the new password was already held to the strength policy.
pub async fn save_password(store: &dyn UserStore, id: Uuid, plain: &str) -> Result<bool, StoreError> {
    let password_hash = hash_password(plain)?;
    store.set_password_hash(id, &password_hash).await
}
