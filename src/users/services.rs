use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::ChangePasswordRequest,
    repo,
    repo_types::{Lookup, ProfileChanges, UserProfile},
    store::UserStore,
};
use crate::{auth::password::verify_password, error::AppError};

pub async fn search(store: &dyn UserStore, lookup: &Lookup) -> Result<UserProfile, AppError> {
    if lookup.is_empty() {
        return Err(AppError::bad_request("email or username required"));
    }
    store
        .find_one(lookup)
        .await?
        .map(|u| u.into_profile())
        .ok_or(AppError::NotFound("user does not exist"))
}

/// Replaces the caller's password after checking the old one. A wrong old
/// password leaves the stored hash untouched.
pub async fn change_password(
    store: &dyn UserStore,
    user_id: Uuid,
    req: ChangePasswordRequest,
) -> Result<(), AppError> {
    let user = store
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::internal("change_password", format!("user {user_id} vanished")))?;

    let ok = verify_password(&req.old_password, &user.password_hash)
        .map_err(|e| AppError::internal("verify_password failed", e))?;
    if !ok {
        warn!(%user_id, "change password with wrong old password");
        return Err(AppError::bad_request("wrong password"));
    }

    if !repo::save_password(store, user_id, &req.new_password).await? {
        return Err(AppError::internal(
            "change_password",
            format!("user {user_id} vanished before save"),
        ));
    }
    info!(%user_id, "password changed");
    Ok(())
}

pub async fn update_profile(
    store: &dyn UserStore,
    user_id: Uuid,
    changes: &ProfileChanges,
) -> Result<UserProfile, AppError> {
    if changes.is_empty() {
        return Err(AppError::bad_request("details expected"));
    }
    let updated = repo::update_profile(store, user_id, changes)
        .await?
        .ok_or_else(|| AppError::internal("update_profile", format!("user {user_id} vanished")))?;
    info!(%user_id, "profile updated");
    Ok(updated.into_profile())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{
        memory::MemoryUserStore,
        repo::{create_user, NewUser},
        repo_types::Gender,
    };
    use time::macros::date;

    async fn seeded() -> (MemoryUserStore, UserProfile) {
        let store = MemoryUserStore::new();
        let rec = create_user(
            &store,
            NewUser {
                username: "alice1".into(),
                email: "a@x.com".into(),
                fullname: "Alice A".into(),
                password: "Passw0rd".into(),
                gender: Gender::Female,
                dob: date!(1990 - 01 - 01),
                country: "NL".into(),
            },
        )
        .await
        .unwrap();
        (store, rec.into_profile())
    }

    #[tokio::test]
    async fn search_finds_by_either_field() {
        let (store, alice) = seeded().await;
        let by_handle = search(&store, &Lookup::new(Some("Alice1".into()), None)).await.unwrap();
        assert_eq!(by_handle, alice);
        let by_email = search(&store, &Lookup::new(None, Some("a@x.com".into()))).await.unwrap();
        assert_eq!(by_email.id, alice.id);

        let err = search(&store, &Lookup::new(Some("bob".into()), None)).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = search(&store, &Lookup::default()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn wrong_old_password_keeps_hash() {
        let (store, alice) = seeded().await;
        let before = store.find_by_id(alice.id).await.unwrap().unwrap().password_hash;

        let err = change_password(
            &store,
            alice.id,
            ChangePasswordRequest {
                old_password: "Wr0ngPass".into(),
                new_password: "N3wPassword".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "wrong password"));

        let after = store.find_by_id(alice.id).await.unwrap().unwrap().password_hash;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn change_password_replaces_hash() {
        let (store, alice) = seeded().await;
        change_password(
            &store,
            alice.id,
            ChangePasswordRequest {
                old_password: "Passw0rd".into(),
                new_password: "N3wPassword".into(),
            },
        )
        .await
        .unwrap();
        let hash = store.find_by_id(alice.id).await.unwrap().unwrap().password_hash;
        assert!(verify_password("N3wPassword", &hash).unwrap());
    }

    #[tokio::test]
    async fn update_profile_email_only() {
        let (store, alice) = seeded().await;
        let changes = ProfileChanges {
            fullname: None,
            email: Some("alice@new.com".into()),
        };
        let updated = update_profile(&store, alice.id, &changes).await.unwrap();
        assert_eq!(updated.email, "alice@new.com");
        assert_eq!(updated.fullname, "Alice A");
    }

    #[tokio::test]
    async fn update_profile_requires_a_field() {
        let (store, alice) = seeded().await;
        let err = update_profile(&store, alice.id, &ProfileChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "details expected"));
    }

    #[tokio::test]
    async fn update_profile_email_taken_is_conflict() {
        let (store, alice) = seeded().await;
        create_user(
            &store,
            NewUser {
                username: "bob".into(),
                email: "b@x.com".into(),
                fullname: "Bob B".into(),
                password: "Passw0rd".into(),
                gender: Gender::Male,
                dob: date!(1985 - 03 - 04),
                country: "BE".into(),
            },
        )
        .await
        .unwrap();
        let changes = ProfileChanges {
            fullname: None,
            email: Some("b@x.com".into()),
        };
        let err = update_profile(&store, alice.id, &changes).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
