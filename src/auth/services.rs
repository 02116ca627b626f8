use tracing::{error, info, warn};
use uuid::Uuid;

use super::{dto::LoginRequest, jwt::JwtKeys, password::verify_password};
use crate::{
    error::AppError,
    users::{
        repo::{self, NewUser},
        repo_types::{Lookup, UserProfile},
        store::UserStore,
    },
};

/// Shared by "no such user" and "wrong password" so a caller cannot tell
/// which one happened.
pub const LOGIN_REJECTED: &str = "user or password wrong";
pub const UNAUTHORIZED: &str = "Unauthorized request";
pub const INVALID_TOKEN: &str = "Invalid access token";
const DUPLICATE_USER: &str = "username or email already exists";

/// Creates an account. The lookup before the insert only exists to give a
/// friendly conflict; the store's unique constraints are what actually hold.
pub async fn register(store: &dyn UserStore, user: NewUser) -> Result<UserProfile, AppError> {
    let lookup = Lookup::new(Some(user.username.clone()), Some(user.email.clone()));
    if store.find_one(&lookup).await?.is_some() {
        warn!(username = %user.username, "username or email already registered");
        return Err(AppError::Conflict(DUPLICATE_USER));
    }

    let created = repo::create_user(store, user).await?;

    let profile = store
        .find_by_id(created.id)
        .await?
        .map(|u| u.into_profile())
        .ok_or_else(|| {
            AppError::internal("register", format!("user {} missing after insert", created.id))
        })?;

    info!(user_id = %profile.id, username = %profile.username, "user registered");
    Ok(profile)
}

/// Checks credentials and returns the profile together with a fresh token.
pub async fn login(
    store: &dyn UserStore,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<(UserProfile, String), AppError> {
    let lookup = Lookup::new(req.username, req.email);
    if lookup.is_empty() {
        return Err(AppError::bad_request("email or username required"));
    }

    let Some(user) = store.find_one(&lookup).await? else {
        warn!(?lookup, "login unknown user");
        return Err(AppError::NotFound(LOGIN_REJECTED));
    };

    let ok = verify_password(&req.password, &user.password_hash)
        .map_err(|e| AppError::internal("verify_password failed", e))?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::NotFound(LOGIN_REJECTED));
    }

    let token = issue_token(store, keys, user.id).await?;

    let profile = store
        .find_by_id(user.id)
        .await?
        .map(|u| u.into_profile())
        .ok_or_else(|| AppError::internal("login", format!("user {} vanished", user.id)))?;

    info!(user_id = %profile.id, "user logged in");
    Ok((profile, token))
}

/// Signs a session token after confirming the user still exists. Any
/// failure here, a missing user included, is a plain server error.
pub async fn issue_token(
    store: &dyn UserStore,
    keys: &JwtKeys,
    user_id: Uuid,
) -> Result<String, AppError> {
    match store.find_by_id(user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            error!(%user_id, "token requested for unknown user");
            return Err(AppError::Server);
        }
        Err(e) => return Err(AppError::internal("token issuance lookup failed", e)),
    }
    keys.sign(user_id)
        .map_err(|e| AppError::internal("jwt sign failed", e))
}

/// Resolves a presented token to the user it was issued for.
///
/// Signature and expiry failures all read as one "invalid token" error. A
/// valid token whose user no longer resolves is still rejected.
pub async fn authenticate(
    store: &dyn UserStore,
    keys: &JwtKeys,
    token: Option<&str>,
) -> Result<UserProfile, AppError> {
    let token = token.ok_or(AppError::Unauthorized(UNAUTHORIZED))?;

    let claims = keys.verify(token).map_err(|e| {
        warn!(error = %e, "invalid or expired token");
        AppError::Unauthorized(INVALID_TOKEN)
    })?;

    match store.find_by_id(claims.sub).await? {
        Some(user) => Ok(user.into_profile()),
        None => {
            warn!(user_id = %claims.sub, "token for unknown user");
            Err(AppError::Unauthorized(UNAUTHORIZED))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;
    use crate::users::{memory::MemoryUserStore, repo_types::Gender};
    use time::macros::date;

    fn keys() -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "unit-secret".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 5,
        })
    }

    fn alice() -> NewUser {
        NewUser {
            username: "alice1".into(),
            email: "a@x.com".into(),
            fullname: "Alice A".into(),
            password: "Passw0rd".into(),
            gender: Gender::Female,
            dob: date!(1990 - 01 - 01),
            country: "NL".into(),
        }
    }

    fn creds(username: Option<&str>, email: Option<&str>, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.map(Into::into),
            email: email.map(Into::into),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn register_then_duplicate_handle_or_email_conflicts() {
        let store = MemoryUserStore::new();
        let profile = register(&store, alice()).await.unwrap();
        assert_eq!(profile.username, "alice1");

        let mut same_email = alice();
        same_email.username = "alice2".into();
        assert!(matches!(
            register(&store, same_email).await,
            Err(AppError::Conflict(_))
        ));

        let mut same_handle = alice();
        same_handle.email = "other@x.com".into();
        assert!(matches!(
            register(&store, same_handle).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn login_resolves_token_to_same_user() {
        let store = MemoryUserStore::new();
        let keys = keys();
        let registered = register(&store, alice()).await.unwrap();

        let (profile, token) = login(&store, &keys, creds(Some("alice1"), None, "Passw0rd"))
            .await
            .unwrap();
        assert_eq!(profile.id, registered.id);

        let resolved = authenticate(&store, &keys, Some(&token)).await.unwrap();
        assert_eq!(resolved.id, registered.id);
    }

    #[tokio::test]
    async fn login_by_email_and_by_mixed_case_handle() {
        let store = MemoryUserStore::new();
        let keys = keys();
        register(&store, alice()).await.unwrap();
        assert!(login(&store, &keys, creds(None, Some("a@x.com"), "Passw0rd")).await.is_ok());
        assert!(login(&store, &keys, creds(Some("ALICE1"), None, "Passw0rd")).await.is_ok());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let store = MemoryUserStore::new();
        let keys = keys();
        register(&store, alice()).await.unwrap();

        let wrong = login(&store, &keys, creds(Some("alice1"), None, "wrong"))
            .await
            .unwrap_err();
        let missing = login(&store, &keys, creds(Some("nobody"), None, "Passw0rd"))
            .await
            .unwrap_err();

        assert!(matches!(wrong, AppError::NotFound(_)));
        assert!(matches!(missing, AppError::NotFound(_)));
        assert_eq!(wrong.status(), missing.status());
        assert_eq!(wrong.to_string(), missing.to_string());
    }

    #[tokio::test]
    async fn login_without_handle_or_email_is_bad_request() {
        let store = MemoryUserStore::new();
        let err = login(&store, &keys(), creds(None, None, "Passw0rd")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn token_for_removed_user_is_rejected() {
        let store = MemoryUserStore::new();
        let keys = keys();
        let profile = register(&store, alice()).await.unwrap();
        let token = issue_token(&store, &keys, profile.id).await.unwrap();

        // The signature is still good after the record disappears.
        assert!(keys.verify(&token).is_ok());
        store.remove(profile.id).await.unwrap();

        let err = authenticate(&store, &keys, Some(&token)).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(UNAUTHORIZED)));
    }

    #[tokio::test]
    async fn authenticate_rejection_states() {
        let store = MemoryUserStore::new();
        let keys = keys();

        let none = authenticate(&store, &keys, None).await.unwrap_err();
        assert!(matches!(none, AppError::Unauthorized(UNAUTHORIZED)));

        let garbage = authenticate(&store, &keys, Some("garbage")).await.unwrap_err();
        assert!(matches!(garbage, AppError::Unauthorized(INVALID_TOKEN)));

        let foreign = JwtKeys::from_config(&JwtConfig {
            secret: "someone-else".into(),
            issuer: "iss".into(),
            audience: "aud".into(),
            ttl_minutes: 5,
        })
        .sign(Uuid::new_v4())
        .unwrap();
        let err = authenticate(&store, &keys, Some(&foreign)).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(INVALID_TOKEN)));
    }

    #[tokio::test]
    async fn issue_token_collapses_missing_user_and_store_failure() {
        let store = MemoryUserStore::new();
        let keys = keys();
        let missing = issue_token(&store, &keys, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(missing, AppError::Server));

        let profile = register(&store, alice()).await.unwrap();
        store.set_offline(true);
        let offline = issue_token(&store, &keys, profile.id).await.unwrap_err();
        assert!(matches!(offline, AppError::Server));
    }
}
