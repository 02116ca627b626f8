use serde::Serialize;

use super::repo_types::{Lookup, ProfileChanges, UserProfile};
use crate::validation::Payload;

pub fn lookup_from_payload(p: &Payload) -> Lookup {
    Lookup::new(p.non_empty_text("username"), p.non_empty_text("email"))
}

/// Empty strings count as "not provided" so they never blank a field.
pub fn changes_from_payload(p: &Payload) -> ProfileChanges {
    ProfileChanges {
        fullname: p.non_empty_text("fullname"),
        email: p.non_empty_text("email"),
    }
}

#[derive(Debug)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn from_payload(p: &Payload) -> Self {
        Self {
            old_password: p.text("oldPassword").unwrap_or_default(),
            new_password: p.text("newPassword").unwrap_or_default(),
        }
    }
}

/// `{ "user": ... }` payload used by search, update and current-user.
#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: UserProfile,
}
