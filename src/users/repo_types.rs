use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Allowed values for a user's gender.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [&'static str; 3] = ["male", "female", "other"];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// User record as held by the store.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,        // always lowercase
    pub email: String,
    pub fullname: String,
    #[serde(skip_serializing)]
    pub password_hash: String,   // Argon2 PHC string, never exposed
    pub gender: Gender,
    #[serde(with = "iso_date")]
    pub dob: Date,
    pub country: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl UserRecord {
    /// Read projection: everything except the secrets.
    pub fn into_profile(self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username,
            email: self.email,
            fullname: self.fullname,
            gender: self.gender,
            dob: self.dob,
            country: self.country,
            created_at: self.created_at,
        }
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub gender: Gender,
    #[serde(with = "iso_date")]
    pub dob: Date,
    pub country: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields for a record about to be inserted. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub password_hash: String,
    pub gender: Gender,
    pub dob: Date,
    pub country: String,
}

/// Partial profile update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub fullname: Option<String>,
    pub email: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.fullname.is_none() && self.email.is_none()
    }
}

/// Exact-match lookup by handle and/or email; matches if either one does.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lookup {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl Lookup {
    pub fn new(username: Option<String>, email: Option<String>) -> Self {
        Self {
            username: username.map(|u| u.to_lowercase()),
            email,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none()
    }

    pub fn matches(&self, user: &UserRecord) -> bool {
        self.username.as_deref() == Some(user.username.as_str())
            || self.email.as_deref() == Some(user.email.as_str())
    }
}
