use serde::Serialize;

use crate::{
    error::AppError,
    users::{repo::NewUser, repo_types::Gender, repo_types::UserProfile},
    validation::{parse_date, Payload},
};

const ALL_FIELDS_REQUIRED: &str = "All fields are required";

/// Reads registration data from an already validated payload.
///
/// Second pass over the validated fields: each one must still be non-blank
/// once surrounding whitespace is ignored.
pub fn registration_from_payload(p: &Payload) -> Result<NewUser, AppError> {
    let field = |name: &str| {
        p.text(name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::bad_request(ALL_FIELDS_REQUIRED))
    };
    let username = field("username")?;
    let email = field("email")?;
    let fullname = field("fullname")?;
    let password = field("password")?;
    let gender = Gender::parse(&field("gender")?)
        .ok_or_else(|| AppError::bad_request(ALL_FIELDS_REQUIRED))?;
    let dob = parse_date(&field("dob")?)
        .ok_or_else(|| AppError::bad_request(ALL_FIELDS_REQUIRED))?;
    let country = field("country")?;

    Ok(NewUser {
        username: username.to_lowercase(),
        email,
        fullname,
        password,
        gender,
        dob,
        country,
    })
}

/// Login credentials: a handle or an email, plus the password.
#[derive(Debug)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

impl LoginRequest {
    pub fn from_payload(p: &Payload) -> Self {
        Self {
            username: p.non_empty_text("username"),
            email: p.non_empty_text("email"),
            password: p.text("password").unwrap_or_default(),
        }
    }
}

/// Payload returned after a successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: UserProfile,
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body() -> serde_json::Value {
        json!({
            "username": "JohnDoe",
            "email": "j@x.com",
            "fullname": "John Doe",
            "password": "Passw0rd",
            "gender": "male",
            "dob": "1990/05/06",
            "country": "NL"
        })
    }

    #[test]
    fn register_request_lowercases_handle() {
        let user = registration_from_payload(&Payload::from(body())).unwrap();
        assert_eq!(user.username, "johndoe");
        assert_eq!(user.gender, Gender::Male);
        assert_eq!(user.dob.to_string(), "1990-05-06");
    }

    #[test]
    fn register_request_rejects_whitespace_only_fields() {
        let mut b = body();
        b["fullname"] = json!("   ");
        let err = registration_from_payload(&Payload::from(b)).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == ALL_FIELDS_REQUIRED));
    }

    #[test]
    fn login_request_treats_empty_as_absent() {
        let req = LoginRequest::from_payload(&Payload::from(json!({
            "username": "", "email": "a@x.com", "password": "pw"
        })));
        assert_eq!(req.username, None);
        assert_eq!(req.email.as_deref(), Some("a@x.com"));
        assert_eq!(req.password, "pw");
    }
}
