//! Declarative request validation.
//!
//! Each operation owns a static [`RuleSet`]: per field, an ordered list of
//! checks with the message reported when the check fails, plus an optional
//! "at least one of" rule across fields. Every check of every present field
//! runs, so callers get the full list of failures in one response, and nothing
//! is normalized before the whole set has passed.

pub mod rules;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use time::{Date, Month, OffsetDateTime};

use crate::error::AppError;

/// A single predicate a field value must satisfy.
#[derive(Debug, Clone, Copy)]
pub enum Check {
    NotEmpty,
    Alphanumeric,
    Email,
    IsString,
    StrongPassword,
    OneOf(&'static [&'static str]),
    Date,
    PastDate,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub check: Check,
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub field: &'static str,
    /// Optional fields are skipped when the key is absent from the body.
    pub optional: bool,
    pub rules: &'static [Rule],
}

/// Cross-field rule: at least one of `fields` must be truthy.
#[derive(Debug, Clone, Copy)]
pub struct RequireAny {
    pub fields: &'static [&'static str],
    pub message: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct RuleSet {
    pub fields: &'static [FieldRules],
    pub require_any: Option<RequireAny>,
}

/// One violated rule. `field` is absent for cross-field rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    pub message: &'static str,
}

impl RuleSet {
    /// Runs every rule against `payload`. `now` anchors the past-date check.
    pub fn check(&self, payload: &Payload, now: OffsetDateTime) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        for entry in self.fields {
            let value = payload.get(entry.field);
            if entry.optional && value.is_none() {
                continue;
            }
            for rule in entry.rules {
                if !rule.check.passes(value, now) {
                    errors.push(FieldError {
                        field: Some(entry.field),
                        message: rule.message,
                    });
                }
            }
        }
        if let Some(any) = &self.require_any {
            if !any.fields.iter().any(|f| payload.is_truthy(f)) {
                errors.push(FieldError {
                    field: None,
                    message: any.message,
                });
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl RuleSet {
    /// Checks a request body against the set at the current instant and
    /// hands the payload back once it passes.
    pub fn validate(&self, body: Value) -> Result<Payload, AppError> {
        let payload = Payload::from(body);
        self.check(&payload, OffsetDateTime::now_utc())
            .map_err(AppError::Validation)?;
        Ok(payload)
    }
}

impl Check {
    fn passes(self, value: Option<&Value>, now: OffsetDateTime) -> bool {
        let text = value.map(value_text).unwrap_or_default();
        match self {
            Check::NotEmpty => !text.is_empty(),
            Check::Alphanumeric => is_alphanumeric(&text),
            Check::Email => is_valid_email(&text),
            Check::IsString => matches!(value, Some(Value::String(_))),
            Check::StrongPassword => is_strong_password(&text),
            Check::OneOf(allowed) => allowed.contains(&text.as_str()),
            Check::Date => parse_date(&text).is_some(),
            // An unreadable date is reported by `Check::Date`, not here.
            Check::PastDate => match parse_date(&text) {
                Some(date) => date.midnight().assume_utc() < now,
                None => true,
            },
        }
    }
}

/// Request body as seen by the validator: a flat JSON object.
#[derive(Debug, Clone, Default)]
pub struct Payload(Map<String, Value>);

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        match v {
            Value::Object(map) => Payload(map),
            _ => Payload::default(),
        }
    }
}

impl Payload {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String form of a present, non-null field.
    pub fn text(&self, field: &str) -> Option<String> {
        match self.0.get(field) {
            None | Some(Value::Null) => None,
            Some(v) => Some(value_text(v)),
        }
    }

    /// Like [`Payload::text`] but treats an empty string as not provided.
    pub fn non_empty_text(&self, field: &str) -> Option<String> {
        self.text(field).filter(|s| !s.is_empty())
    }

    pub fn is_truthy(&self, field: &str) -> bool {
        match self.0.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Number(n)) => n.as_f64().map_or(true, |f| f != 0.0),
            Some(_) => true,
        }
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_alphanumeric(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// At least 6 characters with one ASCII uppercase, one ASCII lowercase and
/// one digit. Symbols are allowed but not required.
pub(crate) fn is_strong_password(s: &str) -> bool {
    s.chars().count() >= 6
        && s.chars().any(|c| c.is_ascii_uppercase())
        && s.chars().any(|c| c.is_ascii_lowercase())
        && s.chars().any(|c| c.is_ascii_digit())
}

/// Parses `YYYY-MM-DD` or `YYYY/MM/DD` (month and day may be one digit).
pub fn parse_date(s: &str) -> Option<Date> {
    let delim = if s.contains('-') { '-' } else { '/' };
    let mut parts = s.split(delim);
    let (y, m, d) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some()
        || y.len() != 4
        || !(1..=2).contains(&m.len())
        || !(1..=2).contains(&d.len())
        || ![y, m, d].iter().all(|p| p.chars().all(|c| c.is_ascii_digit()))
    {
        return None;
    }
    let month = Month::try_from(m.parse::<u8>().ok()?).ok()?;
    Date::from_calendar_date(y.parse().ok()?, month, d.parse().ok()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::{date, datetime};

    static SAMPLE: RuleSet = RuleSet {
        fields: &[
            FieldRules {
                field: "name",
                optional: false,
                rules: &[
                    Rule { check: Check::NotEmpty, message: "name empty" },
                    Rule { check: Check::Alphanumeric, message: "name alnum" },
                ],
            },
            FieldRules {
                field: "mail",
                optional: true,
                rules: &[Rule { check: Check::Email, message: "mail bad" }],
            },
        ],
        require_any: Some(RequireAny { fields: &["name", "mail"], message: "need one" }),
    };

    fn now() -> OffsetDateTime {
        datetime!(2024-06-15 10:30 UTC)
    }

    #[test]
    fn collects_every_failure_in_table_order() {
        let errs = SAMPLE.check(&Payload::from(json!({ "mail": "" })), now()).unwrap_err();
        let messages: Vec<_> = errs.iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["name empty", "name alnum", "mail bad", "need one"]);
        assert_eq!(errs[0].field, Some("name"));
        assert_eq!(errs[3].field, None);
    }

    #[test]
    fn optional_field_skipped_only_when_absent() {
        assert!(SAMPLE.check(&Payload::from(json!({ "name": "bob" })), now()).is_ok());
        let errs = SAMPLE
            .check(&Payload::from(json!({ "name": "bob", "mail": null })), now())
            .unwrap_err();
        assert_eq!(errs, vec![FieldError { field: Some("mail"), message: "mail bad" }]);
    }

    #[test]
    fn non_object_body_is_treated_as_empty() {
        let errs = SAMPLE.check(&Payload::from(json!([1, 2])), now()).unwrap_err();
        assert_eq!(errs.len(), 3);
    }

    #[test]
    fn truthiness() {
        let p = Payload::from(json!({ "a": "", "b": 0, "c": false, "d": null, "e": "x", "f": 7 }));
        for f in ["a", "b", "c", "d", "missing"] {
            assert!(!p.is_truthy(f), "{f} should be falsy");
        }
        assert!(p.is_truthy("e"));
        assert!(p.is_truthy("f"));
        assert_eq!(p.text("f").as_deref(), Some("7"));
        assert_eq!(p.text("d"), None);
        assert_eq!(p.non_empty_text("a"), None);
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a@x.c"));
        assert!(!is_valid_email("a@x.123"));
        assert!(!is_valid_email("a x@y.com"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn alphanumeric_is_ascii_only_and_non_empty() {
        assert!(is_alphanumeric("JohnDoe42"));
        assert!(!is_alphanumeric("john_doe"));
        assert!(!is_alphanumeric("jöhn"));
        assert!(!is_alphanumeric(""));
    }

    #[test]
    fn password_strength_policy() {
        assert!(is_strong_password("Passw0rd"));
        assert!(is_strong_password("aB3def"));
        assert!(!is_strong_password("aB3de"));
        assert!(!is_strong_password("password1"));
        assert!(!is_strong_password("PASSWORD1"));
        assert!(!is_strong_password("Password"));
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("1990-01-01"), Some(date!(1990 - 01 - 01)));
        assert_eq!(parse_date("1990/1/2"), Some(date!(1990 - 01 - 02)));
        assert_eq!(parse_date("2023-02-29"), None);
        assert_eq!(parse_date("1990-13-01"), None);
        assert_eq!(parse_date("90-01-01"), None);
        assert_eq!(parse_date("1990-01/01"), None);
        assert_eq!(parse_date("1990-01-01T00:00"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn past_date_is_strict() {
        let rule = Check::PastDate;
        let now = now();
        assert!(rule.passes(Some(&json!("2024-06-14")), now));
        assert!(!rule.passes(Some(&json!("2024-06-16")), now));
        // Midnight of today is before 10:30, exactly midnight is not.
        assert!(rule.passes(Some(&json!("2024-06-15")), now));
        assert!(!rule.passes(Some(&json!("2024-06-15")), datetime!(2024-06-15 0:00 UTC)));
        assert!(rule.passes(Some(&json!("garbage")), now));
    }
}
