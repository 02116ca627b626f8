//! Rule tables for the account operations.

use super::{Check, FieldRules, RequireAny, Rule, RuleSet};
use crate::users::repo_types::Gender;

const PASSWORD_POLICY: &str = "Password must be at least 6 characters long and contain at least 1 uppercase letter, 1 lowercase letter, and 1 number";

const USERNAME_ALNUM: Rule = Rule {
    check: Check::Alphanumeric,
    message: "Username should be alphanumeric",
};
const EMAIL_FORMAT: Rule = Rule {
    check: Check::Email,
    message: "Invalid email format",
};
const FULLNAME_STRING: Rule = Rule {
    check: Check::IsString,
    message: "Full name must be a string",
};
const PASSWORD_NOT_EMPTY: Rule = Rule {
    check: Check::NotEmpty,
    message: "Password should not be empty",
};
const PASSWORD_STRONG: Rule = Rule {
    check: Check::StrongPassword,
    message: PASSWORD_POLICY,
};

const USERNAME_OR_EMAIL: RequireAny = RequireAny {
    fields: &["username", "email"],
    message: "Either email or username is required",
};

pub static REGISTRATION: RuleSet = RuleSet {
    fields: &[
        FieldRules {
            field: "username",
            optional: false,
            rules: &[
                Rule { check: Check::NotEmpty, message: "Username should not be empty" },
                USERNAME_ALNUM,
            ],
        },
        FieldRules {
            field: "email",
            optional: false,
            rules: &[
                Rule { check: Check::NotEmpty, message: "Email should not be empty" },
                EMAIL_FORMAT,
            ],
        },
        FieldRules {
            field: "fullname",
            optional: false,
            rules: &[
                Rule { check: Check::NotEmpty, message: "Full name should not be empty" },
                FULLNAME_STRING,
            ],
        },
        FieldRules {
            field: "password",
            optional: false,
            rules: &[PASSWORD_NOT_EMPTY, PASSWORD_STRONG],
        },
        FieldRules {
            field: "gender",
            optional: false,
            rules: &[
                Rule { check: Check::NotEmpty, message: "Gender should not be empty" },
                Rule {
                    check: Check::OneOf(&Gender::ALL),
                    message: "Gender must be 'male', 'female', or 'other'",
                },
            ],
        },
        FieldRules {
            field: "dob",
            optional: false,
            rules: &[
                Rule { check: Check::NotEmpty, message: "Date of birth should not be empty" },
                Rule { check: Check::Date, message: "Invalid date format" },
                Rule { check: Check::PastDate, message: "Date of birth must be in the past" },
            ],
        },
        FieldRules {
            field: "country",
            optional: false,
            rules: &[
                Rule { check: Check::NotEmpty, message: "Country should not be empty" },
                Rule { check: Check::IsString, message: "Country name must be a string" },
            ],
        },
    ],
    require_any: None,
};

pub static LOGIN: RuleSet = RuleSet {
    fields: &[
        FieldRules { field: "username", optional: true, rules: &[USERNAME_ALNUM] },
        FieldRules { field: "email", optional: true, rules: &[EMAIL_FORMAT] },
        FieldRules { field: "password", optional: false, rules: &[PASSWORD_NOT_EMPTY] },
    ],
    require_any: Some(USERNAME_OR_EMAIL),
};

pub static SEARCH: RuleSet = RuleSet {
    fields: &[
        FieldRules { field: "username", optional: true, rules: &[USERNAME_ALNUM] },
        FieldRules { field: "email", optional: true, rules: &[EMAIL_FORMAT] },
    ],
    require_any: Some(USERNAME_OR_EMAIL),
};

pub static CHANGE_PASSWORD: RuleSet = RuleSet {
    fields: &[
        FieldRules { field: "oldPassword", optional: false, rules: &[PASSWORD_NOT_EMPTY] },
        FieldRules {
            field: "newPassword",
            optional: false,
            rules: &[PASSWORD_NOT_EMPTY, PASSWORD_STRONG],
        },
    ],
    require_any: None,
};

pub static UPDATE_PROFILE: RuleSet = RuleSet {
    fields: &[
        FieldRules { field: "email", optional: true, rules: &[EMAIL_FORMAT] },
        FieldRules { field: "fullname", optional: true, rules: &[FULLNAME_STRING] },
    ],
    require_any: Some(RequireAny {
        fields: &["fullname", "email"],
        message: "Either email or full name is required",
    }),
};
