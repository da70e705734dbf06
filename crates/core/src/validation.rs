//! Validation engine: pure checks over registration, login and company payloads.
//!
//! Every function returns the first violated rule, never an aggregate. Field
//! checks run in declaration order (name, description, employee count,
//! registered, type) so the reported message is deterministic.

use std::sync::OnceLock;

use regex::Regex;

use crate::company::{
    CompanyChanges, CompanyType, CreateCompany, MAX_DESCRIPTION_CHARS, MAX_NAME_CHARS, NewCompany,
    UpdateCompany,
};
use crate::error::{DomainError, DomainResult};
use crate::field::Field;
use crate::user::{LoginUser, RegisterUser};

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

/// Minimum display-name length at registration, in characters.
pub const MIN_USER_NAME_CHARS: usize = 3;

/// Minimum password length at registration, in characters.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Caller-facing validation messages.
pub mod msg {
    pub const NAME_REQUIRED: &str = "name is required";
    pub const NAME_TOO_LONG: &str = "name must be 15 characters or less";
    pub const DESCRIPTION_TOO_LONG: &str = "description must be 3000 characters or less";
    pub const EMPLOYEE_COUNT_NOT_POSITIVE: &str = "employee count must be positive";
    pub const REGISTERED_REQUIRED: &str = "registered field is required";
    pub const INVALID_TYPE: &str = "invalid company type";

    pub const USER_NAME_TOO_SHORT: &str = "name must be at least 3 characters";
    pub const INVALID_EMAIL: &str = "invalid email address";
    pub const PASSWORD_TOO_SHORT: &str = "password must be at least 8 characters";
}

pub fn validate_registration(input: &RegisterUser) -> DomainResult<()> {
    if input.name.chars().count() < MIN_USER_NAME_CHARS {
        return Err(DomainError::validation(msg::USER_NAME_TOO_SHORT));
    }
    if !is_valid_email(&input.email) {
        return Err(DomainError::validation(msg::INVALID_EMAIL));
    }
    if input.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(DomainError::validation(msg::PASSWORD_TOO_SHORT));
    }
    Ok(())
}

/// Only the email syntax is checked here; the password is compared against
/// the stored hash later.
pub fn validate_login(input: &LoginUser) -> DomainResult<()> {
    if !is_valid_email(&input.email) {
        return Err(DomainError::validation(msg::INVALID_EMAIL));
    }
    Ok(())
}

pub fn validate_company_create(input: CreateCompany) -> DomainResult<NewCompany> {
    let name = match input.name {
        Field::Value(name) => check_name(name)?,
        Field::Missing | Field::Null => return Err(DomainError::validation(msg::NAME_REQUIRED)),
    };

    let description = match input.description {
        Field::Value(d) => Some(check_description(d)?),
        Field::Missing | Field::Null => None,
    };

    let employee_count = match input.employee_count {
        Field::Value(n) => check_employee_count(n)?,
        Field::Missing | Field::Null => {
            return Err(DomainError::validation(msg::EMPLOYEE_COUNT_NOT_POSITIVE));
        }
    };

    let registered = match input.registered {
        Field::Value(r) => r,
        Field::Missing | Field::Null => {
            return Err(DomainError::validation(msg::REGISTERED_REQUIRED));
        }
    };

    let company_type = match input.company_type {
        Field::Value(t) => t.parse::<CompanyType>()?,
        Field::Missing | Field::Null => return Err(DomainError::validation(msg::INVALID_TYPE)),
    };

    Ok(NewCompany {
        name,
        description,
        employee_count,
        registered,
        company_type,
    })
}

/// Each present field is checked on its own, independent of which other
/// fields are present. `null` is only meaningful for `description`.
pub fn validate_company_update(input: UpdateCompany) -> DomainResult<CompanyChanges> {
    let name = match input.name {
        Field::Missing => None,
        Field::Null => return Err(DomainError::validation(msg::NAME_REQUIRED)),
        Field::Value(name) => Some(check_name(name)?),
    };

    let description = match input.description {
        Field::Missing => Field::Missing,
        Field::Null => Field::Null,
        Field::Value(d) => Field::Value(check_description(d)?),
    };

    let employee_count = match input.employee_count {
        Field::Missing => None,
        Field::Null => return Err(DomainError::validation(msg::EMPLOYEE_COUNT_NOT_POSITIVE)),
        Field::Value(n) => Some(check_employee_count(n)?),
    };

    let registered = match input.registered {
        Field::Missing => None,
        Field::Null => return Err(DomainError::validation(msg::REGISTERED_REQUIRED)),
        Field::Value(r) => Some(r),
    };

    let company_type = match input.company_type {
        Field::Missing => None,
        Field::Null => return Err(DomainError::validation(msg::INVALID_TYPE)),
        Field::Value(t) => Some(t.parse::<CompanyType>()?),
    };

    Ok(CompanyChanges {
        name,
        description,
        employee_count,
        registered,
        company_type,
    })
}

fn check_name(name: String) -> DomainResult<String> {
    if name.is_empty() {
        return Err(DomainError::validation(msg::NAME_REQUIRED));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(DomainError::validation(msg::NAME_TOO_LONG));
    }
    Ok(name)
}

fn check_description(description: String) -> DomainResult<String> {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(DomainError::validation(msg::DESCRIPTION_TOO_LONG));
    }
    Ok(description)
}

fn check_employee_count(count: i32) -> DomainResult<i32> {
    if count <= 0 {
        return Err(DomainError::validation(msg::EMPLOYEE_COUNT_NOT_POSITIVE));
    }
    Ok(count)
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(EMAIL_PATTERN)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Syntactic email check: `local@domain.tld`, TLD at least two letters.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn valid_create() -> CreateCompany {
        CreateCompany {
            name: Field::Value("Acme".to_string()),
            description: Field::Value("Widgets".to_string()),
            employee_count: Field::Value(42),
            registered: Field::Value(true),
            company_type: Field::Value("Corporations".to_string()),
        }
    }

    fn message(r: DomainResult<impl core::fmt::Debug>) -> String {
        r.unwrap_err().message().to_string()
    }

    #[test]
    fn accepts_a_complete_create_payload() {
        let new = validate_company_create(valid_create()).unwrap();
        assert_eq!(new.name, "Acme");
        assert_eq!(new.company_type, CompanyType::Corporation);
        assert_eq!(new.description.as_deref(), Some("Widgets"));
    }

    #[test]
    fn description_is_optional_on_create() {
        let input = CreateCompany {
            description: Field::Missing,
            ..valid_create()
        };
        assert_eq!(validate_company_create(input).unwrap().description, None);
    }

    #[test]
    fn name_exactly_at_limit_is_accepted_and_one_over_rejected() {
        let at_limit = CreateCompany {
            name: Field::Value("Acme12345678901".to_string()),
            ..valid_create()
        };
        assert!(validate_company_create(at_limit).is_ok());

        let over = CreateCompany {
            name: Field::Value("Acme123456789012".to_string()),
            ..valid_create()
        };
        assert_eq!(message(validate_company_create(over)), msg::NAME_TOO_LONG);
    }

    #[test]
    fn missing_or_empty_name_is_required() {
        let missing = CreateCompany {
            name: Field::Missing,
            ..valid_create()
        };
        assert_eq!(message(validate_company_create(missing)), msg::NAME_REQUIRED);

        let empty = CreateCompany {
            name: Field::Value(String::new()),
            ..valid_create()
        };
        assert_eq!(message(validate_company_create(empty)), msg::NAME_REQUIRED);
    }

    #[test]
    fn registered_must_be_explicit_on_create() {
        let input = CreateCompany {
            registered: Field::Missing,
            ..valid_create()
        };
        assert_eq!(message(validate_company_create(input)), msg::REGISTERED_REQUIRED);

        let explicit_false = CreateCompany {
            registered: Field::Value(false),
            ..valid_create()
        };
        assert!(!validate_company_create(explicit_false).unwrap().registered);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let input = CreateCompany {
            company_type: Field::Value("LLC".to_string()),
            ..valid_create()
        };
        assert_eq!(message(validate_company_create(input)), msg::INVALID_TYPE);
    }

    #[test]
    fn first_violation_wins() {
        let input = CreateCompany {
            name: Field::Value("x".repeat(20)),
            employee_count: Field::Value(0),
            company_type: Field::Value("LLC".to_string()),
            ..valid_create()
        };
        assert_eq!(message(validate_company_create(input)), msg::NAME_TOO_LONG);
    }

    #[test]
    fn description_limit_counts_characters() {
        let input = CreateCompany {
            description: Field::Value("é".repeat(MAX_DESCRIPTION_CHARS)),
            ..valid_create()
        };
        assert!(validate_company_create(input).is_ok());

        let over = CreateCompany {
            description: Field::Value("a".repeat(MAX_DESCRIPTION_CHARS + 1)),
            ..valid_create()
        };
        assert_eq!(message(validate_company_create(over)), msg::DESCRIPTION_TOO_LONG);
    }

    #[test]
    fn empty_update_is_valid() {
        assert_eq!(
            validate_company_update(UpdateCompany::default()).unwrap(),
            CompanyChanges::default()
        );
    }

    #[test]
    fn update_checks_employee_count_without_name() {
        let input = UpdateCompany {
            employee_count: Field::Value(0),
            ..Default::default()
        };
        assert_eq!(
            message(validate_company_update(input)),
            msg::EMPLOYEE_COUNT_NOT_POSITIVE
        );
    }

    #[test]
    fn update_with_name_only_does_not_demand_employee_count() {
        let input = UpdateCompany {
            name: Field::Value("NewName".to_string()),
            ..Default::default()
        };
        let changes = validate_company_update(input).unwrap();
        assert_eq!(changes.name.as_deref(), Some("NewName"));
        assert_eq!(changes.employee_count, None);
    }

    #[test]
    fn update_rejects_null_for_non_nullable_fields() {
        let null_name = UpdateCompany {
            name: Field::Null,
            ..Default::default()
        };
        assert_eq!(message(validate_company_update(null_name)), msg::NAME_REQUIRED);

        let null_registered = UpdateCompany {
            registered: Field::Null,
            ..Default::default()
        };
        assert_eq!(
            message(validate_company_update(null_registered)),
            msg::REGISTERED_REQUIRED
        );

        let null_type = UpdateCompany {
            company_type: Field::Null,
            ..Default::default()
        };
        assert_eq!(message(validate_company_update(null_type)), msg::INVALID_TYPE);
    }

    #[test]
    fn update_keeps_null_description_as_clear() {
        let input = UpdateCompany {
            description: Field::Null,
            ..Default::default()
        };
        assert_eq!(validate_company_update(input).unwrap().description, Field::Null);
    }

    #[test]
    fn registration_rules_in_order() {
        let ok = RegisterUser {
            name: "John Doe".into(),
            email: "jd@x.com".into(),
            password: "pw12345678".into(),
        };
        assert!(validate_registration(&ok).is_ok());

        let short_name = RegisterUser {
            name: "Jo".into(),
            ..ok.clone()
        };
        assert_eq!(message(validate_registration(&short_name)), msg::USER_NAME_TOO_SHORT);

        let bad_email = RegisterUser {
            email: "jd-at-x.com".into(),
            ..ok.clone()
        };
        assert_eq!(message(validate_registration(&bad_email)), msg::INVALID_EMAIL);

        let short_pw = RegisterUser {
            password: "pw12345".into(),
            ..ok
        };
        assert_eq!(message(validate_registration(&short_pw)), msg::PASSWORD_TOO_SHORT);
    }

    #[test]
    fn login_only_checks_email_syntax() {
        let login = LoginUser {
            email: "jd@x.com".into(),
            password: String::new(),
        };
        assert!(validate_login(&login).is_ok());

        let bad = LoginUser {
            email: "jd@x".into(),
            password: "whatever1".into(),
        };
        assert_eq!(message(validate_login(&bad)), msg::INVALID_EMAIL);
    }

    #[test]
    fn email_syntax() {
        for good in [
            "a@b.co",
            "first.last+tag@sub.example.org",
            "x_y%z-1@host-1.io",
            "jd@mail.x.com",
        ] {
            assert!(is_valid_email(good), "{good}");
        }
        for bad in [
            "",
            "plain",
            "@example.com",
            "a@.com",
            "a@example",
            "a@example.c",
            "a@example.c0m",
            "a@@example.com",
            "a b@example.com",
            "a@exa mple.com",
            "jd@x.com ",
            "jd@x.com\nother@y.org",
        ] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    proptest! {
        #[test]
        fn names_within_limit_are_accepted(name in "[A-Za-z0-9 ]{1,15}") {
            let input = CreateCompany { name: Field::Value(name), ..valid_create() };
            prop_assert!(validate_company_create(input).is_ok());
        }

        #[test]
        fn names_over_limit_are_rejected(name in "[A-Za-z0-9]{16,40}") {
            let input = UpdateCompany { name: Field::Value(name), ..Default::default() };
            prop_assert_eq!(message(validate_company_update(input)), msg::NAME_TOO_LONG);
        }

        #[test]
        fn non_positive_employee_counts_are_rejected(n in i32::MIN..=0) {
            let input = CreateCompany { employee_count: Field::Value(n), ..valid_create() };
            prop_assert_eq!(
                message(validate_company_create(input)),
                msg::EMPLOYEE_COUNT_NOT_POSITIVE
            );
        }

        #[test]
        fn positive_employee_counts_are_accepted(n in 1..=i32::MAX) {
            let input = UpdateCompany { employee_count: Field::Value(n), ..Default::default() };
            prop_assert_eq!(validate_company_update(input).unwrap().employee_count, Some(n));
        }
    }
}
