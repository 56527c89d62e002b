use lazy_static::lazy_static;
use regex::Regex;

use crate::auth::dto::RegisterRequest;
use crate::error::FieldErrors;

const MAX_FIELD_LEN: usize = 255;
const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// Collects every violation instead of stopping at the first one. Inputs are
/// expected to be trimmed (and the email lowercased) before this runs.
pub fn validate_register(req: &RegisterRequest) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if req.name.is_empty() {
        push(&mut errors, "name", "the name field is required");
    } else if req.name.len() > MAX_FIELD_LEN {
        push(&mut errors, "name", "the name may not be greater than 255 characters");
    }

    if req.email.is_empty() {
        push(&mut errors, "email", "the email field is required");
    } else if !is_valid_email(&req.email) {
        push(&mut errors, "email", "the email must be a valid email address");
    } else if req.email.len() > MAX_FIELD_LEN {
        push(&mut errors, "email", "the email may not be greater than 255 characters");
    }

    if req.username.is_empty() {
        push(&mut errors, "username", "the username field is required");
    } else if req.username.len() > MAX_FIELD_LEN {
        push(&mut errors, "username", "the username may not be greater than 255 characters");
    }

    if req.password.len() < MIN_PASSWORD_LEN {
        push(&mut errors, "password", "the password must be at least 8 characters");
    }

    errors
}

pub fn duplicate_email(errors: &mut FieldErrors) {
    push(errors, "email", "the email has already been taken");
}

pub fn duplicate_username(errors: &mut FieldErrors) {
    push(errors, "username", "the username has already been taken");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(name: &str, email: &str, username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    #[test]
    fn accepts_valid_input() {
        let errors = validate_register(&req("Ana", "ana@x.com", "ana1", "password1"));
        assert!(errors.is_empty());
    }

    #[test]
    fn collects_all_violations_at_once() {
        let errors = validate_register(&req("", "not-an-email", "", "short"));
        assert_eq!(errors.len(), 4);
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("email"));
        assert!(errors.contains_key("username"));
        assert!(errors.contains_key("password"));
    }

    #[test]
    fn rejects_overlong_fields() {
        let long = "x".repeat(256);
        let errors = validate_register(&req(&long, "ana@x.com", &long, "password1"));
        assert!(errors["name"][0].contains("255"));
        assert!(errors["username"][0].contains("255"));
    }

    #[test]
    fn email_regex_rejects_obvious_garbage() {
        assert!(is_valid_email("ana@x.com"));
        assert!(!is_valid_email("ana@x"));
        assert!(!is_valid_email("ana x@x.com"));
        assert!(!is_valid_email("@x.com"));
    }

    #[test]
    fn password_boundary_is_eight_chars() {
        assert!(validate_register(&req("Ana", "ana@x.com", "ana1", "1234567")).contains_key("password"));
        assert!(validate_register(&req("Ana", "ana@x.com", "ana1", "12345678")).is_empty());
    }
}
