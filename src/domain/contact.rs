//! Contact message validation shared by the contact form and the API.

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::DomainError;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[1-9][0-9]{1,14}$").expect("phone pattern compiles"));

pub const EMAIL_ERROR: &str = "Invalid email format. Email must contain @ symbol.";
pub const PHONE_ERROR: &str = "Invalid phone format. Phone must start with + followed by country code and digits (no spaces). Example: +1234567890";
pub const MISSING_FIELDS_ERROR: &str =
    "Missing required fields. Name, email, and message are required.";

pub fn is_valid_email(email: &str) -> bool {
    email.contains('@') && EMAIL_PATTERN.is_match(email)
}

/// Phone numbers are international: a leading `+`, a non-zero country code
/// digit, and no spaces.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(phone)
}

/// A contact message that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub description: String,
}

impl NewContactMessage {
    pub fn validate(
        name: &str,
        email: &str,
        phone: Option<&str>,
        description: &str,
    ) -> Result<Self, DomainError> {
        let name = name.trim();
        let email = email.trim();
        let description = description.trim();

        if name.is_empty() {
            return Err(DomainError::missing("name"));
        }
        if email.is_empty() {
            return Err(DomainError::missing("email"));
        }
        if description.is_empty() {
            return Err(DomainError::missing("desc"));
        }

        if !is_valid_email(email) {
            return Err(DomainError::validation(EMAIL_ERROR));
        }

        let phone = phone.filter(|value| !value.trim().is_empty());
        if let Some(phone) = phone {
            if !is_valid_phone(phone) {
                return Err(DomainError::validation(PHONE_ERROR));
            }
        }

        Ok(Self {
            name: name.to_string(),
            email: email.to_string(),
            phone: phone.map(str::to_string),
            description: description.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation_requires_at_and_domain() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("foo.bar"));
        assert!(!is_valid_email("foo@bar"));
        assert!(!is_valid_email("foo bar@baz.com"));
    }

    #[test]
    fn phone_validation_rejects_spaces() {
        assert!(is_valid_phone("+1234567890"));
        assert!(!is_valid_phone("+1 234 567"));
        assert!(!is_valid_phone("1234567890"));
        assert!(!is_valid_phone("+0123456"));
    }

    #[test]
    fn blank_phone_is_treated_as_absent() {
        let message = NewContactMessage::validate("Ada", "ada@example.com", Some("  "), "Hi")
            .expect("valid message");
        assert_eq!(message.phone, None);
    }

    #[test]
    fn missing_fields_are_reported_by_name() {
        let err = NewContactMessage::validate("", "a@b.co", None, "Hi").expect_err("no name");
        assert_eq!(err, DomainError::missing("name"));

        let err = NewContactMessage::validate("Ada", "a@b.co", None, "  ").expect_err("no desc");
        assert_eq!(err, DomainError::missing("desc"));
    }

    #[test]
    fn malformed_phone_is_rejected() {
        let err = NewContactMessage::validate("Ada", "a@b.co", Some("+1 234 567"), "Hi")
            .expect_err("bad phone");
        assert_eq!(err, DomainError::validation(PHONE_ERROR));
    }
}
