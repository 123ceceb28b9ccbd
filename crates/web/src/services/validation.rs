//! Form validation run before any request reaches the session provider.

use rain_advisory_core::Email;

/// Minimum password length accepted by the sign-in and sign-up forms.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Message shown next to an invalid email field.
pub const INVALID_EMAIL: &str = "Invalid email address";
/// Message shown next to a too-short password field.
pub const SHORT_PASSWORD: &str = "Password must be at least 6 characters";
/// Message shown when the sign-up form has no name.
pub const MISSING_FULL_NAME: &str = "Full name is required";

/// Per-field validation messages. A `None` field passed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub email: Option<&'static str>,
    pub password: Option<&'static str>,
    pub full_name: Option<&'static str>,
}

impl FieldErrors {
    /// Whether every field passed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.full_name.is_none()
    }
}

/// Email and password that passed validation.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: Email,
    pub password: String,
}

/// Validate a sign-in form. Every field is checked so all errors show at once.
///
/// # Errors
///
/// Returns the per-field messages if any field is invalid.
pub fn validate_credentials(email: &str, password: &str) -> Result<Credentials, FieldErrors> {
    let parsed = Email::parse(email);
    let errors = FieldErrors {
        email: parsed.is_err().then_some(INVALID_EMAIL),
        password: (password.chars().count() < MIN_PASSWORD_LENGTH).then_some(SHORT_PASSWORD),
        full_name: None,
    };

    match parsed {
        Ok(email) if errors.is_empty() => Ok(Credentials {
            email,
            password: password.to_string(),
        }),
        _ => Err(errors),
    }
}

/// Validate a sign-up form: the sign-in rules plus a non-blank name.
///
/// # Errors
///
/// Returns the per-field messages if any field is invalid.
pub fn validate_registration(
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<(Credentials, String), FieldErrors> {
    let full_name = full_name.trim();
    let name_error = full_name.is_empty().then_some(MISSING_FULL_NAME);

    match validate_credentials(email, password) {
        Ok(credentials) if name_error.is_none() => Ok((credentials, full_name.to_string())),
        Ok(_) => Err(FieldErrors {
            full_name: name_error,
            ..FieldErrors::default()
        }),
        Err(mut errors) => {
            errors.full_name = name_error;
            Err(errors)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_email_and_short_password_both_reported() {
        let errors = validate_credentials("bad-email", "abc").unwrap_err();
        assert_eq!(errors.email, Some(INVALID_EMAIL));
        assert_eq!(errors.password, Some(SHORT_PASSWORD));
    }

    #[test]
    fn test_valid_credentials() {
        let creds = validate_credentials(" admin@example.com ", "secret1").unwrap();
        assert_eq!(creds.email.as_str(), "admin@example.com");
        assert_eq!(creds.password, "secret1");
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(validate_credentials("a@b.co", "123456").is_ok());
        assert!(validate_credentials("a@b.co", "12345").is_err());
        // Multi-byte characters count once each
        assert!(validate_credentials("a@b.co", "ñññññññ").is_ok());
    }

    #[test]
    fn test_password_is_not_trimmed() {
        let creds = validate_credentials("a@b.co", "  pass  ").unwrap();
        assert_eq!(creds.password, "  pass  ");
    }

    #[test]
    fn test_registration_requires_name() {
        let errors = validate_registration("a@b.co", "123456", "   ").unwrap_err();
        assert_eq!(errors.full_name, Some(MISSING_FULL_NAME));
        assert_eq!(errors.email, None);

        let errors = validate_registration("nope", "1", "").unwrap_err();
        assert!(errors.email.is_some() && errors.password.is_some() && errors.full_name.is_some());
    }

    #[test]
    fn test_registration_trims_name() {
        let (_, name) = validate_registration("a@b.co", "123456", "  Mary Wanjiru ").unwrap();
        assert_eq!(name, "Mary Wanjiru");
    }
}
