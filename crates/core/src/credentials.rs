//! Sign-up / sign-in rules and structured auth error codes.
//!
//! Each failure carries an [`AuthErrorCode`] instead of free text so the
//! surface layer can pick the user-facing message without matching prose.

use serde::Serialize;
use validator::ValidateEmail;

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Known authentication failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorCode {
    UserNotFound,
    WrongPassword,
    InvalidEmail,
    InvalidCredential,
    EmailAlreadyInUse,
    WeakPassword,
    PasswordMismatch,
    AccountDisabled,
}

impl AuthErrorCode {
    /// Stable machine-readable identifier.
    pub fn code(self) -> &'static str {
        match self {
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::InvalidEmail => "auth/invalid-email",
            Self::InvalidCredential => "auth/invalid-credential",
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::WeakPassword => "auth/weak-password",
            Self::PasswordMismatch => "auth/password-mismatch",
            Self::AccountDisabled => "auth/user-disabled",
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            Self::UserNotFound => "User not found",
            Self::WrongPassword => "Wrong password",
            Self::InvalidEmail => "Invalid email format",
            Self::InvalidCredential => "Invalid credentials",
            Self::EmailAlreadyInUse => "Email already registered",
            Self::WeakPassword => "Password must be at least 6 characters long",
            Self::PasswordMismatch => "Passwords do not match",
            Self::AccountDisabled => "Account is disabled",
        }
    }
}

impl std::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

pub fn validate_email(email: &str) -> Result<(), AuthErrorCode> {
    if email.trim().validate_email() {
        Ok(())
    } else {
        Err(AuthErrorCode::InvalidEmail)
    }
}

/// Check a registration form.
///
/// Order matters: a mismatched confirmation is reported before a short
/// password, and both before a malformed email.
pub fn validate_registration(
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), AuthErrorCode> {
    if password != confirm_password {
        return Err(AuthErrorCode::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthErrorCode::WeakPassword);
    }
    validate_email(email)
}

/// Canonical form of an email used for lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_registration_passes() {
        assert!(validate_registration("a@b.io", "secret1", "secret1").is_ok());
    }

    #[test]
    fn mismatch_reported_first() {
        assert_eq!(
            validate_registration("bad", "x", "y"),
            Err(AuthErrorCode::PasswordMismatch)
        );
    }

    #[test]
    fn short_password_is_weak() {
        assert_eq!(
            validate_registration("a@b.io", "12345", "12345"),
            Err(AuthErrorCode::WeakPassword)
        );
        assert!(validate_registration("a@b.io", "123456", "123456").is_ok());
    }

    #[test]
    fn malformed_email_rejected() {
        assert_eq!(
            validate_registration("not-an-email", "secret1", "secret1"),
            Err(AuthErrorCode::InvalidEmail)
        );
        assert_eq!(validate_email(""), Err(AuthErrorCode::InvalidEmail));
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(AuthErrorCode::EmailAlreadyInUse.code(), "auth/email-already-in-use");
        assert_eq!(AuthErrorCode::InvalidCredential.to_string(), "auth/invalid-credential");
        assert_eq!(AuthErrorCode::WrongPassword.user_message(), "Wrong password");
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
