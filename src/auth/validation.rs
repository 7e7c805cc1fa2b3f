//! Credential Validation
//! Mission: Reject malformed emails and weak passwords before any crypto or store call

use lazy_static::lazy_static;
use regex::Regex;

/// Minimum password length, counted in characters
pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    // local@domain.tld shape: no whitespace or extra '@' anywhere, at least one '.' after the '@'
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid");
}

/// Check that `email` looks like `local@domain.tld`
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Check the password strength policy.
///
/// At least [`MIN_PASSWORD_LEN`] characters with one ASCII lowercase letter,
/// one ASCII uppercase letter and one ASCII digit. Any other characters are
/// accepted; the policy only requires classes, it never excludes them.
pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
}
