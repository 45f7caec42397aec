//! Client-side validation gates.
//!
//! Everything here runs before a request is built. A `ValidationError`
//! means no network call was attempted.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use validator::ValidateEmail;

/// Number of digits in an OTP code.
pub const OTP_CODE_LEN: usize = 6;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Indian mobile number, optionally prefixed with the country code.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+91)?[6-9]\d{9}$").expect("phone pattern is valid"));

/// Input rejected before reaching the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Enter a valid 10-digit mobile number")]
    InvalidPhoneFormat,

    #[error("OTP must be exactly {OTP_CODE_LEN} digits")]
    MalformedOtp,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,

    #[error("Enter a valid email address")]
    InvalidEmail,

    #[error("Rating must be between 1 and 5")]
    InvalidRating,

    #[error("{field} is required")]
    Required { field: &'static str },
}

/// Normalize a phone number to its bare 10-digit form.
///
/// Spaces and dashes are ignored; an optional `+91` prefix is accepted and
/// stripped.
pub fn normalize_phone(input: &str) -> Result<String, ValidationError> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if !PHONE_RE.is_match(&compact) {
        return Err(ValidationError::InvalidPhoneFormat);
    }

    let digits = compact.strip_prefix("+91").unwrap_or(&compact);
    Ok(digits.to_string())
}

/// Check an OTP code: exactly six ASCII digits.
pub fn validate_otp_code(code: &str) -> Result<(), ValidationError> {
    if code.len() == OTP_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::MalformedOtp)
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::Required { field: "email" });
    }
    if !email.validate_email() {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

/// Mask a phone number for logs: only the last four digits are kept.
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().collect();
    if digits.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("******{}", tail)
}
