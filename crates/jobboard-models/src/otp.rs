//! One-time-password challenge types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What an OTP challenge is proving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OtpPurpose {
    Registration,
    Login,
    PasswordReset,
    PhoneUpdate,
}

impl OtpPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPurpose::Registration => "registration",
            OtpPurpose::Login => "login",
            OtpPurpose::PasswordReset => "password_reset",
            OtpPurpose::PhoneUpdate => "phone_update",
        }
    }
}

impl std::fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An outstanding challenge: the server has dispatched a code to `destination`.
///
/// The code itself is never part of the challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    pub purpose: OtpPurpose,
    /// Normalized 10-digit mobile number.
    pub destination: String,
}

impl OtpChallenge {
    pub fn new(purpose: OtpPurpose, destination: impl Into<String>) -> Self {
        Self {
            purpose,
            destination: destination.into(),
        }
    }

    /// True when a verify/resend call addresses this challenge.
    pub fn matches(&self, destination: &str, purpose: OtpPurpose) -> bool {
        self.purpose == purpose && self.destination == destination
    }
}
