//! Auth service endpoints: registration, login and password reset.
//!
//! Every call here is a mutation that may dispatch an SMS, so none of them
//! is retried automatically.

use std::sync::LazyLock;

use jobboard_models::{OtpPurpose, UserType};
use regex::Regex;
use reqwest::Method;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::client::{ApiClient, Service};
use crate::envelope::{extract_message, unwrap_data};
use crate::error::{ApiError, ApiResult};

/// Trailing token after the last colon of a message, e.g. "...: abc123".
static LEGACY_RESET_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*(\S+)\s*$").expect("reset token pattern is valid"));

// =============================================================================
// Request and Response Types
// =============================================================================

/// Payload for `POST /auth/register`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name.
    pub name: String,
    /// Login email; must be unique, a duplicate yields 409.
    pub email: String,
    /// Bare 10-digit mobile number the registration OTP is sent to.
    pub phone: String,
    /// Plain-text password; redacted from `Debug` output.
    pub password: String,
    /// Account role chosen at sign-up.
    pub user_type: UserType,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("password", &"<redacted>")
            .field("user_type", &self.user_type)
            .finish()
    }
}

/// Result of a successful credential check: an OTP went to `phone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginChallenge {
    /// Registered phone the login OTP was sent to, as the server reports it.
    pub phone: String,
    /// Server message, e.g. "OTP sent to your registered phone".
    pub message: Option<String>,
}

/// Reset token issued after the password-reset OTP was verified.
#[derive(Clone, PartialEq, Eq)]
pub struct ResetTokenGrant {
    /// Single-use credential for `POST /auth/reset-password`.
    pub reset_token: String,
    /// True when the token was recovered from the message text instead of
    /// a structured field.
    pub from_message: bool,
}

impl std::fmt::Debug for ResetTokenGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetTokenGrant")
            .field("reset_token", &"<redacted>")
            .field("from_message", &self.from_message)
            .finish()
    }
}

// =============================================================================
// Response Parsing
// =============================================================================

/// First string found under `keys`, looking in `data` before the top level.
fn find_string(value: &Value, keys: &[&str]) -> Option<String> {
    let inner = value.get("data").filter(|d| d.is_object());
    inner
        .into_iter()
        .chain(std::iter::once(value))
        .find_map(|v| keys.iter().find_map(|k| v.get(*k).and_then(Value::as_str)))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn bearer_token(value: &Value) -> ApiResult<String> {
    find_string(value, &["token", "accessToken", "jwt"])
        .ok_or_else(|| ApiError::invalid_response("verification response carried no token"))
}

/// Pull the reset token out of a verify-reset-otp response.
///
/// A structured `resetToken` field is preferred. Older backends only embed
/// the token at the end of the message ("OTP verified. Reset token: abc"),
/// which is recovered with the trailing-token-after-colon pattern. That
/// fallback breaks as soon as the message wording changes; the backend
/// should always send the field.
pub fn extract_reset_token(value: &Value) -> Option<ResetTokenGrant> {
    if let Some(token) = find_string(value, &["resetToken", "reset_token"]) {
        return Some(ResetTokenGrant {
            reset_token: token,
            from_message: false,
        });
    }

    let message = extract_message(value).or_else(|| {
        unwrap_data(value.clone())
            .as_str()
            .map(|s| s.to_string())
    })?;
    LEGACY_RESET_TOKEN_RE
        .captures(&message)
        .and_then(|c| c.get(1))
        .map(|m| ResetTokenGrant {
            reset_token: m.as_str().to_string(),
            from_message: true,
        })
}

// =============================================================================
// Endpoints
// =============================================================================

impl ApiClient {
    /// Create a pending registration; the server sends an OTP to the phone.
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<()> {
        let body = serde_json::to_value(request)?;
        self.send_value("register", Method::POST, Service::Auth, "/auth/register", Some(body), None)
            .await?;
        Ok(())
    }

    /// Check credentials; on success the server sends an OTP to the
    /// registered phone and reports that number.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<LoginChallenge> {
        let body = json!({ "email": email, "password": password });
        let response = self
            .send_value("login", Method::POST, Service::Auth, "/auth/login", Some(body), None)
            .await?;

        let phone = find_string(&response, &["phone", "phoneNumber", "mobile"])
            .ok_or_else(|| ApiError::invalid_response("login response carried no phone number"))?;

        Ok(LoginChallenge {
            phone,
            message: extract_message(&response),
        })
    }

    pub async fn verify_registration_otp(&self, phone: &str, otp: &str) -> ApiResult<String> {
        let body = json!({ "phone": phone, "otp": otp });
        let response = self
            .send_value(
                "verify_registration_otp",
                Method::POST,
                Service::Auth,
                "/auth/verify-registration-otp",
                Some(body),
                None,
            )
            .await?;
        bearer_token(&response)
    }

    pub async fn verify_login_otp(&self, phone: &str, otp: &str) -> ApiResult<String> {
        let body = json!({ "phone": phone, "otp": otp });
        let response = self
            .send_value(
                "verify_login_otp",
                Method::POST,
                Service::Auth,
                "/auth/verify-login-otp",
                Some(body),
                None,
            )
            .await?;
        bearer_token(&response)
    }

    /// Ask for a fresh code for the same destination and purpose.
    pub async fn resend_otp(&self, phone: &str, purpose: OtpPurpose) -> ApiResult<()> {
        let body = json!({ "phone": phone, "purpose": purpose });
        self.send_value("resend_otp", Method::POST, Service::Auth, "/auth/resend-otp", Some(body), None)
            .await?;
        Ok(())
    }

    pub async fn forgot_password(&self, phone: &str) -> ApiResult<()> {
        let body = json!({ "phone": phone });
        self.send_value(
            "forgot_password",
            Method::POST,
            Service::Auth,
            "/auth/forgot-password",
            Some(body),
            None,
        )
        .await?;
        Ok(())
    }

    /// Verify the password-reset OTP and obtain the single-use reset token.
    pub async fn verify_reset_otp(&self, phone: &str, otp: &str) -> ApiResult<ResetTokenGrant> {
        let body = json!({ "phone": phone, "otp": otp });
        let response = self
            .send_value(
                "verify_reset_otp",
                Method::POST,
                Service::Auth,
                "/auth/verify-reset-otp",
                Some(body),
                None,
            )
            .await?;

        let grant = extract_reset_token(&response)
            .ok_or_else(|| ApiError::invalid_response("verification response carried no reset token"))?;
        if grant.from_message {
            warn!("Reset token recovered from message text; backend did not send resetToken");
        } else {
            debug!("Reset token received");
        }
        Ok(grant)
    }

    pub async fn reset_password(&self, reset_token: &str, new_password: &str) -> ApiResult<()> {
        let body = json!({ "resetToken": reset_token, "newPassword": new_password });
        self.send_value(
            "reset_password",
            Method::POST,
            Service::Auth,
            "/auth/reset-password",
            Some(body),
            None,
        )
        .await?;
        Ok(())
    }
}
