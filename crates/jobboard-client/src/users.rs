//! User service endpoints for the signed-in account.

use jobboard_models::{LoginHistoryEntry, UserPatch, UserRecord};
use reqwest::Method;
use serde_json::json;

use crate::client::{ApiClient, Service};
use crate::envelope::{decode, normalize_page};
use crate::error::ApiResult;

impl ApiClient {
    /// Resolve the user behind a bearer token.
    pub async fn current_user(&self, token: &str) -> ApiResult<UserRecord> {
        let value = self
            .get_value("current_user", Service::Auth, "/users/me", &[], Some(token))
            .await?;
        decode(value)
    }

    pub async fn update_current_user(&self, token: &str, patch: &UserPatch) -> ApiResult<UserRecord> {
        let body = serde_json::to_value(patch)?;
        let value = self
            .send_value("update_current_user", Method::PUT, Service::Auth, "/users/me", Some(body), Some(token))
            .await?;
        decode(value)
    }

    pub async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<()> {
        let body = json!({ "currentPassword": current_password, "newPassword": new_password });
        self.send_value(
            "change_password",
            Method::POST,
            Service::Auth,
            "/users/change-password",
            Some(body),
            Some(token),
        )
        .await?;
        Ok(())
    }

    /// Send an OTP to a new phone number before it replaces the current one.
    pub async fn request_phone_verification(&self, token: &str, phone: &str) -> ApiResult<()> {
        let body = json!({ "phone": phone });
        self.send_value(
            "request_phone_verification",
            Method::POST,
            Service::Auth,
            "/users/request-phone-verification",
            Some(body),
            Some(token),
        )
        .await?;
        Ok(())
    }

    pub async fn verify_updated_phone(&self, token: &str, phone: &str, otp: &str) -> ApiResult<()> {
        let body = json!({ "phone": phone, "otp": otp });
        self.send_value(
            "verify_updated_phone",
            Method::POST,
            Service::Auth,
            "/users/verify-updated-phone",
            Some(body),
            Some(token),
        )
        .await?;
        Ok(())
    }

    /// Deactivate the account. The token is useless afterwards.
    pub async fn deactivate_account(&self, token: &str) -> ApiResult<()> {
        self.send_value("deactivate_account", Method::DELETE, Service::Auth, "/users/me", None, Some(token))
            .await?;
        Ok(())
    }

    pub async fn login_history(&self, token: &str) -> ApiResult<Vec<LoginHistoryEntry>> {
        let value = self
            .get_value("login_history", Service::Auth, "/users/login-history", &[], Some(token))
            .await?;
        Ok(normalize_page(value)?.items)
    }
}
