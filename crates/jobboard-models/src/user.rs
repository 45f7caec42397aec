//! User records as returned by the auth/user service.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Account type of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    #[default]
    Jobseeker,
    Employer,
    CompanyAdmin,
    SuperAdmin,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Jobseeker => "JOBSEEKER",
            UserType::Employer => "EMPLOYER",
            UserType::CompanyAdmin => "COMPANY_ADMIN",
            UserType::SuperAdmin => "SUPER_ADMIN",
        }
    }

    /// True for account types that own an employer profile.
    pub fn is_employer_side(&self) -> bool {
        matches!(self, UserType::Employer | UserType::CompanyAdmin)
    }
}

impl std::fmt::Display for UserType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authenticated user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(alias = "id")]
    pub user_id: i64,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl UserRecord {
    /// Merge a partial record into this one. Absent fields are left untouched.
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(user_type) = patch.user_type {
            self.user_type = user_type;
        }
        if let Some(verified) = patch.is_verified {
            self.is_verified = verified;
        }
        if let Some(active) = patch.is_active {
            self.is_active = active;
        }
    }
}

/// Partial user record, used both for `PUT /users/me` and local merges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserPatch {
    /// Patch produced by a successful phone re-verification.
    pub fn verified_phone(phone: impl Into<String>) -> Self {
        Self {
            phone: Some(phone.into()),
            is_verified: Some(true),
            ..Default::default()
        }
    }
}

/// One entry of `GET /users/login-history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginHistoryEntry {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(alias = "loginTime")]
    pub logged_in_at: DateTime<Utc>,
    #[serde(default = "default_true")]
    pub success: bool,
}
