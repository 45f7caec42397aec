//! Account operations for the signed-in user.

use std::sync::Arc;

use jobboard_client::ApiClient;
use jobboard_models::{validate_email, validate_password, LoginHistoryEntry, UserPatch, UserRecord};
use tracing::info;

use crate::error::{AccountError, AccountResult};
use crate::session::SessionStore;

pub struct AccountService {
    client: Arc<ApiClient>,
    session: Arc<SessionStore>,
}

impl AccountService {
    pub fn new(client: Arc<ApiClient>, session: Arc<SessionStore>) -> Self {
        Self { client, session }
    }

    fn token(&self) -> AccountResult<String> {
        self.session.token().ok_or(AccountError::NotAuthenticated)
    }

    /// Update name/email and mirror the server's record into the session.
    pub async fn update_profile(&self, patch: &UserPatch) -> AccountResult<UserRecord> {
        if let Some(email) = &patch.email {
            validate_email(email)?;
        }
        let token = self.token()?;
        let user = self.client.update_current_user(&token, patch).await?;
        self.session.update_user(&UserPatch {
            name: Some(user.name.clone()),
            email: Some(user.email.clone()),
            phone: user.phone.clone(),
            user_type: Some(user.user_type),
            is_verified: Some(user.is_verified),
            is_active: Some(user.is_active),
        });
        Ok(user)
    }

    pub async fn change_password(&self, current: &str, new_password: &str) -> AccountResult<()> {
        validate_password(new_password)?;
        let token = self.token()?;
        self.client.change_password(&token, current, new_password).await?;
        info!("Password changed");
        Ok(())
    }

    /// Deactivate the account and drop the local session.
    pub async fn deactivate(&self) -> AccountResult<()> {
        let token = self.token()?;
        self.client.deactivate_account(&token).await?;
        self.session.clear();
        info!("Account deactivated");
        Ok(())
    }

    pub async fn login_history(&self) -> AccountResult<Vec<LoginHistoryEntry>> {
        let token = self.token()?;
        Ok(self.client.login_history(&token).await?)
    }

    pub fn logout(&self) {
        self.session.clear();
    }
}
