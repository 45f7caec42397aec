//! Company directory and reviews on behalf of the current session.

use std::sync::Arc;

use jobboard_client::ApiClient;
use jobboard_models::{Company, CompanyReview, NewCompanyReview, Page, ValidationError};
use tracing::info;

use crate::error::{CompanyError, CompanyResult};
use crate::session::SessionStore;

pub struct CompanyDirectory {
    client: Arc<ApiClient>,
    session: Arc<SessionStore>,
    page_size: u32,
}

impl CompanyDirectory {
    pub fn new(client: Arc<ApiClient>, session: Arc<SessionStore>, page_size: u32) -> Self {
        Self {
            client,
            session,
            page_size: page_size.max(1),
        }
    }

    /// Browse companies. Works signed out; the token is sent when present.
    pub async fn list(&self, search: Option<&str>, page: u32) -> CompanyResult<Page<Company>> {
        let token = self.session.token();
        Ok(self
            .client
            .list_companies(search, page, self.page_size, token.as_deref())
            .await?)
    }

    pub async fn get(&self, company_id: i64) -> CompanyResult<Company> {
        let token = self.session.token();
        Ok(self.client.get_company(company_id, token.as_deref()).await?)
    }

    pub async fn reviews(&self, company_id: i64, page: u32) -> CompanyResult<Page<CompanyReview>> {
        let token = self.session.token();
        Ok(self
            .client
            .company_reviews(company_id, page, self.page_size, token.as_deref())
            .await?)
    }

    /// Post a review. An out-of-range rating is refused before any request.
    pub async fn add_review(&self, company_id: i64, review: &NewCompanyReview) -> CompanyResult<CompanyReview> {
        if !review.has_valid_rating() {
            return Err(ValidationError::InvalidRating.into());
        }
        let token = self.session.token().ok_or(CompanyError::NotAuthenticated)?;
        let created = self.client.add_company_review(&token, company_id, review).await?;
        info!(company_id, review_id = created.id, "Company review posted");
        Ok(created)
    }
}
