//! Company directory and reviews.

use jobboard_models::{Company, CompanyReview, NewCompanyReview, Page};
use reqwest::Method;

use crate::client::{ApiClient, Service};
use crate::envelope::{decode, normalize_page};
use crate::error::ApiResult;

impl ApiClient {
    /// List companies. Public; the token is sent when present.
    pub async fn list_companies(
        &self,
        search: Option<&str>,
        page: u32,
        size: u32,
        token: Option<&str>,
    ) -> ApiResult<Page<Company>> {
        let mut query = vec![("page", page.to_string()), ("size", size.to_string())];
        if let Some(search) = search.map(str::trim).filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        let value = self
            .get_value("list_companies", Service::Profile, "/companies", &query, token)
            .await?;
        normalize_page(value)
    }

    pub async fn get_company(&self, company_id: i64, token: Option<&str>) -> ApiResult<Company> {
        let value = self
            .get_value(
                "get_company",
                Service::Profile,
                &format!("/companies/{}", company_id),
                &[],
                token,
            )
            .await?;
        decode(value)
    }

    pub async fn company_reviews(
        &self,
        company_id: i64,
        page: u32,
        size: u32,
        token: Option<&str>,
    ) -> ApiResult<Page<CompanyReview>> {
        let query = [("page", page.to_string()), ("size", size.to_string())];
        let value = self
            .get_value(
                "company_reviews",
                Service::Profile,
                &format!("/companies/{}/reviews", company_id),
                &query,
                token,
            )
            .await?;
        normalize_page(value)
    }

    /// Post a review. Callers check the rating first; the server rejects
    /// values outside 1 to 5 with a 400.
    pub async fn add_company_review(
        &self,
        token: &str,
        company_id: i64,
        review: &NewCompanyReview,
    ) -> ApiResult<CompanyReview> {
        let body = serde_json::to_value(review)?;
        let value = self
            .send_value(
                "add_company_review",
                Method::POST,
                Service::Profile,
                &format!("/companies/{}/reviews", company_id),
                Some(body),
                Some(token),
            )
            .await?;
        decode(value)
    }
}
