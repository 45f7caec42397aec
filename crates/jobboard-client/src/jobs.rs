//! Job service endpoints: search, saved jobs and applications.

use jobboard_models::{
    ApplicationRequest, Job, JobApplication, JobFilterCriteria, JobId, Page, SortBy,
};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::client::{ApiClient, Service};
use crate::envelope::{decode, normalize_page, unwrap_data};
use crate::error::ApiResult;

// =============================================================================
// Search Query
// =============================================================================

/// Query parameters for `GET /jobs/search`. Empty criteria are omitted.
pub fn search_query(
    criteria: &JobFilterCriteria,
    sort_by: SortBy,
    page: u32,
    size: u32,
) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();

    let search = criteria.search.trim();
    if !search.is_empty() {
        query.push(("keyword", search.to_string()));
    }
    let location = criteria.location.trim();
    if !location.is_empty() {
        query.push(("location", location.to_string()));
    }
    if !criteria.job_type.is_empty() {
        let types: Vec<&str> = criteria.job_type.iter().map(String::as_str).collect();
        query.push(("jobType", types.join(",")));
    }
    let experience = criteria.experience.trim();
    if !experience.is_empty() {
        query.push(("experience", experience.to_string()));
    }
    let salary = criteria.salary_range;
    if salary.min() > 0 {
        query.push(("minSalary", salary.min().to_string()));
    }
    if salary.max() < u64::MAX {
        query.push(("maxSalary", salary.max().to_string()));
    }
    if criteria.posted_date.max_age_days().is_some() {
        query.push(("postedDate", criteria.posted_date.as_str().to_string()));
    }
    if criteria.remote {
        query.push(("remote", "true".to_string()));
    }

    query.push(("sortBy", sort_by.as_str().to_string()));
    query.push(("page", page.to_string()));
    query.push(("size", size.to_string()));
    query
}

// =============================================================================
// Endpoints
// =============================================================================

impl ApiClient {
    /// Server-side search with the current criteria.
    pub async fn search_jobs(
        &self,
        criteria: &JobFilterCriteria,
        sort_by: SortBy,
        page: u32,
        size: u32,
        token: Option<&str>,
    ) -> ApiResult<Page<Job>> {
        let query = search_query(criteria, sort_by, page, size);
        let value = self
            .get_value("search_jobs", Service::Job, "/jobs/search", &query, token)
            .await?;
        normalize_page(value)
    }

    pub async fn get_job(&self, job_id: JobId, token: Option<&str>) -> ApiResult<Job> {
        let value = self
            .get_value("get_job", Service::Job, &format!("/jobs/{}", job_id), &[], token)
            .await?;
        decode(value)
    }

    // =========================================================================
    // Saved Jobs
    // =========================================================================

    pub async fn saved_jobs(&self, token: &str) -> ApiResult<Vec<Job>> {
        let value = self
            .get_value("saved_jobs", Service::Job, "/jobs/saved", &[], Some(token))
            .await?;
        Ok(normalize_page(value)?.items)
    }

    pub async fn save_job(&self, token: &str, job_id: JobId) -> ApiResult<()> {
        self.send_value(
            "save_job",
            Method::POST,
            Service::Job,
            &format!("/jobs/{}/save", job_id),
            None,
            Some(token),
        )
        .await?;
        Ok(())
    }

    pub async fn unsave_job(&self, token: &str, job_id: JobId) -> ApiResult<()> {
        self.send_value(
            "unsave_job",
            Method::DELETE,
            Service::Job,
            &format!("/jobs/{}/save", job_id),
            None,
            Some(token),
        )
        .await?;
        Ok(())
    }

    // =========================================================================
    // Applications
    // =========================================================================

    /// Submit an application. The created record is returned when the
    /// server echoes it back.
    pub async fn apply_to_job(
        &self,
        token: &str,
        job_id: JobId,
        request: &ApplicationRequest,
    ) -> ApiResult<Option<JobApplication>> {
        let mut body = serde_json::to_value(request)?;
        if let Value::Object(map) = &mut body {
            map.insert("jobId".to_string(), Value::from(job_id));
        }
        let value = self
            .send_value("apply_to_job", Method::POST, Service::Job, "/applications", Some(body), Some(token))
            .await?;

        match serde_json::from_value(unwrap_data(value)) {
            Ok(application) => Ok(Some(application)),
            Err(e) => {
                debug!(job_id, "Application response had no record: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn my_applications(
        &self,
        token: &str,
        page: u32,
        size: u32,
    ) -> ApiResult<Page<JobApplication>> {
        let query = [("page", page.to_string()), ("size", size.to_string())];
        let value = self
            .get_value("my_applications", Service::Job, "/applications/me", &query, Some(token))
            .await?;
        normalize_page(value)
    }

    pub async fn withdraw_application(&self, token: &str, application_id: i64) -> ApiResult<()> {
        self.send_value(
            "withdraw_application",
            Method::PUT,
            Service::Job,
            &format!("/applications/{}/withdraw", application_id),
            None,
            Some(token),
        )
        .await?;
        Ok(())
    }
}
