//! Job postings and applications.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identifier of a job posting.
pub type JobId = i64;

/// A job posting as shown in listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    #[serde(alias = "jobId")]
    pub id: JobId,
    pub title: String,
    #[serde(default, alias = "company")]
    pub company_name: String,
    #[serde(default)]
    pub location: String,
    /// Employment type, e.g. "full-time", "contract".
    #[serde(default)]
    pub job_type: String,
    /// Experience level, e.g. "entry", "mid", "senior".
    #[serde(default)]
    pub experience: String,
    /// Annual salary used for range filtering and salary sorts.
    #[serde(default)]
    pub salary: Option<u64>,
    #[serde(default)]
    pub remote: bool,
    #[serde(alias = "postedDate", alias = "createdAt")]
    pub posted_at: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Set by the server for the current user, or locally after a confirmed apply.
    #[serde(default, alias = "hasApplied")]
    pub applied: bool,
    #[serde(default, alias = "isSaved")]
    pub saved: bool,
}

impl Job {
    /// Whole days between `posted_at` and `now`; never negative.
    pub fn age_in_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.posted_at).num_days().max(0)
    }
}

/// Lifecycle of an application on the employer side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    #[default]
    Applied,
    UnderReview,
    Shortlisted,
    InterviewScheduled,
    Rejected,
    Hired,
    Withdrawn,
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Rejected | ApplicationStatus::Hired | ApplicationStatus::Withdrawn
        )
    }
}

/// Payload for `POST /applications`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_letter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

/// An application submitted by the current user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    #[serde(alias = "applicationId")]
    pub id: i64,
    pub job_id: JobId,
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
}
