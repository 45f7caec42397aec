//! Job filter criteria and the pure filter/sort derivation.
//!
//! `filter_jobs` is deterministic: the same jobs, criteria, sort order and
//! reference time always produce the same ordered output. All sorts are
//! stable, so ties keep their input order.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::Job;

/// Literal location token that also matches remote jobs.
pub const REMOTE_LOCATION_TOKEN: &str = "remote";

/// Posted-date bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostedDate {
    #[default]
    Any,
    #[serde(rename = "24hours")]
    Last24Hours,
    Week,
    Month,
}

impl PostedDate {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostedDate::Any => "any",
            PostedDate::Last24Hours => "24hours",
            PostedDate::Week => "week",
            PostedDate::Month => "month",
        }
    }

    /// Maximum age in whole days, `None` for no limit.
    pub fn max_age_days(&self) -> Option<i64> {
        match self {
            PostedDate::Any => None,
            PostedDate::Last24Hours => Some(1),
            PostedDate::Week => Some(7),
            PostedDate::Month => Some(30),
        }
    }
}

/// Ordering of the visible job list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    #[default]
    Newest,
    SalaryHigh,
    SalaryLow,
    Relevance,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Newest => "newest",
            SortBy::SalaryHigh => "salary-high",
            SortBy::SalaryLow => "salary-low",
            SortBy::Relevance => "relevance",
        }
    }
}

/// Inclusive salary bounds with `min <= max` always holding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct SalaryRange {
    min: u64,
    max: u64,
}

impl SalaryRange {
    /// Build a range; reversed bounds are swapped.
    pub fn new(a: u64, b: u64) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            min: 0,
            max: u64::MAX,
        }
    }

    pub fn min(&self) -> u64 {
        self.min
    }

    pub fn max(&self) -> u64 {
        self.max
    }

    pub fn is_unbounded(&self) -> bool {
        *self == Self::unbounded()
    }

    pub fn contains(&self, salary: u64) -> bool {
        self.min <= salary && salary <= self.max
    }
}

impl Default for SalaryRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Current filter criteria of the job board.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobFilterCriteria {
    pub search: String,
    pub location: String,
    /// Empty means no type filter.
    pub job_type: BTreeSet<String>,
    pub experience: String,
    pub salary_range: SalaryRange,
    pub posted_date: PostedDate,
    pub remote: bool,
}

impl JobFilterCriteria {
    /// Merge a partial update. Absent fields keep their current value.
    pub fn apply(&mut self, update: FilterUpdate) {
        if let Some(search) = update.search {
            self.search = search;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(types) = update.job_type {
            self.job_type = types
                .into_iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect();
        }
        if let Some(experience) = update.experience {
            self.experience = experience;
        }
        if let Some((a, b)) = update.salary_range {
            self.salary_range = SalaryRange::new(a, b);
        }
        if let Some(posted) = update.posted_date {
            self.posted_date = posted;
        }
        if let Some(remote) = update.remote {
            self.remote = remote;
        }
    }

    /// True when no criterion narrows the result.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn search_terms(&self) -> Vec<String> {
        self.search
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect()
    }

    /// Check one job against every criterion.
    pub fn matches(&self, job: &Job, now: DateTime<Utc>) -> bool {
        self.matches_search(job, &self.search_terms())
            && self.matches_location(job)
            && self.matches_job_type(job)
            && self.matches_experience(job)
            && self.matches_salary(job)
            && self.matches_posted_date(job, now)
            && (!self.remote || job.remote)
    }

    fn matches_search(&self, job: &Job, terms: &[String]) -> bool {
        terms.iter().all(|term| term_score(job, term) > 0)
    }

    fn matches_location(&self, job: &Job) -> bool {
        let wanted = self.location.trim().to_lowercase();
        if wanted.is_empty() {
            return true;
        }
        if wanted == REMOTE_LOCATION_TOKEN && job.remote {
            return true;
        }
        job.location.to_lowercase().contains(&wanted)
    }

    fn matches_job_type(&self, job: &Job) -> bool {
        self.job_type.is_empty()
            || self
                .job_type
                .iter()
                .any(|t| t.eq_ignore_ascii_case(job.job_type.trim()))
    }

    fn matches_experience(&self, job: &Job) -> bool {
        let wanted = self.experience.trim();
        wanted.is_empty() || wanted.eq_ignore_ascii_case(job.experience.trim())
    }

    fn matches_salary(&self, job: &Job) -> bool {
        if self.salary_range.is_unbounded() {
            return true;
        }
        job.salary.is_some_and(|s| self.salary_range.contains(s))
    }

    fn matches_posted_date(&self, job: &Job, now: DateTime<Utc>) -> bool {
        match self.posted_date.max_age_days() {
            Some(max) => job.age_in_days(now) <= max,
            None => true,
        }
    }
}

/// Partial criteria update. Build with the setter methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterUpdate {
    pub search: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<BTreeSet<String>>,
    pub experience: Option<String>,
    pub salary_range: Option<(u64, u64)>,
    pub posted_date: Option<PostedDate>,
    pub remote: Option<bool>,
}

impl FilterUpdate {
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn job_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.job_type = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn experience(mut self, experience: impl Into<String>) -> Self {
        self.experience = Some(experience.into());
        self
    }

    pub fn salary_range(mut self, min: u64, max: u64) -> Self {
        self.salary_range = Some((min, max));
        self
    }

    pub fn posted_date(mut self, posted: PostedDate) -> Self {
        self.posted_date = Some(posted);
        self
    }

    pub fn remote(mut self, remote: bool) -> Self {
        self.remote = Some(remote);
        self
    }
}

/// Occurrences of `term` across the searchable fields, weighted by field.
fn term_score(job: &Job, term: &str) -> usize {
    let count = |text: &str| text.to_lowercase().matches(term).count();
    let skills: usize = job.skills.iter().map(|s| count(s)).sum();
    count(&job.title) * 3 + skills * 2 + count(&job.company_name) + count(&job.description)
}

fn relevance(job: &Job, terms: &[String]) -> usize {
    terms.iter().map(|t| term_score(job, t)).sum()
}

/// Filter and sort `jobs` against `criteria` as of `now`.
pub fn filter_jobs(
    jobs: &[Job],
    criteria: &JobFilterCriteria,
    sort_by: SortBy,
    now: DateTime<Utc>,
) -> Vec<Job> {
    let mut visible: Vec<Job> = jobs
        .iter()
        .filter(|job| criteria.matches(job, now))
        .cloned()
        .collect();

    match sort_by {
        SortBy::Newest => visible.sort_by_key(|job| Reverse(job.posted_at)),
        SortBy::SalaryHigh => visible.sort_by_key(|job| Reverse(job.salary.unwrap_or(0))),
        SortBy::SalaryLow => visible.sort_by_key(|job| job.salary.unwrap_or(0)),
        SortBy::Relevance => {
            let terms = criteria.search_terms();
            if !terms.is_empty() {
                visible.sort_by_cached_key(|job| Reverse(relevance(job, &terms)));
            }
        }
    }

    visible
}
