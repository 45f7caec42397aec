//! Jobseeker and employer profiles and their sub-entities.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Jobseeker profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobseekerProfile {
    #[serde(default, alias = "profileId", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_experience_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_salary: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume_url: Option<String>,
}

/// Employer profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployerProfile {
    #[serde(default, alias = "profileId", skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

/// The profile branch owned by the current account.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileKind {
    Jobseeker(JobseekerProfile),
    Employer(EmployerProfile),
}

impl ProfileKind {
    pub fn is_jobseeker(&self) -> bool {
        matches!(self, ProfileKind::Jobseeker(_))
    }

    pub fn as_jobseeker(&self) -> Option<&JobseekerProfile> {
        match self {
            ProfileKind::Jobseeker(p) => Some(p),
            ProfileKind::Employer(_) => None,
        }
    }

    pub fn as_employer(&self) -> Option<&EmployerProfile> {
        match self {
            ProfileKind::Employer(p) => Some(p),
            ProfileKind::Jobseeker(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    #[serde(alias = "experienceId")]
    pub id: i64,
    pub company_name: String,
    pub job_title: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewWorkExperience {
    pub company_name: String,
    pub job_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(alias = "educationId")]
    pub id: i64,
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub field_of_study: Option<String>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewEducation {
    pub institution: String,
    pub degree: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Skill {
    #[serde(alias = "id")]
    pub skill_id: i64,
    #[serde(alias = "skillName")]
    pub name: String,
    #[serde(default)]
    pub proficiency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewSkill {
    #[serde(rename = "skillName")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proficiency: Option<String>,
}

/// Response of the completion endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCompletion {
    #[serde(alias = "completion", alias = "percentage")]
    pub completion_percentage: i64,
}

impl ProfileCompletion {
    /// Percentage clamped into `[0, 100]`.
    pub fn clamped(&self) -> u8 {
        self.completion_percentage.clamp(0, 100) as u8
    }
}
