//! Profile service endpoints: jobseeker and employer profiles and the
//! jobseeker sub-collections.

use jobboard_models::{
    Education, EmployerProfile, JobseekerProfile, NewEducation, NewSkill, NewWorkExperience,
    ProfileCompletion, Skill, WorkExperience,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::client::{ApiClient, Service};
use crate::envelope::{decode, normalize_page};
use crate::error::ApiResult;

const JOBSEEKER: &str = "/profiles/jobseeker";
const EMPLOYER: &str = "/profiles/employer";

impl ApiClient {
    async fn profile_get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        token: &str,
    ) -> ApiResult<T> {
        let value = self
            .get_value(operation, Service::Profile, path, &[], Some(token))
            .await?;
        decode(value)
    }

    async fn profile_list<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        token: &str,
    ) -> ApiResult<Vec<T>> {
        let value = self
            .get_value(operation, Service::Profile, path, &[], Some(token))
            .await?;
        Ok(normalize_page(value)?.items)
    }

    async fn profile_send<B: Serialize, T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: &B,
        token: &str,
    ) -> ApiResult<T> {
        let body = serde_json::to_value(body)?;
        let value = self
            .send_value(operation, method, Service::Profile, path, Some(body), Some(token))
            .await?;
        decode(value)
    }

    async fn profile_delete(&self, operation: &'static str, path: &str, token: &str) -> ApiResult<()> {
        self.send_value(operation, Method::DELETE, Service::Profile, path, None, Some(token))
            .await?;
        Ok(())
    }

    // =========================================================================
    // Jobseeker profile
    // =========================================================================

    /// Fails with `ApiError::NotFound` when the account has no jobseeker profile.
    pub async fn jobseeker_profile(&self, token: &str) -> ApiResult<JobseekerProfile> {
        self.profile_get("jobseeker_profile", &format!("{}/me", JOBSEEKER), token)
            .await
    }

    pub async fn create_jobseeker_profile(
        &self,
        token: &str,
        profile: &JobseekerProfile,
    ) -> ApiResult<JobseekerProfile> {
        self.profile_send("create_jobseeker_profile", Method::POST, JOBSEEKER, profile, token)
            .await
    }

    pub async fn update_jobseeker_profile(
        &self,
        token: &str,
        profile: &JobseekerProfile,
    ) -> ApiResult<JobseekerProfile> {
        self.profile_send(
            "update_jobseeker_profile",
            Method::PUT,
            &format!("{}/me", JOBSEEKER),
            profile,
            token,
        )
        .await
    }

    pub async fn profile_completion(&self, token: &str) -> ApiResult<ProfileCompletion> {
        self.profile_get("profile_completion", &format!("{}/completion", JOBSEEKER), token)
            .await
    }

    // =========================================================================
    // Work experience
    // =========================================================================

    pub async fn work_experience(&self, token: &str) -> ApiResult<Vec<WorkExperience>> {
        self.profile_list("work_experience", &format!("{}/experience", JOBSEEKER), token)
            .await
    }

    pub async fn add_work_experience(
        &self,
        token: &str,
        entry: &NewWorkExperience,
    ) -> ApiResult<WorkExperience> {
        self.profile_send(
            "add_work_experience",
            Method::POST,
            &format!("{}/experience", JOBSEEKER),
            entry,
            token,
        )
        .await
    }

    pub async fn update_work_experience(
        &self,
        token: &str,
        id: i64,
        entry: &NewWorkExperience,
    ) -> ApiResult<WorkExperience> {
        self.profile_send(
            "update_work_experience",
            Method::PUT,
            &format!("{}/experience/{}", JOBSEEKER, id),
            entry,
            token,
        )
        .await
    }

    pub async fn delete_work_experience(&self, token: &str, id: i64) -> ApiResult<()> {
        self.profile_delete("delete_work_experience", &format!("{}/experience/{}", JOBSEEKER, id), token)
            .await
    }

    // =========================================================================
    // Education
    // =========================================================================

    pub async fn education(&self, token: &str) -> ApiResult<Vec<Education>> {
        self.profile_list("education", &format!("{}/education", JOBSEEKER), token)
            .await
    }

    pub async fn add_education(&self, token: &str, entry: &NewEducation) -> ApiResult<Education> {
        self.profile_send(
            "add_education",
            Method::POST,
            &format!("{}/education", JOBSEEKER),
            entry,
            token,
        )
        .await
    }

    pub async fn update_education(
        &self,
        token: &str,
        id: i64,
        entry: &NewEducation,
    ) -> ApiResult<Education> {
        self.profile_send(
            "update_education",
            Method::PUT,
            &format!("{}/education/{}", JOBSEEKER, id),
            entry,
            token,
        )
        .await
    }

    pub async fn delete_education(&self, token: &str, id: i64) -> ApiResult<()> {
        self.profile_delete("delete_education", &format!("{}/education/{}", JOBSEEKER, id), token)
            .await
    }

    // =========================================================================
    // Skills
    // =========================================================================

    pub async fn skills(&self, token: &str) -> ApiResult<Vec<Skill>> {
        self.profile_list("skills", &format!("{}/skills", JOBSEEKER), token)
            .await
    }

    pub async fn add_skill(&self, token: &str, skill: &NewSkill) -> ApiResult<Skill> {
        self.profile_send("add_skill", Method::POST, &format!("{}/skills", JOBSEEKER), skill, token)
            .await
    }

    pub async fn remove_skill(&self, token: &str, skill_id: i64) -> ApiResult<()> {
        self.profile_delete("remove_skill", &format!("{}/skills/{}", JOBSEEKER, skill_id), token)
            .await
    }

    // =========================================================================
    // Employer profile
    // =========================================================================

    /// Fails with `ApiError::NotFound` when the account has no employer profile.
    pub async fn employer_profile(&self, token: &str) -> ApiResult<EmployerProfile> {
        self.profile_get("employer_profile", &format!("{}/me", EMPLOYER), token)
            .await
    }

    pub async fn create_employer_profile(
        &self,
        token: &str,
        profile: &EmployerProfile,
    ) -> ApiResult<EmployerProfile> {
        self.profile_send("create_employer_profile", Method::POST, EMPLOYER, profile, token)
            .await
    }

    pub async fn update_employer_profile(
        &self,
        token: &str,
        profile: &EmployerProfile,
    ) -> ApiResult<EmployerProfile> {
        self.profile_send(
            "update_employer_profile",
            Method::PUT,
            &format!("{}/me", EMPLOYER),
            profile,
            token,
        )
        .await
    }
}
