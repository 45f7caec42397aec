//! Profile aggregate: base profile, work history, education, skills and
//! the completion score, kept consistent across mutations.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use jobboard_client::{ApiClient, ApiError};
use jobboard_models::{
    Education, EmployerProfile, JobseekerProfile, NewEducation, NewSkill, NewWorkExperience,
    ProfileKind, Skill, ValidationError, WorkExperience,
};
use tracing::{debug, info, warn};

use crate::error::{ProfileError, ProfileResult};
use crate::session::SessionStore;

/// Everything known about the signed-in user's profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileAggregate {
    /// Jobseeker or employer branch; `None` when no profile exists yet.
    pub profile: Option<ProfileKind>,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    /// Unique by `skill_id`.
    pub skills: Vec<Skill>,
    /// Always within `[0, 100]`.
    pub completion_percentage: u8,
}

/// Operations tracked for loading and error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileOp {
    LoadAll,
    CreateProfile,
    UpdateProfile,
    AddWorkExperience,
    UpdateWorkExperience,
    DeleteWorkExperience,
    AddEducation,
    UpdateEducation,
    DeleteEducation,
    AddSkill,
    RemoveSkill,
    Completion,
}

#[derive(Default)]
struct Inner {
    aggregate: ProfileAggregate,
    errors: HashMap<ProfileOp, String>,
    loading: HashSet<ProfileOp>,
    last_error: Option<String>,
    /// Bumped by `reset`; responses from an older generation are dropped.
    generation: u64,
}

pub struct ProfileStore {
    client: Arc<ApiClient>,
    session: Arc<SessionStore>,
    inner: Mutex<Inner>,
}

impl ProfileStore {
    pub fn new(client: Arc<ApiClient>, session: Arc<SessionStore>) -> Self {
        Self {
            client,
            session,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn aggregate(&self) -> ProfileAggregate {
        self.inner().aggregate.clone()
    }

    pub fn profile(&self) -> Option<ProfileKind> {
        self.inner().aggregate.profile.clone()
    }

    pub fn work_experience(&self) -> Vec<WorkExperience> {
        self.inner().aggregate.work_experience.clone()
    }

    pub fn education(&self) -> Vec<Education> {
        self.inner().aggregate.education.clone()
    }

    pub fn skills(&self) -> Vec<Skill> {
        self.inner().aggregate.skills.clone()
    }

    pub fn completion_percentage(&self) -> u8 {
        self.inner().aggregate.completion_percentage
    }

    /// Error of the last failed run of `op`, cleared when it next succeeds.
    pub fn error(&self, op: ProfileOp) -> Option<String> {
        self.inner().errors.get(&op).cloned()
    }

    pub fn is_loading(&self, op: ProfileOp) -> bool {
        self.inner().loading.contains(&op)
    }

    /// Most recent failure of any operation.
    pub fn last_error(&self) -> Option<String> {
        self.inner().last_error.clone()
    }

    /// Drop all profile data, e.g. on logout. Requests still in flight
    /// no longer update the store when they finish.
    pub fn reset(&self) {
        let mut inner = self.inner();
        let generation = inner.generation + 1;
        *inner = Inner {
            generation,
            ..Inner::default()
        };
    }

    /// Apply `update` unless the store was reset since `generation`.
    fn commit(&self, generation: u64, update: impl FnOnce(&mut ProfileAggregate)) {
        let mut inner = self.inner();
        if inner.generation != generation {
            debug!(generation, "Discarding profile response from before reset");
            return;
        }
        update(&mut inner.aggregate);
    }

    /// Run `op` with the session token and the current generation,
    /// tracking loading and error state.
    async fn run<T, F, Fut>(&self, op: ProfileOp, f: F) -> ProfileResult<T>
    where
        F: FnOnce(String, u64) -> Fut,
        Fut: Future<Output = ProfileResult<T>>,
    {
        let token = self.session.token().ok_or(ProfileError::NotAuthenticated)?;
        let generation = {
            let mut inner = self.inner();
            inner.loading.insert(op);
            inner.generation
        };
        let _loading = scopeguard::guard((), |_| {
            self.inner().loading.remove(&op);
        });

        let result = f(token, generation).await;

        let mut inner = self.inner();
        if inner.generation != generation {
            return result;
        }
        match &result {
            Ok(_) => {
                inner.errors.remove(&op);
            }
            Err(e) => {
                warn!(op = ?op, "Profile operation failed: {}", e);
                let message = e.user_message();
                inner.errors.insert(op, message.clone());
                inner.last_error = Some(message);
            }
        }
        result
    }

    /// Load the jobseeker profile, or the employer profile when there is
    /// none. No profile at all is a valid empty state.
    pub async fn load_all(&self) -> ProfileResult<()> {
        self.run(ProfileOp::LoadAll, |token, generation| async move {
            self.load_all_with(&token, generation).await
        })
        .await
    }

    async fn load_all_with(&self, token: &str, generation: u64) -> ProfileResult<()> {
        match self.client.jobseeker_profile(token).await {
            Ok(profile) => {
                self.commit(generation, |agg| {
                    agg.profile = Some(ProfileKind::Jobseeker(profile))
                });
                return self.load_jobseeker_collections(token, generation).await;
            }
            Err(e) if e.is_not_found() => debug!("No jobseeker profile, trying employer"),
            Err(e) => return Err(e.into()),
        }

        match self.client.employer_profile(token).await {
            Ok(profile) => {
                self.commit(generation, |agg| {
                    *agg = ProfileAggregate {
                        profile: Some(ProfileKind::Employer(profile)),
                        ..Default::default()
                    }
                });
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!("No profile yet");
                self.commit(generation, |agg| *agg = ProfileAggregate::default());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch the jobseeker sub-collections concurrently. Each successful
    /// part is applied even when another fails.
    async fn load_jobseeker_collections(&self, token: &str, generation: u64) -> ProfileResult<()> {
        let (experience, education, skills, completion) = tokio::join!(
            self.client.work_experience(token),
            self.client.education(token),
            self.client.skills(token),
            self.client.profile_completion(token),
        );

        let mut first_error: Option<ApiError> = None;
        self.commit(generation, |agg| {
            match experience {
                Ok(list) => agg.work_experience = list,
                Err(e) => first_error = first_error.take().or(Some(e)),
            }
            match education {
                Ok(list) => agg.education = list,
                Err(e) => first_error = first_error.take().or(Some(e)),
            }
            match skills {
                Ok(list) => agg.skills = dedup_skills(list),
                Err(e) => first_error = first_error.take().or(Some(e)),
            }
            match completion {
                Ok(c) => agg.completion_percentage = c.clamped(),
                Err(e) => first_error = first_error.take().or(Some(e)),
            }
        });

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub async fn refresh_completion(&self) -> ProfileResult<u8> {
        self.run(ProfileOp::Completion, |token, generation| async move {
            let completion = self.client.profile_completion(&token).await?.clamped();
            self.commit(generation, |agg| agg.completion_percentage = completion);
            Ok(completion)
        })
        .await
    }

    /// Completion refresh after a committed mutation. Its failure is
    /// recorded but does not fail the mutation.
    async fn refresh_completion_after_mutation(&self) {
        if let Err(e) = self.refresh_completion().await {
            debug!("Completion refresh after mutation failed: {}", e);
        }
    }

    pub async fn create_jobseeker_profile(&self, data: &JobseekerProfile) -> ProfileResult<JobseekerProfile> {
        let created = self
            .run(ProfileOp::CreateProfile, |token, _| async move {
                Ok(self.client.create_jobseeker_profile(&token, data).await?)
            })
            .await?;
        info!("Jobseeker profile created");
        // Populates the collections and the completion score.
        if let Err(e) = self.load_all().await {
            debug!("Reload after profile creation failed: {}", e);
        }
        Ok(created)
    }

    pub async fn update_jobseeker_profile(&self, data: &JobseekerProfile) -> ProfileResult<JobseekerProfile> {
        let updated = self
            .run(ProfileOp::UpdateProfile, |token, generation| async move {
                let updated = self.client.update_jobseeker_profile(&token, data).await?;
                self.commit(generation, |agg| {
                    agg.profile = Some(ProfileKind::Jobseeker(updated.clone()))
                });
                Ok(updated)
            })
            .await?;
        self.refresh_completion_after_mutation().await;
        Ok(updated)
    }

    pub async fn create_employer_profile(&self, data: &EmployerProfile) -> ProfileResult<EmployerProfile> {
        self.run(ProfileOp::CreateProfile, |token, generation| async move {
            let created = self.client.create_employer_profile(&token, data).await?;
            self.commit(generation, |agg| {
                agg.profile = Some(ProfileKind::Employer(created.clone()))
            });
            Ok(created)
        })
        .await
    }

    pub async fn update_employer_profile(&self, data: &EmployerProfile) -> ProfileResult<EmployerProfile> {
        self.run(ProfileOp::UpdateProfile, |token, generation| async move {
            let updated = self.client.update_employer_profile(&token, data).await?;
            self.commit(generation, |agg| {
                agg.profile = Some(ProfileKind::Employer(updated.clone()))
            });
            Ok(updated)
        })
        .await
    }

    /// Add an entry, then adopt the server's canonical list.
    pub async fn add_work_experience(&self, entry: &NewWorkExperience) -> ProfileResult<()> {
        validate_experience(entry)?;
        self.run(ProfileOp::AddWorkExperience, |token, generation| async move {
            self.client.add_work_experience(&token, entry).await?;
            self.reload_work_experience(&token, generation).await
        })
        .await?;
        self.refresh_completion_after_mutation().await;
        Ok(())
    }

    pub async fn update_work_experience(&self, id: i64, entry: &NewWorkExperience) -> ProfileResult<()> {
        validate_experience(entry)?;
        self.run(ProfileOp::UpdateWorkExperience, |token, generation| async move {
            self.client.update_work_experience(&token, id, entry).await?;
            self.reload_work_experience(&token, generation).await
        })
        .await?;
        self.refresh_completion_after_mutation().await;
        Ok(())
    }

    /// Remove locally only once the server confirmed the delete.
    pub async fn delete_work_experience(&self, id: i64) -> ProfileResult<()> {
        self.run(ProfileOp::DeleteWorkExperience, |token, generation| async move {
            self.client.delete_work_experience(&token, id).await?;
            self.commit(generation, |agg| agg.work_experience.retain(|w| w.id != id));
            Ok(())
        })
        .await?;
        self.refresh_completion_after_mutation().await;
        Ok(())
    }

    async fn reload_work_experience(&self, token: &str, generation: u64) -> ProfileResult<()> {
        let list = self.client.work_experience(token).await?;
        self.commit(generation, |agg| agg.work_experience = list);
        Ok(())
    }

    pub async fn add_education(&self, entry: &NewEducation) -> ProfileResult<()> {
        validate_education(entry)?;
        self.run(ProfileOp::AddEducation, |token, generation| async move {
            self.client.add_education(&token, entry).await?;
            self.reload_education(&token, generation).await
        })
        .await?;
        self.refresh_completion_after_mutation().await;
        Ok(())
    }

    pub async fn update_education(&self, id: i64, entry: &NewEducation) -> ProfileResult<()> {
        validate_education(entry)?;
        self.run(ProfileOp::UpdateEducation, |token, generation| async move {
            self.client.update_education(&token, id, entry).await?;
            self.reload_education(&token, generation).await
        })
        .await?;
        self.refresh_completion_after_mutation().await;
        Ok(())
    }

    pub async fn delete_education(&self, id: i64) -> ProfileResult<()> {
        self.run(ProfileOp::DeleteEducation, |token, generation| async move {
            self.client.delete_education(&token, id).await?;
            self.commit(generation, |agg| agg.education.retain(|e| e.id != id));
            Ok(())
        })
        .await?;
        self.refresh_completion_after_mutation().await;
        Ok(())
    }

    async fn reload_education(&self, token: &str, generation: u64) -> ProfileResult<()> {
        let list = self.client.education(token).await?;
        self.commit(generation, |agg| agg.education = list);
        Ok(())
    }

    /// Append the created skill locally, then refresh completion.
    pub async fn add_skill(&self, skill: &NewSkill) -> ProfileResult<Skill> {
        if skill.name.trim().is_empty() {
            return Err(ValidationError::Required { field: "skill name" }.into());
        }
        let created = self
            .run(ProfileOp::AddSkill, |token, generation| async move {
                let created = self.client.add_skill(&token, skill).await?;
                self.commit(generation, |agg| {
                    agg.skills.retain(|s| s.skill_id != created.skill_id);
                    agg.skills.push(created.clone());
                });
                Ok(created)
            })
            .await?;
        self.refresh_completion_after_mutation().await;
        Ok(created)
    }

    pub async fn remove_skill(&self, skill_id: i64) -> ProfileResult<()> {
        self.run(ProfileOp::RemoveSkill, |token, generation| async move {
            self.client.remove_skill(&token, skill_id).await?;
            self.commit(generation, |agg| agg.skills.retain(|s| s.skill_id != skill_id));
            Ok(())
        })
        .await?;
        self.refresh_completion_after_mutation().await;
        Ok(())
    }
}

fn dedup_skills(skills: Vec<Skill>) -> Vec<Skill> {
    let mut seen = HashSet::new();
    skills.into_iter().filter(|s| seen.insert(s.skill_id)).collect()
}

fn validate_experience(entry: &NewWorkExperience) -> Result<(), ValidationError> {
    if entry.company_name.trim().is_empty() {
        return Err(ValidationError::Required { field: "company name" });
    }
    if entry.job_title.trim().is_empty() {
        return Err(ValidationError::Required { field: "job title" });
    }
    Ok(())
}

fn validate_education(entry: &NewEducation) -> Result<(), ValidationError> {
    if entry.institution.trim().is_empty() {
        return Err(ValidationError::Required { field: "institution" });
    }
    if entry.degree.trim().is_empty() {
        return Err(ValidationError::Required { field: "degree" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(id: i64, name: &str) -> Skill {
        Skill {
            skill_id: id,
            name: name.to_string(),
            proficiency: None,
        }
    }

    #[test]
    fn test_dedup_skills_keeps_first() {
        let skills = dedup_skills(vec![skill(1, "Rust"), skill(2, "Go"), skill(1, "Rust again")]);
        assert_eq!(skills.len(), 2);
        assert_eq!(skills[0].name, "Rust");
    }

    #[test]
    fn test_entry_validation() {
        assert!(validate_experience(&NewWorkExperience::default()).is_err());
        assert!(validate_education(&NewEducation {
            institution: "IIT".into(),
            degree: "BTech".into(),
            ..Default::default()
        })
        .is_ok());
    }
}
