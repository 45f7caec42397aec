//! Shared data models for the job-board client.
//!
//! This crate provides Serde-serializable types for:
//! - Users, sessions and OTP challenges
//! - Jobseeker and employer profiles with their sub-entities
//! - Jobs, applications and the client-side filter engine
//! - Companies and reviews
//! - Client-side validation gates that never reach the network

pub mod company;
pub mod filter;
pub mod job;
pub mod otp;
pub mod page;
pub mod profile;
pub mod user;
pub mod validation;

// Re-export common types
pub use company::{Company, CompanyReview, NewCompanyReview};
pub use filter::{
    filter_jobs, FilterUpdate, JobFilterCriteria, PostedDate, SalaryRange, SortBy,
};
pub use job::{ApplicationRequest, ApplicationStatus, Job, JobApplication, JobId};
pub use otp::{OtpChallenge, OtpPurpose};
pub use page::Page;
pub use profile::{
    Education, EmployerProfile, JobseekerProfile, NewEducation, NewSkill, NewWorkExperience,
    ProfileCompletion, ProfileKind, Skill, WorkExperience,
};
pub use user::{LoginHistoryEntry, UserPatch, UserRecord, UserType};
pub use validation::{
    mask_phone, normalize_phone, validate_email, validate_otp_code, validate_password,
    ValidationError, MIN_PASSWORD_LEN, OTP_CODE_LEN,
};
