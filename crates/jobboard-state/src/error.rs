//! Error types for the stores.

use jobboard_client::ApiError;
use jobboard_models::{JobId, OtpPurpose, ValidationError};
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;
pub type OtpResult<T> = Result<T, OtpError>;
pub type ProfileResult<T> = Result<T, ProfileError>;
pub type AccountResult<T> = Result<T, AccountError>;
pub type JobBoardResult<T> = Result<T, JobBoardError>;
pub type CompanyResult<T> = Result<T, CompanyError>;

/// Durable session storage failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt storage file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failures of the OTP-based credential flows.
///
/// Server messages are carried verbatim so they can be shown as-is.
#[derive(Debug, Error)]
pub enum OtpError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    InvalidCredentials(String),

    #[error("{0}")]
    AccountInactive(String),

    #[error("{0}")]
    DuplicateEmail(String),

    #[error("{message}")]
    InvalidOrExpiredOtp {
        message: String,
        /// The server invalidated the challenge; a new code is needed.
        resend_required: bool,
    },

    #[error("{0}")]
    InvalidResetToken(String),

    #[error("A request for this step is already in progress")]
    RequestInFlight,

    #[error("No verification code was requested for this number")]
    NoActiveChallenge,

    #[error("The code was requested for a different number or purpose")]
    ChallengeMismatch,

    #[error("Please wait {remaining_secs}s before requesting another code")]
    ResendCooldown { remaining_secs: u64 },

    #[error("OTP purpose {0} is verified through its own operation")]
    UnsupportedPurpose(OtpPurpose),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl OtpError {
    /// True when the user should be told to request a new code.
    pub fn resend_required(&self) -> bool {
        matches!(
            self,
            OtpError::InvalidOrExpiredOtp {
                resend_required: true,
                ..
            }
        )
    }

    /// Validation failures are shown inline, never through the API error channel.
    pub fn is_validation(&self) -> bool {
        matches!(self, OtpError::Validation(_))
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ProfileError {
    pub fn user_message(&self) -> String {
        match self {
            ProfileError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Error)]
pub enum CompanyError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, Error)]
pub enum JobBoardError {
    #[error("Not signed in")]
    NotAuthenticated,

    #[error("An update for job {0} is already in progress")]
    ActionInFlight(JobId),

    #[error("You have already applied to job {0}")]
    AlreadyApplied(JobId),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl JobBoardError {
    pub fn user_message(&self) -> String {
        match self {
            JobBoardError::Api(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}
