//! Client-side state for the job board.
//!
//! This crate provides:
//! - `SessionStore`: bearer token and user lifecycle with durable storage
//! - `OtpFlow`: OTP challenge/response for registration, login, password
//!   reset and phone re-verification
//! - `ProfileStore`: the profile aggregate, kept fresh after mutations
//! - `CompanyDirectory`: company listings and reviews
//! - `JobBoard`: filters, pagination and save/apply actions over server
//!   search or the sample catalog
//!
//! Stores are plain objects built once and passed around behind `Arc`.

pub mod account;
pub mod board;
pub mod companies;
pub mod config;
pub mod error;
pub mod otp;
pub mod profile;
pub mod sample;
pub mod session;
pub mod storage;

pub use account::AccountService;
pub use board::{ActionOutcome, AuthRedirect, BoardMode, BoardOp, JobBoard, ToggleState};
pub use companies::CompanyDirectory;
pub use config::StateConfig;
pub use error::{
    AccountError, AccountResult, CompanyError, CompanyResult, JobBoardError, JobBoardResult,
    OtpError, OtpResult, ProfileError, ProfileResult, StorageError, StorageResult,
};
pub use otp::{OtpFlow, OtpPhase, ResetPhase};
pub use profile::{ProfileAggregate, ProfileOp, ProfileStore};
pub use sample::SampleCatalog;
pub use session::{Session, SessionStore};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, TOKEN_KEY, USER_KEY};
