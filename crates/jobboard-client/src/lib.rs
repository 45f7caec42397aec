//! REST client for the job-board backend services.
//!
//! This crate provides:
//! - One pooled HTTP client addressing the auth/user, profile/company and
//!   job services
//! - A typed error taxonomy; every non-2xx response carries its status,
//!   message and parsed payload
//! - Retry with exponential backoff for idempotent reads
//! - Envelope and pagination normalization at the client boundary
//! - Request metrics and tracing spans

pub mod auth;
pub mod client;
pub mod companies;
pub mod config;
pub mod envelope;
pub mod error;
pub mod jobs;
pub mod metrics;
pub mod profiles;
pub mod retry;
pub mod users;

pub use auth::{LoginChallenge, RegisterRequest, ResetTokenGrant};
pub use client::{ApiClient, Service};
pub use config::ClientConfig;
pub use envelope::{extract_message, normalize_page, unwrap_data};
pub use error::{ApiError, ApiResult, HttpFailure};
pub use jobs::search_query;
pub use retry::RetryConfig;
