//! HTTP client core shared by every endpoint group.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::{Client, Method, Response};
use serde_json::Value;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult};
use crate::metrics::record_request;
use crate::retry::with_retry;

// =============================================================================
// Services
// =============================================================================

/// Backend service a request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Registration, login, OTP and account endpoints.
    Auth,
    /// Jobseeker/employer profiles and the company directory.
    Profile,
    /// Job search, saved jobs and applications.
    Job,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Auth => "auth",
            Service::Profile => "profile",
            Service::Job => "job",
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// REST client for the auth, profile and job services.
///
/// The client holds no credentials. Authenticated calls take the bearer
/// token as an argument, read by the caller from the session store.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// Pooled HTTP client shared by every request.
    http: Client,
    /// Base URLs, timeouts and retry policy.
    config: ClientConfig,
}

impl ApiClient {
    /// Create a new API client.
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("jobboard-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ApiError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ApiResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn base_url(&self, service: Service) -> &str {
        match service {
            Service::Auth => &self.config.auth_url,
            Service::Profile => &self.config.profile_url,
            Service::Job => &self.config.job_url,
        }
    }

    pub(crate) fn url(&self, service: Service, path: &str) -> String {
        format!("{}{}", self.base_url(service).trim_end_matches('/'), path)
    }

    // =========================================================================
    // Request Execution
    // =========================================================================

    /// Idempotent read, retried on transient failures.
    pub(crate) async fn get_value(
        &self,
        operation: &'static str,
        service: Service,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> ApiResult<Value> {
        let url = self.url(service, path);
        with_retry(&self.config.retry, operation, || {
            self.execute(operation, Method::GET, &url, query, None, token)
        })
        .await
    }

    /// Mutation; sent exactly once.
    pub(crate) async fn send_value(
        &self,
        operation: &'static str,
        method: Method,
        service: Service,
        path: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> ApiResult<Value> {
        let url = self.url(service, path);
        self.execute(operation, method, &url, &[], body.as_ref(), token)
            .await
    }

    async fn execute(
        &self,
        operation: &str,
        method: Method,
        url: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
        token: Option<&str>,
    ) -> ApiResult<Value> {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!(
            "api_request",
            operation = %operation,
            method = %method,
            request_id = %request_id
        );

        let start = Instant::now();
        let result = async {
            let mut request = self
                .http
                .request(method.clone(), url)
                .header(ACCEPT, "application/json")
                .header("X-Request-Id", &request_id);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            Self::read_response(response).await
        }
        .instrument(span)
        .await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(0),
        };
        record_request(operation, status, latency_ms);

        if let Err(e) = &result {
            debug!(operation = %operation, %method, status, "API request failed: {}", e);
        }

        result
    }

    async fn read_response(response: Response) -> ApiResult<Value> {
        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response.text().await?;

        if status.is_success() {
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&body).map_err(|e| {
                ApiError::invalid_response(format!("{} returned a non-JSON body: {}", status, e))
            });
        }

        Err(ApiError::from_http_status(status.as_u16(), &body, retry_after))
    }
}

/// Retry-After in delta-seconds form. HTTP-date values are ignored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = ApiClient::new(ClientConfig::with_base_url("http://localhost:9000/api/")).unwrap();
        assert_eq!(client.url(Service::Job, "/jobs/1"), "http://localhost:9000/api/jobs/1");
    }

    #[test]
    fn test_services_use_their_own_base_url() {
        let config = ClientConfig {
            auth_url: "http://auth.local".into(),
            profile_url: "http://profile.local".into(),
            job_url: "http://job.local".into(),
            ..Default::default()
        };
        let client = ApiClient::new(config).unwrap();
        assert_eq!(client.url(Service::Auth, "/auth/login"), "http://auth.local/auth/login");
        assert_eq!(client.url(Service::Profile, "/companies"), "http://profile.local/companies");
        assert_eq!(client.url(Service::Job, "/jobs"), "http://job.local/jobs");
    }

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(3)));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"));
        assert_eq!(parse_retry_after(&headers), None);
    }
}
