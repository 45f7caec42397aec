//! Integration tests against a mock HTTP server.

use std::time::Duration;

use jobboard_client::{ApiClient, ApiError, ClientConfig, RetryConfig};
use jobboard_models::{
    ApplicationRequest, JobFilterCriteria, NewCompanyReview, OtpPurpose, SortBy,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 2,
        base_delay_ms: 5,
        max_delay_ms: 20,
    }
}

fn client_for(server: &MockServer) -> ApiClient {
    let mut config = ClientConfig::with_base_url(server.uri());
    config.retry = fast_retry();
    ApiClient::new(config).unwrap()
}

#[tokio::test]
async fn test_login_returns_phone_from_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "a@b.co", "password": "secret123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "OTP sent",
            "data": { "phone": "9876543210" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let challenge = client_for(&server).login("a@b.co", "secret123").await.unwrap();
    assert_eq!(challenge.phone, "9876543210");
    assert_eq!(challenge.message.as_deref(), Some("OTP sent"));
}

#[tokio::test]
async fn test_login_failure_keeps_status_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).login("a@b.co", "wrong").await.unwrap_err();
    assert!(matches!(err, ApiError::Auth(_)));
    assert_eq!(err.http_status(), Some(401));
    assert_eq!(err.to_string(), "Invalid credentials");
}

#[tokio::test]
async fn test_verify_login_otp_reads_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/verify-login-otp"))
        .and(body_json(json!({ "phone": "9876543210", "otp": "123456" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "jwt-abc" })))
        .expect(1)
        .mount(&server)
        .await;

    let token = client_for(&server)
        .verify_login_otp("9876543210", "123456")
        .await
        .unwrap();
    assert_eq!(token, "jwt-abc");
}

#[tokio::test]
async fn test_resend_otp_sends_purpose() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/resend-otp"))
        .and(body_json(json!({ "phone": "9876543210", "purpose": "password_reset" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "sent" })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .resend_otp("9876543210", OtpPurpose::PasswordReset)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_verify_reset_otp_prefers_structured_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/verify-reset-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "OTP verified. Reset token: from-message",
            "resetToken": "from-field"
        })))
        .mount(&server)
        .await;

    let grant = client_for(&server)
        .verify_reset_otp("9876543210", "123456")
        .await
        .unwrap();
    assert_eq!(grant.reset_token, "from-field");
    assert!(!grant.from_message);
}

#[tokio::test]
async fn test_verify_reset_otp_falls_back_to_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/verify-reset-otp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "OTP verified. Reset token: tok-42"
        })))
        .mount(&server)
        .await;

    let grant = client_for(&server)
        .verify_reset_otp("9876543210", "123456")
        .await
        .unwrap();
    assert_eq!(grant.reset_token, "tok-42");
    assert!(grant.from_message);
}

#[tokio::test]
async fn test_get_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "userId": 7, "name": "Asha", "email": "asha@example.com", "userType": "JOBSEEKER" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = client_for(&server).current_user("tok").await.unwrap();
    assert_eq!(user.user_id, 7);
    assert_eq!(user.name, "Asha");
}

#[tokio::test]
async fn test_mutations_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs/5/save"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).save_job("tok", 5).await.unwrap_err();
    assert!(matches!(err, ApiError::Server(_)));
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Job not found" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).get_job(99, None).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Job not found");
}

#[tokio::test]
async fn test_request_timeout_maps_to_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/1"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let mut config = ClientConfig::with_base_url(server.uri());
    config.timeout = Duration::from_millis(100);
    config.retry = RetryConfig::disabled();
    let client = ApiClient::new(config).unwrap();

    let err = client.get_job(1, None).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_search_jobs_normalizes_spring_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/search"))
        .and(query_param("keyword", "rust"))
        .and(query_param("page", "1"))
        .and(query_param("size", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                { "id": 3, "title": "Rust Engineer", "companyName": "Acme", "postedAt": "2026-10-01T00:00:00Z" },
                { "id": 4, "title": "Rust SRE", "company": "Initech", "postedDate": "2026-10-02T00:00:00Z" }
            ],
            "number": 1,
            "size": 2,
            "totalElements": 5,
            "totalPages": 3
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut criteria = JobFilterCriteria::default();
    criteria.search = "rust".to_string();
    let page = client_for(&server)
        .search_jobs(&criteria, SortBy::Newest, 1, 2, None)
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[1].company_name, "Initech");
    assert_eq!(page.page, 1);
    assert_eq!(page.total_elements, 5);
    assert_eq!(page.total_pages, 3);
    assert!(page.has_next());
    assert!(page.has_previous());
}

#[tokio::test]
async fn test_saved_jobs_accepts_bare_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/jobs/saved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "title": "Backend", "companyName": "Acme", "postedAt": "2026-10-01T00:00:00Z" }
        ])))
        .mount(&server)
        .await;

    let jobs = client_for(&server).saved_jobs("tok").await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, 1);
}

#[tokio::test]
async fn test_apply_to_job_posts_job_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/applications"))
        .and(body_json(json!({ "jobId": 12, "coverLetter": "Hello" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 90, "jobId": 12, "status": "APPLIED"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ApplicationRequest {
        cover_letter: Some("Hello".to_string()),
        resume_url: None,
    };
    let application = client_for(&server)
        .apply_to_job("tok", 12, &request)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(application.id, 90);
    assert_eq!(application.job_id, 12);
}

#[tokio::test]
async fn test_add_review_posts_to_company() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/companies/1/reviews"))
        .and(body_json(json!({ "rating": 4, "title": "Good team", "anonymous": true })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": 30, "companyId": 1, "rating": 4, "title": "Good team" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let review = NewCompanyReview {
        rating: 4,
        title: Some("Good team".into()),
        pros: None,
        cons: None,
        anonymous: true,
    };
    let created = client_for(&server)
        .add_company_review("tok", 1, &review)
        .await
        .unwrap();
    assert_eq!(created.id, 30);
    assert_eq!(created.rating, 4);
}

#[tokio::test]
async fn test_non_json_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/companies/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).get_company(3, None).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidResponse(_)));
}
