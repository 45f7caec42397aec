#![allow(dead_code)]

use std::sync::Arc;

use jobboard_client::{ApiClient, ClientConfig, RetryConfig};
use jobboard_state::{MemoryStorage, SessionStore};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn client(server: &MockServer) -> Arc<ApiClient> {
    let mut config = ClientConfig::with_base_url(server.uri());
    config.retry = RetryConfig::disabled();
    Arc::new(ApiClient::new(config).unwrap())
}

pub fn user_json(id: i64) -> Value {
    json!({
        "userId": id,
        "name": "Asha Rao",
        "email": "asha@example.com",
        "phone": "9876543210",
        "userType": "JOBSEEKER",
        "isVerified": true,
        "isActive": true
    })
}

pub fn anonymous_session(server: &MockServer) -> Arc<SessionStore> {
    SessionStore::new(client(server), Arc::new(MemoryStorage::new()))
}

/// A session holding `tok` with its user resolved.
pub async fn signed_in_session(server: &MockServer) -> Arc<SessionStore> {
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(1)))
        .mount(server)
        .await;
    let session = anonymous_session(server);
    session.set_token("tok").await.unwrap();
    assert!(session.is_authenticated());
    session
}

pub fn job_json(id: i64, title: &str, salary: u64) -> Value {
    json!({
        "id": id,
        "title": title,
        "companyName": "Acme",
        "location": "Pune",
        "jobType": "full-time",
        "salary": salary,
        "postedAt": chrono::Utc::now().to_rfc3339()
    })
}
