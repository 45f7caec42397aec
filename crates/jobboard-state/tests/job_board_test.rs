mod common;

use chrono::{TimeZone, Utc};
use jobboard_models::{ApplicationRequest, FilterUpdate, SortBy};
use jobboard_state::{
    ActionOutcome, AuthRedirect, BoardMode, BoardOp, JobBoard, JobBoardError, SampleCatalog,
    ToggleState,
};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{anonymous_session, client, job_json, signed_in_session};

fn public_board(server: &MockServer, page_size: u32) -> JobBoard {
    JobBoard::new(
        client(server),
        anonymous_session(server),
        SampleCatalog::builtin(Utc::now()),
        page_size,
    )
}

async fn mount_search(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/jobs/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [job_json(1, "Rust Developer", 1_500_000), job_json(2, "Go Developer", 1_400_000)],
            "number": 0,
            "size": 2,
            "totalElements": 3,
            "totalPages": 2
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_filtered_jobs_is_deterministic() {
    let server = MockServer::start().await;
    let board = public_board(&server, 10);
    let now = Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap();

    for sort in [SortBy::Newest, SortBy::SalaryHigh, SortBy::SalaryLow, SortBy::Relevance] {
        board.set_sort(sort);
        board.update_filters(FilterUpdate::default().search("engineer"));
        assert_eq!(board.filtered_jobs_at(now), board.filtered_jobs_at(now));
    }
}

#[tokio::test]
async fn test_reversed_salary_bounds_are_swapped() {
    let server = MockServer::start().await;
    let board = public_board(&server, 10);

    board.update_filters(FilterUpdate::default().salary_range(2_000_000, 1_000_000));
    let reversed = (board.filters(), board.filtered_jobs());

    board.update_filters(FilterUpdate::default().salary_range(1_000_000, 2_000_000));
    let ordered = (board.filters(), board.filtered_jobs());

    assert_eq!(reversed, ordered);
    assert_eq!(ordered.0.salary_range.min(), 1_000_000);
    assert!(ordered
        .1
        .iter()
        .all(|j| (1_000_000..=2_000_000).contains(&j.salary.unwrap())));
}

#[tokio::test]
async fn test_unauthenticated_save_redirects_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs/42/save"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let board = public_board(&server, 10);
    let outcome = board.save_job(42).await.unwrap();
    assert_eq!(
        outcome,
        ActionOutcome::AuthRequired(AuthRedirect {
            return_to: "/jobs/42".to_string()
        })
    );
    assert!(!board.is_saved(42));

    let outcome = board.apply_to_job(42, &ApplicationRequest::default()).await.unwrap();
    assert!(matches!(outcome, ActionOutcome::AuthRequired(_)));
}

#[tokio::test]
async fn test_sample_mode_pages_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let board = public_board(&server, 3);
    board.search().await.unwrap();
    assert_eq!(board.mode(), BoardMode::Sample);
    assert_eq!(board.visible_jobs().len(), 3);
    assert!(board.has_next_page());
    assert!(!board.has_previous_page());

    board.next_page().await.unwrap();
    board.next_page().await.unwrap();
    assert_eq!(board.current_page(), 2);
    assert_eq!(board.visible_jobs().len(), 2);
    assert!(!board.has_next_page());

    board.next_page().await.unwrap();
    assert_eq!(board.current_page(), 2);

    board.go_to_page(50).await.unwrap();
    assert_eq!(board.current_page(), 2);

    board.previous_page().await.unwrap();
    assert_eq!(board.current_page(), 1);
    assert!(board.has_previous_page());
}

#[tokio::test]
async fn test_filter_edits_do_not_fetch() {
    let server = MockServer::start().await;
    let session = signed_in_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/jobs/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let board = JobBoard::new(client(&server), session, SampleCatalog::default(), 10);
    board.update_filters(FilterUpdate::default().search("r"));
    board.update_filters(FilterUpdate::default().search("ru"));
    board.update_filters(FilterUpdate::default().search("rust").remote(true));
    board.set_sort(SortBy::SalaryHigh);

    board.search().await.unwrap();
    assert_eq!(board.mode(), BoardMode::Server);
}

#[tokio::test]
async fn test_server_mode_uses_page_metadata() {
    let server = MockServer::start().await;
    let session = signed_in_session(&server).await;
    mount_search(&server).await;

    let board = JobBoard::new(client(&server), session, SampleCatalog::default(), 2);
    board.search().await.unwrap();

    assert_eq!(board.mode(), BoardMode::Server);
    assert_eq!(board.visible_jobs().len(), 2);
    assert_eq!(board.total_jobs(), 3);
    assert!(board.has_next_page());
    assert!(!board.has_previous_page());
}

#[tokio::test]
async fn test_server_results_are_shown_as_returned() {
    let server = MockServer::start().await;
    let session = signed_in_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/jobs/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [
                {
                    "id": 11,
                    "title": "Backend Engineer",
                    "companyName": "Acme",
                    "requirements": "Rust, tokio",
                    "salaryMin": 900_000,
                    "salaryMax": 1_400_000,
                    "postedAt": "2026-10-01T00:00:00Z"
                },
                job_json(12, "Systems Engineer", 900_000),
                job_json(13, "Platform Engineer", 1_300_000)
            ],
            "number": 0,
            "size": 10,
            "totalElements": 3,
            "totalPages": 1
        })))
        .mount(&server)
        .await;

    let board = JobBoard::new(client(&server), session, SampleCatalog::default(), 10);
    board.update_filters(
        FilterUpdate::default()
            .search("rust")
            .salary_range(800_000, 1_500_000),
    );
    board.set_sort(SortBy::SalaryLow);
    board.search().await.unwrap();

    let ids: Vec<i64> = board.visible_jobs().iter().map(|j| j.id).collect();
    assert_eq!(ids, vec![11, 12, 13]);
    assert_eq!(board.total_jobs(), 3);
    assert_eq!(board.filtered_jobs().len(), 3);
}

#[tokio::test]
async fn test_search_sends_criteria() {
    let server = MockServer::start().await;
    let session = signed_in_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/jobs/search"))
        .and(query_param("keyword", "rust"))
        .and(query_param("location", "Pune"))
        .and(query_param("page", "0"))
        .and(query_param("size", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [], "totalPages": 0 })))
        .expect(1)
        .mount(&server)
        .await;

    let board = JobBoard::new(client(&server), session, SampleCatalog::default(), 5);
    board.update_filters(FilterUpdate::default().search("rust").location("Pune"));
    board.search().await.unwrap();
    assert!(board.visible_jobs().is_empty());
    assert!(!board.has_next_page());
}

#[tokio::test]
async fn test_failed_save_reverts_to_previous_state() {
    let server = MockServer::start().await;
    let session = signed_in_session(&server).await;
    mount_search(&server).await;
    Mock::given(method("POST"))
        .and(path("/jobs/1/save"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "message": "Try again later" })))
        .expect(1)
        .mount(&server)
        .await;

    let board = JobBoard::new(client(&server), session, SampleCatalog::default(), 2);
    board.search().await.unwrap();

    let err = board.save_job(1).await.unwrap_err();
    assert!(matches!(err, JobBoardError::Api(_)));
    assert_eq!(board.saved_state(1), ToggleState::Confirmed(false));
    assert!(board.visible_jobs().iter().all(|j| !j.saved));
    assert_eq!(board.error(BoardOp::Save).as_deref(), Some("Try again later"));
}

#[tokio::test]
async fn test_save_then_unsave() {
    let server = MockServer::start().await;
    let session = signed_in_session(&server).await;
    mount_search(&server).await;
    Mock::given(method("POST"))
        .and(path("/jobs/2/save"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/jobs/2/save"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let board = JobBoard::new(client(&server), session, SampleCatalog::default(), 2);
    board.search().await.unwrap();

    assert_eq!(board.save_job(2).await.unwrap(), ActionOutcome::Completed);
    assert!(board.is_saved(2));
    assert!(board.filtered_jobs().iter().any(|j| j.id == 2 && j.saved));

    board.unsave_job(2).await.unwrap();
    assert_eq!(board.saved_state(2), ToggleState::Confirmed(false));
}

#[tokio::test]
async fn test_apply_marks_job_applied_and_blocks_repeat() {
    let server = MockServer::start().await;
    let session = signed_in_session(&server).await;
    mount_search(&server).await;
    Mock::given(method("POST"))
        .and(path("/applications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": 77, "jobId": 1, "status": "APPLIED" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let board = JobBoard::new(client(&server), session, SampleCatalog::default(), 2);
    board.search().await.unwrap();

    let request = ApplicationRequest {
        cover_letter: Some("I build services in Rust.".into()),
        resume_url: None,
    };
    assert_eq!(board.apply_to_job(1, &request).await.unwrap(), ActionOutcome::Completed);
    assert_eq!(board.application_state(1), ToggleState::Confirmed(true));
    assert!(board.visible_jobs().iter().any(|j| j.id == 1 && j.applied));
    assert_eq!(board.application(1).map(|a| a.id), Some(77));

    assert!(matches!(
        board.apply_to_job(1, &request).await.unwrap_err(),
        JobBoardError::AlreadyApplied(1)
    ));
}

#[tokio::test]
async fn test_load_saved_jobs_confirms_flags() {
    let server = MockServer::start().await;
    let session = signed_in_session(&server).await;
    Mock::given(method("GET"))
        .and(path("/jobs/saved"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [job_json(5, "SRE", 1_000_000)],
            "totalElements": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let board = JobBoard::new(client(&server), session, SampleCatalog::default(), 10);
    let saved = board.load_saved_jobs().await.unwrap();
    assert_eq!(saved.len(), 1);
    assert!(board.is_saved(5));
    assert!(!board.is_saved(6));
}
