mod support;

use std::sync::Arc;
use std::time::Duration;

use insur::auth::{
    AuthError, AuthEvent, FileSessionStore, MemorySessionStore, SessionStore, SessionStoreConfig,
};
use insur::config::ClientConfig;
use insur::error::InsurError;
use insur::http::{ApiClient, RequestBody, RequestOptions};
use pretty_assertions::assert_eq;
use reqwest::Method;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{
    bearer, client, client_with_refresher, config_for, expired_jwt, fresh_jwt, session,
    CountingRefresher, EventLog,
};

async fn mount_refresh(server: &MockServer, refresh_token: &str, new_token: &str, calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({ "refreshToken": refresh_token })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": new_token })))
        .expect(calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn request_without_token_is_sent_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/policies/public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, Arc::new(MemorySessionStore::new()));
    let body: Value = api.get("/api/policies/public").await.expect("request succeeds");

    assert_eq!(body, json!([{ "id": 1 }]));
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests
        .iter()
        .all(|request| request.headers.get("authorization").is_none()));
}

#[tokio::test]
async fn valid_token_is_attached_verbatim() {
    let server = MockServer::start().await;
    let token = fresh_jwt("jdoe");
    Mock::given(method("GET"))
        .and(path("/api/claims"))
        .and(header("authorization", bearer(&token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", "unused", 0).await;

    let api = client(&server, session(&token, "r1"));
    let body: Value = api.get("/api/claims").await.expect("request succeeds");

    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn expired_token_is_refreshed_before_sending() {
    let server = MockServer::start().await;
    let new_token = fresh_jwt("jdoe-renewed");
    mount_refresh(&server, "r1", &new_token, 1).await;
    Mock::given(method("GET"))
        .and(path("/api/claims"))
        .and(header("authorization", bearer(&new_token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 9 }])))
        .expect(2)
        .mount(&server)
        .await;

    let store = session(&expired_jwt("jdoe"), "r1");
    let api = client(&server, store.clone());
    let events = EventLog::attach(&api);

    let body: Value = api.get("/api/claims").await.expect("first request succeeds");
    assert_eq!(body, json!([{ "id": 9 }]));
    assert_eq!(
        store.access_token().unwrap().map(|t| t.into_inner()),
        Some(new_token.clone())
    );

    // The stored token is picked up as-is; no second refresh.
    let _: Value = api.get("/api/claims").await.expect("second request succeeds");
    assert_eq!(events.events(), vec![AuthEvent::TokenRefreshed]);
}

#[tokio::test]
async fn revoked_token_gets_one_refresh_and_retry() {
    let server = MockServer::start().await;
    let old_token = fresh_jwt("jdoe");
    let new_token = fresh_jwt("jdoe-renewed");
    Mock::given(method("GET"))
        .and(path("/api/user-policies/user"))
        .and(header("authorization", bearer(&old_token).as_str()))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user-policies/user"))
        .and(header("authorization", bearer(&new_token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 4 }])))
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", &new_token, 1).await;

    let api = client(&server, session(&old_token, "r1"));
    let body: Value = api
        .get("/api/user-policies/user")
        .await
        .expect("retry succeeds");

    assert_eq!(body, json!([{ "id": 4 }]));
}

#[tokio::test]
async fn refresh_failure_never_sends_original_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/claims"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = session(&expired_jwt("jdoe"), "r1");
    let refresher = CountingRefresher::failing(AuthError::Network("connection reset".into()));
    let api = client_with_refresher(&server, store.clone(), refresher.clone());
    let events = EventLog::attach(&api);

    let err = api.get::<Value>("/api/claims").await.unwrap_err();

    assert!(matches!(err, InsurError::Auth(AuthError::Network(_))));
    assert!(err.requires_login());
    assert_eq!(refresher.calls(), 1);
    assert!(store.access_token().unwrap().is_none());
    assert!(store.refresh_token().unwrap().is_none());
    assert_eq!(events.session_expired_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_share_a_single_refresh() {
    let server = MockServer::start().await;
    let new_token = fresh_jwt("jdoe-renewed");
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": new_token }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/claims"))
        .and(header("authorization", bearer(&new_token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(3)
        .mount(&server)
        .await;

    let api = client(&server, session(&expired_jwt("jdoe"), "r1"));
    let (a, b, c) = tokio::join!(
        api.get::<Value>("/api/claims"),
        api.get::<Value>("/api/claims"),
        api.get::<Value>("/api/claims"),
    );

    assert!(a.is_ok() && b.is_ok() && c.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_tasks_with_injected_refresher_refresh_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/claims/all"))
        .and(header("authorization", "Bearer renewed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(8)
        .mount(&server)
        .await;

    let refresher = CountingRefresher::slow("renewed", Duration::from_millis(150));
    let api = client_with_refresher(
        &server,
        session(&expired_jwt("admin"), "r1"),
        refresher.clone(),
    );

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let api = api.clone();
            tokio::spawn(async move { api.get::<Value>("/api/claims/all").await })
        })
        .collect();
    for task in tasks {
        task.await.expect("task joins").expect("request succeeds");
    }

    assert_eq!(refresher.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unauthorized_responses_share_one_refresh() {
    let server = MockServer::start().await;
    let stale = fresh_jwt("jdoe");
    for (id, delay_ms) in [(1, 0), (2, 300), (3, 600)] {
        Mock::given(method("GET"))
            .and(path(format!("/api/claims/{id}")))
            .and(header("authorization", bearer(&stale).as_str()))
            .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(delay_ms)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/api/claims/{id}")))
            .and(header("authorization", "Bearer renewed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": id })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let refresher = CountingRefresher::slow("renewed", Duration::from_millis(50));
    let store = session(&stale, "r1");
    let api = client_with_refresher(&server, store.clone(), refresher.clone());
    let events = EventLog::attach(&api);

    let (a, b, c) = tokio::join!(
        api.get::<Value>("/api/claims/1"),
        api.get::<Value>("/api/claims/2"),
        api.get::<Value>("/api/claims/3"),
    );

    assert_eq!(a.expect("first request"), json!({ "id": 1 }));
    assert_eq!(b.expect("second request"), json!({ "id": 2 }));
    assert_eq!(c.expect("third request"), json!({ "id": 3 }));
    assert_eq!(refresher.calls(), 1);
    assert_eq!(store.access_token().unwrap().unwrap().as_str(), "renewed");
    assert_eq!(events.session_expired_count(), 0);
}

#[tokio::test]
async fn persistent_unauthorized_retries_only_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/claims"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", &fresh_jwt("jdoe-renewed"), 1).await;

    let store = session(&fresh_jwt("jdoe"), "r1");
    let api = client(&server, store.clone());
    let events = EventLog::attach(&api);

    let err = api.get::<Value>("/api/claims").await.unwrap_err();

    assert!(matches!(err, InsurError::Auth(AuthError::Unauthorized)));
    assert!(store.access_token().unwrap().is_none());
    assert_eq!(events.session_expired_count(), 1);
}

#[tokio::test]
async fn refresh_rejected_on_unauthorized_path_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/claims"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let store = session(&fresh_jwt("jdoe"), "r1");
    let api = client(&server, store.clone());
    let events = EventLog::attach(&api);

    let err = api.get::<Value>("/api/claims").await.unwrap_err();

    assert!(matches!(err, InsurError::Auth(AuthError::RefreshFailed(_))));
    assert!(store.access_token().unwrap().is_none());
    assert_eq!(events.session_expired_count(), 1);
}

#[tokio::test]
async fn missing_refresh_token_fails_as_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/claims"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::with_token(expired_jwt("jdoe")));
    let api = client(&server, store.clone());

    let err = api.get::<Value>("/api/claims").await.unwrap_err();

    assert!(matches!(err, InsurError::Auth(AuthError::NoRefreshToken)));
    assert!(store.access_token().unwrap().is_none());
}

#[tokio::test]
async fn anonymous_requests_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_refresh(&server, "r1", "unused", 0).await;

    let api = client(&server, session(&fresh_jwt("jdoe"), "r1"));
    let err = api
        .request(
            Method::POST,
            "/api/auth/login",
            RequestBody::Json(json!({ "username": "jdoe", "password": "bad" })),
            RequestOptions::anonymous(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(err.payload_message(), Some("Invalid credentials"));
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn error_status_carries_parsed_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/claims/404"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Claim not found" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/claims/500"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let api = client(&server, session(&fresh_jwt("jdoe"), "r1"));

    match api.get::<Value>("/api/claims/404").await.unwrap_err() {
        InsurError::Http { status, payload } => {
            assert_eq!(status, 404);
            assert_eq!(payload, Some(json!({ "message": "Claim not found" })));
        }
        other => panic!("expected Http, got {other:?}"),
    }
    let err = api.get::<Value>("/api/claims/500").await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.message(), "upstream exploded");
}

#[tokio::test]
async fn empty_and_text_bodies_are_parsed_leniently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/claims/3/reject"))
        .and(query_param("reason", "duplicate"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&server)
        .await;

    let api = client(&server, session(&fresh_jwt("admin"), "r1"));

    let empty = api
        .request(
            Method::POST,
            "/api/claims/3/reject",
            RequestBody::Empty,
            RequestOptions::query([("reason", "duplicate")]),
        )
        .await
        .expect("empty body accepted");
    assert_eq!(empty, Value::Null);

    let text: Value = api.get("/api/health").await.expect("text body accepted");
    assert_eq!(text, Value::String("OK".into()));
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let config = ClientConfig::default()
        .with_base_url("http://127.0.0.1:1")
        .unwrap()
        .with_timeout(Duration::from_secs(2));
    let api = ApiClient::with_store(&config, Arc::new(MemorySessionStore::new())).unwrap();

    let err = api.get::<Value>("/api/claims").await.unwrap_err();

    assert!(matches!(err, InsurError::Network(_)));
    assert_eq!(err.category(), insur::error::ErrorCategory::Network);
}

#[tokio::test]
async fn request_past_its_timeout_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/claims"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let api = client(&server, session(&fresh_jwt("jdoe"), "r1"));
    let options = RequestOptions::builder()
        .timeout(Duration::from_millis(200))
        .build();

    let err = api
        .request(Method::GET, "/api/claims", RequestBody::Empty, options)
        .await
        .unwrap_err();

    assert!(matches!(err, InsurError::Network(_)));
}

#[tokio::test]
async fn corrupt_session_file_is_cleared_and_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/claims"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = Arc::new(FileSessionStore::new(SessionStoreConfig::new(
        dir.path().to_path_buf(),
    )));
    std::fs::write(store.path(), "slots = [not toml").unwrap();
    let api = ApiClient::with_store(&config_for(&server), store.clone()).unwrap();
    let events = EventLog::attach(&api);

    let err = api.get::<Value>("/api/claims").await.unwrap_err();

    assert!(matches!(err, InsurError::Auth(AuthError::Serialization(_))));
    assert_eq!(events.session_expired_count(), 1);
    assert!(!store.path().exists());

    let body: Value = api.get("/api/claims").await.expect("session reset");
    assert_eq!(body, json!([]));
}
