mod common;

use common::{call_tool, platform_ok, server_for};
use serde_json::json;
use sim_mcp::errors::ErrorCode;
use sim_mcp::services::credential_store::CredentialStore;
use sim_mcp::services::logger::{LogLevel, Logger};
use sim_mcp::services::operation::{OperationDescriptor, Outcome};
use sim_mcp::services::sim_client::SimClient;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_partial_json(json!({"username": "alice", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(platform_ok(json!({"token": token}))))
        .mount(server)
        .await;
}

fn client_for(base_url: &str) -> (SimClient, Arc<CredentialStore>) {
    let store = Arc::new(CredentialStore::new());
    let client = SimClient::new(
        Logger::new("test", LogLevel::Error),
        &common::settings_for(base_url),
        store.clone(),
    )
    .expect("client");
    (client, store)
}

#[tokio::test]
async fn expired_session_is_cleared_and_never_resent() {
    let server = MockServer::start().await;
    mount_login(&server, "T1").await;
    Mock::given(method("GET"))
        .and(path("/api/case/queryCaseDetails"))
        .and(header("Authorization", "T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(platform_ok(json!({"id": 7}))))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/case/queryCaseDetails"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_for(&server.uri());
    let details = OperationDescriptor::get("/api/case/queryCaseDetails").with_query("caseId", "7");

    assert!(client.login("alice", "pw").await.is_success());
    assert_eq!(store.token().as_deref(), Some("T1"));

    match client.execute(&details, true).await {
        Outcome::Success(data) => assert_eq!(data, json!({"id": 7})),
        other => panic!("expected success, got {:?}", other),
    }

    assert_eq!(client.execute(&details, true).await, Outcome::AuthRequired);
    assert!(store.token().is_none());
    assert!(!store.is_authenticated());

    // No third request reaches the platform; the mocks' expect counts enforce it.
    assert_eq!(client.execute(&details, true).await, Outcome::AuthRequired);
}

#[tokio::test]
async fn protected_call_without_session_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(platform_ok(json!([]))))
        .expect(0)
        .mount(&server)
        .await;

    let (client, store) = client_for(&server.uri());
    let op = OperationDescriptor::post("/api/case/queryCasesList").with_body(json!({"pageIndex": 1}));
    assert_eq!(client.execute(&op, true).await, Outcome::AuthRequired);
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn clearing_an_already_cleared_store_changes_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/case/deleteCase"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_for(&server.uri());
    store.set_session("T9", "bob");
    let op = OperationDescriptor::delete("/api/case/deleteCase").with_query("caseId", "3");
    assert_eq!(client.execute(&op, true).await, Outcome::AuthRequired);
    assert!(store.session().is_none());

    store.clear();
    assert!(store.session().is_none());
    assert!(client.logout().is_none());
}

#[tokio::test]
async fn business_auth_code_in_ok_response_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/getUserList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 401,
            "msg": "token expired",
            "success": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = client_for(&server.uri());
    store.set_session("T2", "alice");
    let op = OperationDescriptor::get("/api/user/getUserList");
    assert_eq!(client.execute(&op, true).await, Outcome::AuthRequired);
    assert!(!store.is_authenticated());
}

#[tokio::test]
async fn tool_flow_reports_session_required_after_expiry() {
    let platform = MockServer::start().await;
    mount_login(&platform, "tok-flow-zz").await;
    Mock::given(method("GET"))
        .and(path("/api/case/queryCaseDetails"))
        .and(query_param("caseId", "7"))
        .and(header("Authorization", "tok-flow-zz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(platform_ok(json!({"caseName": "line-1"}))))
        .up_to_n_times(1)
        .expect(1)
        .mount(&platform)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/case/queryCaseDetails"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&platform)
        .await;

    let server = server_for(&platform.uri());

    let before = call_tool(&server, "get_case_details", json!({"case_id": 7}))
        .await
        .expect_err("no session yet");
    assert_eq!(before.code, ErrorCode::SessionRequired);

    let login = call_tool(&server, "login", json!({"username": "alice", "password": "pw"}))
        .await
        .expect("login");
    assert_eq!(login["ok"], true);
    assert_eq!(login["result"]["identity"], "alice");
    assert!(login["result"].get("token").is_none());
    assert!(!login.to_string().contains("tok-flow-zz"));

    let status = call_tool(&server, "session_status", json!({})).await.expect("status");
    assert_eq!(status["result"]["authenticated"], true);

    let details = call_tool(&server, "get_case_details", json!({"case_id": "7", "trace_id": "tr-1"}))
        .await
        .expect("details");
    assert_eq!(details["result"]["caseName"], "line-1");
    assert_eq!(details["meta"]["trace_id"], "tr-1");

    let expired = call_tool(&server, "get_case_details", json!({"case_id": 7}))
        .await
        .expect_err("expired");
    assert_eq!(expired.code, ErrorCode::SessionRequired);
    assert!(expired.message.contains("code: SESSION_REQUIRED"));

    let status = call_tool(&server, "session_status", json!({})).await.expect("status");
    assert_eq!(status["result"]["authenticated"], false);

    let again = call_tool(&server, "get_case_details", json!({"case_id": 7}))
        .await
        .expect_err("still logged out");
    assert_eq!(again.code, ErrorCode::SessionRequired);
}

#[tokio::test]
async fn relogin_after_expiry_restores_access() {
    let platform = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(platform_ok(json!({"token": "T1"}))))
        .up_to_n_times(1)
        .mount(&platform)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(platform_ok(json!({"token": "T2"}))))
        .mount(&platform)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/getUserList"))
        .and(header("Authorization", "T1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&platform)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/getUserList"))
        .and(header("Authorization", "T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(platform_ok(json!([{"loginName": "alice"}]))))
        .expect(1)
        .mount(&platform)
        .await;

    let (client, store) = client_for(&platform.uri());
    let users = OperationDescriptor::get("/api/user/getUserList");

    assert!(client.login("alice", "pw").await.is_success());
    assert_eq!(client.execute(&users, true).await, Outcome::AuthRequired);
    assert!(client.login("alice", "pw").await.is_success());
    assert_eq!(store.token().as_deref(), Some("T2"));
    assert!(client.execute(&users, true).await.is_success());
}

#[tokio::test]
async fn concurrent_rejections_both_report_auth_required() {
    let platform = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/user/getUserList"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(100)))
        .expect(2)
        .mount(&platform)
        .await;

    let (client, store) = client_for(&platform.uri());
    store.set_session("tok-shared", "alice");
    let users = OperationDescriptor::get("/api/user/getUserList");

    let (first, second) = tokio::join!(client.execute(&users, true), client.execute(&users, true));
    assert_eq!(first, Outcome::AuthRequired);
    assert_eq!(second, Outcome::AuthRequired);
    assert!(store.token().is_none());

    let received = platform.received_requests().await.expect("recording enabled");
    assert_eq!(received.len(), 2);
}

#[tokio::test]
async fn login_during_rejected_call_keeps_new_session() {
    let platform = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(platform_ok(json!({"token": "tok-new"}))))
        .expect(1)
        .mount(&platform)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/case/queryCaseDetails"))
        .and(header("Authorization", "tok-old"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&platform)
        .await;

    let (client, store) = client_for(&platform.uri());
    store.set_session("tok-old", "alice");
    let details = OperationDescriptor::get("/api/case/queryCaseDetails").with_query("caseId", "7");

    let (stale, login) = tokio::join!(client.execute(&details, true), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.login("alice", "pw").await
    });

    assert!(login.is_success());
    assert_eq!(stale, Outcome::AuthRequired);
    assert_eq!(store.token().as_deref(), Some("tok-new"));
    assert!(store.is_authenticated());
}
