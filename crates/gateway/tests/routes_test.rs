//! Management routes exercised in-process.

use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use cluster_mgmt_bootable::Bootable;
use cluster_mgmt_gateway::management_router;
use cluster_mgmt_membership::{MemberStatus, NodeId};
use cluster_mgmt_membership_mock::MockMembershipEngine;
use cluster_mgmt_router::{CommandRouter, RouterConfig};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;
use tracing_test::traced_test;

const A: &str = "akka.tcp://sys@a:2552";
const B: &str = "akka.tcp://sys@b:2552";
const C: &str = "akka.tcp://sys@c:2552";
const D: &str = "akka.tcp://sys@d:2552";
const E: &str = "akka.tcp://sys@e:2552";
const UNKNOWN: &str = "akka.tcp://sys@zz:2552";

struct Fixture {
    engine: MockMembershipEngine,
    router: CommandRouter<MockMembershipEngine>,
    app: Router,
}

async fn fixture_with(config: RouterConfig) -> Fixture {
    let engine = MockMembershipEngine::new(NodeId::new(A));
    for address in [A, B, C, D, E] {
        engine.add_member(NodeId::new(address), MemberStatus::Up, vec!["backend".to_string()]);
    }
    engine.set_leader(Some(NodeId::new(A)));
    engine.start_shard_region("users", [("7".to_string(), 12)]);

    let router = CommandRouter::new(engine.clone(), config);
    router.start().await.unwrap();
    let app = management_router(router.handle(), "/cluster");

    Fixture {
        engine,
        router,
        app,
    }
}

async fn fixture() -> Fixture {
    fixture_with(RouterConfig::default()).await
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn form(method: Method, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri("/cluster/members")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn encoded(address: &str) -> String {
    address.replace(':', "%3A").replace('/', "%2F").replace('@', "%40")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_get_members() {
    let fixture = fixture().await;

    let (status, body) = send(&fixture.app, get("/cluster/members")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["selfNode"], A);
    assert_eq!(body["leader"], A);
    assert_eq!(body["oldest"], A);
    assert_eq!(body["members"].as_array().unwrap().len(), 5);
    assert_eq!(body["members"][1]["node"], B);
    assert_eq!(body["members"][1]["status"], "Up");
    assert_eq!(body["members"][1]["roles"], json!(["backend"]));
    assert_eq!(body["unreachable"], json!([]));

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_get_single_member() {
    let fixture = fixture().await;

    let uri = format!("/cluster/members?address={}", encoded(B));
    let (status, body) = send(&fixture.app, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["node"], B);
    assert_eq!(body["status"], "Up");

    let uri = format!("/cluster/members?address={}", encoded(UNKNOWN));
    let (status, body) = send(&fixture.app, get(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "member not found" }));

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_join() {
    let fixture = fixture().await;

    let body = format!("address={}", encoded(UNKNOWN));
    let (status, response) = send(&fixture.app, form(Method::POST, &body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({ "message": format!("joining {UNKNOWN}") }));
    assert_eq!(fixture.engine.join_requests(), vec![NodeId::new(UNKNOWN)]);

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_leave_via_delete() {
    let fixture = fixture().await;

    let body = format!("address={}", encoded(B));
    let (status, response) = send(&fixture.app, form(Method::DELETE, &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], format!("leaving {B}"));
    assert_eq!(
        fixture.engine.member(&NodeId::new(B)).unwrap().status,
        MemberStatus::Leaving
    );

    let body = format!("address={}", encoded(UNKNOWN));
    let (status, response) = send(&fixture.app, form(Method::DELETE, &body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["message"], "member not found");

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_put_operations() {
    let fixture = fixture().await;

    let body = format!("address={}&operation=Down", encoded(C));
    let (status, response) = send(&fixture.app, form(Method::PUT, &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], format!("downing {C}"));

    let body = format!("address={}&operation=leave", encoded(D));
    let (status, response) = send(&fixture.app, form(Method::PUT, &body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["message"], format!("leaving {D}"));

    let body = format!("address={}&operation=down", encoded(UNKNOWN));
    let (status, _) = send(&fixture.app, form(Method::PUT, &body)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_put_unsupported_operation_does_not_touch_engine() {
    let fixture = fixture().await;

    let body = format!("address={}&operation=restart", encoded(C));
    let (status, response) = send(&fixture.app, form(Method::PUT, &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "operation not supported: restart");
    assert_eq!(
        fixture.engine.member(&NodeId::new(C)).unwrap().status,
        MemberStatus::Up
    );

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_malformed_or_missing_address() {
    let fixture = fixture().await;

    let (status, response) = send(&fixture.app, form(Method::POST, "address=not-a-node")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(response["message"].is_string());

    let (status, response) = send(&fixture.app, form(Method::DELETE, "")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "address is required");

    assert!(fixture.engine.join_requests().is_empty());

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shard_info() {
    let fixture = fixture().await;

    let (status, body) = send(&fixture.app, get("/cluster/shards/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "shards": [{ "shardId": "7", "entityCount": 12 }] }));

    let (status, body) = send(&fixture.app, get("/cluster/shards/orders")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "shard region orders must be started first");

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_shard_region_is_not_found() {
    let fixture = fixture().await;
    fixture.engine.start_unresponsive_shard_region("stuck");

    let (status, body) = send(&fixture.app, get("/cluster/shards/stuck")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "shard region stuck not responding, may have been terminated"
    );

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_shard_region_with_short_ask_timeout() {
    let config = RouterConfig::default()
        .with_ask_timeout(Duration::from_secs(1));
    let fixture = fixture_with(config).await;
    fixture.engine.start_unresponsive_shard_region("stuck");

    let (status, body) = send(&fixture.app, get("/cluster/shards/stuck")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "shard region stuck not responding, may have been terminated"
    );

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test]
#[traced_test]
async fn test_engine_failure_is_server_error() {
    let fixture = fixture().await;
    fixture.engine.set_available(false);

    let (status, body) = send(&fixture.app, get("/cluster/members")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "membership engine is unavailable");
    assert!(logs_contain("management request failed"));

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_server_error() {
    let config = RouterConfig {
        ask_timeout: Duration::from_millis(500),
        ..RouterConfig::default()
    };
    let fixture = fixture_with(config).await;
    fixture.engine.set_mutation_delay(Some(Duration::from_secs(2)));

    let body = format!("address={}", encoded(UNKNOWN));
    let (status, response) = send(&fixture.app, form(Method::POST, &body)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response["message"], "request timed out");

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_raw_and_curated() {
    let fixture = fixture().await;
    fixture
        .engine
        .mark_unreachable(NodeId::new(C), [NodeId::new(D), NodeId::new(E)]);

    let (status, body) = send(&fixture.app, get("/cluster/unreachable")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "unreachable": [{ "node": C, "observedBy": [D, E] }] })
    );

    let (status, body) = send(&fixture.app, get("/cluster/unreachable?curate=true")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "unreachable": [] }));

    let (status, _) = send(&fixture.app, get("/cluster/unreachable?curate=maybe")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    fixture.router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_routes_live_under_prefix_only() {
    let fixture = fixture().await;

    let (status, body) = send(&fixture.app, get("/members")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "not found");

    let app = management_router(fixture.router.handle(), "/");
    let (status, _) = send(&app, get("/members")).await;
    assert_eq!(status, StatusCode::OK);

    fixture.router.shutdown().await.unwrap();
}
