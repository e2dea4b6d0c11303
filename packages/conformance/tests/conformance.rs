//! End-to-end conformance tests for the friends service HTTP API.
//!
//! Each test spawns an ephemeral in-process service (real TCP, real HTTP)
//! via [`friendgraph_conformance::spawn_service`] and exercises the API with
//! a `reqwest` HTTP client.
//!
//! # Coverage
//!
//! | Test | Area |
//! |------|------|
//! | `index_lists_routes` | `GET /` |
//! | `insert_then_empty_friend_list` | user insert, friend list |
//! | `insert_sets_location` | `Location` header |
//! | `request_accept_scenario` | add → accept → friends both ways |
//! | `request_is_visible_from_both_sides` | pending / pending_request |
//! | `decline_removes_request` | decline |
//! | `delete_friend_removes_both_sides` | delete friend |
//! | `second_cancel_fails` | cancel is not idempotent |
//! | `accept_without_request_fails_cleanly` | atomic precondition |
//! | `duplicate_request_fails` | pending natural key |
//! | `self_request_fails` | self relationship |
//! | `unknown_friend_fails` | node lookup |
//! | `errors_are_plain_text_500` | flat error contract |
//! | `pagination_next_link_lifecycle` | `limit` / `offset` / links |
//! | `exact_window_omits_next` | lookahead trimming |
//! | `where_clause_is_display_only` | where-clause echo |
//! | `prev_link_omits_non_positive_offset` | `prev` link |
//! | `limit_is_capped_by_configured_ceiling` | `FRIENDS_DEFAULT_LIMIT` |
//! | `status_follows_lifecycle` | relationship status |
//! | `delete_user_cascades` | user delete |
//! | `delete_unknown_user_returns_204` | user delete |
//! | `mutations_publish_events` | notifications |
//! | `failed_mutation_publishes_nothing` | notifications |
//! | `reads_and_inserts_publish_nothing` | notifications |

use std::time::Duration;

use friendgraph::{NodeTemplate, RelType};
use friendgraph_conformance::{spawn_service, spawn_service_with, TestService};
use friendgraph_service::{GraphStore, ServiceConfig};
use serde_json::{json, Value};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

async fn insert(client: &reqwest::Client, svc: &TestService, user: &str) -> reqwest::Response {
    client
        .post(svc.url("/friends/insert"))
        .json(&json!({ "user_id": user }))
        .send()
        .await
        .unwrap()
}

async fn insert_all(client: &reqwest::Client, svc: &TestService, users: &[&str]) {
    for u in users {
        assert_eq!(insert(client, svc, u).await.status(), 201, "insert {u}");
    }
}

/// Send a lifecycle request (`add`, `accept`, ...) for `user` towards `friend`.
async fn op(
    client: &reqwest::Client,
    svc: &TestService,
    method: reqwest::Method,
    user: &str,
    op: &str,
    friend: &str,
) -> reqwest::Response {
    client
        .request(method, svc.url(&format!("/friends/{user}/{op}")))
        .json(&json!({ "friend_id": friend }))
        .send()
        .await
        .unwrap()
}

async fn add(client: &reqwest::Client, svc: &TestService, user: &str, friend: &str) -> u16 {
    op(client, svc, reqwest::Method::POST, user, "add", friend)
        .await
        .status()
        .as_u16()
}

async fn accept(client: &reqwest::Client, svc: &TestService, user: &str, friend: &str) -> u16 {
    op(client, svc, reqwest::Method::POST, user, "accept", friend)
        .await
        .status()
        .as_u16()
}

async fn list(client: &reqwest::Client, svc: &TestService, path: &str) -> Value {
    let resp = client.get(svc.url(path)).send().await.unwrap();
    assert_eq!(resp.status(), 200, "GET {path}");
    resp.json().await.unwrap()
}

async fn friend_list(client: &reqwest::Client, svc: &TestService, path: &str) -> Vec<String> {
    let body = list(client, svc, path).await;
    serde_json::from_value(body["friend_list"].clone()).unwrap()
}

fn rels(body: &Value) -> Vec<String> {
    body["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["rel"].as_str().unwrap().to_string())
        .collect()
}

fn href(body: &Value, rel: &str) -> Option<String> {
    body["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["rel"] == rel)
        .map(|l| l["href"].as_str().unwrap().to_string())
}

// ---------------------------------------------------------------------------
// Index and users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn index_lists_routes() {
    let svc = spawn_service().await;
    let body: Value = make_client()
        .get(svc.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let endpoints = body["endpoints"].as_array().unwrap();
    assert!(endpoints.iter().any(|e| e == "POST /friends/{user}/add"));
    assert!(endpoints.iter().any(|e| e == "DELETE /friends/delete"));
}

#[tokio::test]
async fn insert_then_empty_friend_list() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["alice"]).await;

    let body = list(&client, &svc, "/friends/alice").await;
    assert_eq!(body["friend_list"], json!([]));
    assert_eq!(rels(&body), vec!["self"]);
}

#[tokio::test]
async fn insert_sets_location() {
    let svc = spawn_service().await;
    let resp = insert(&make_client(), &svc, "alice").await;
    assert_eq!(resp.status(), 201);
    assert_eq!(resp.headers()["location"], "/friends/alice");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["location"], "/friends/alice");
    assert_eq!(body["user_id"], "alice");
}

#[tokio::test]
async fn delete_user_cascades() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a", "b", "c"]).await;
    assert_eq!(add(&client, &svc, "a", "b").await, 201);
    assert_eq!(accept(&client, &svc, "b", "a").await, 201);
    assert_eq!(add(&client, &svc, "c", "b").await, 201);

    let resp = client
        .delete(svc.url("/friends/delete"))
        .json(&json!({ "user_id": "b" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    assert!(friend_list(&client, &svc, "/friends/a").await.is_empty());
    assert!(friend_list(&client, &svc, "/friends/c/pending_request").await.is_empty());
    assert_eq!(svc.store.edge_count(), 0);
}

#[tokio::test]
async fn delete_unknown_user_returns_204() {
    let svc = spawn_service().await;
    let resp = make_client()
        .delete(svc.url("/friends/delete"))
        .json(&json!({ "user_id": "nobody" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn request_accept_scenario() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a1", "b1"]).await;

    assert_eq!(add(&client, &svc, "a1", "b1").await, 201);
    assert_eq!(friend_list(&client, &svc, "/friends/a1/pending_request").await, vec!["b1"]);

    assert_eq!(accept(&client, &svc, "b1", "a1").await, 201);
    assert_eq!(friend_list(&client, &svc, "/friends/a1").await, vec!["b1"]);
    assert_eq!(friend_list(&client, &svc, "/friends/b1").await, vec!["a1"]);
    assert!(friend_list(&client, &svc, "/friends/b1/pending").await.is_empty());
}

#[tokio::test]
async fn request_is_visible_from_both_sides() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a", "b"]).await;
    assert_eq!(add(&client, &svc, "a", "b").await, 201);

    assert_eq!(friend_list(&client, &svc, "/friends/a/pending_request").await, vec!["b"]);
    assert_eq!(friend_list(&client, &svc, "/friends/b/pending").await, vec!["a"]);
    assert!(friend_list(&client, &svc, "/friends/a/pending").await.is_empty());
    assert!(friend_list(&client, &svc, "/friends/b/pending_request").await.is_empty());
}

#[tokio::test]
async fn decline_removes_request() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a", "b"]).await;
    assert_eq!(add(&client, &svc, "a", "b").await, 201);

    let resp = op(&client, &svc, reqwest::Method::DELETE, "b", "decline", "a").await;
    assert_eq!(resp.status(), 204);
    assert!(friend_list(&client, &svc, "/friends/b/pending").await.is_empty());
    assert!(friend_list(&client, &svc, "/friends/a/pending_request").await.is_empty());
    assert!(friend_list(&client, &svc, "/friends/a").await.is_empty());
}

#[tokio::test]
async fn delete_friend_removes_both_sides() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a", "b"]).await;
    add(&client, &svc, "a", "b").await;
    accept(&client, &svc, "b", "a").await;

    let resp = op(&client, &svc, reqwest::Method::DELETE, "a", "delete", "b").await;
    assert_eq!(resp.status(), 204);
    assert!(friend_list(&client, &svc, "/friends/a").await.is_empty());
    assert!(friend_list(&client, &svc, "/friends/b").await.is_empty());
}

#[tokio::test]
async fn second_cancel_fails() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a", "b"]).await;
    add(&client, &svc, "a", "b").await;

    let first = op(&client, &svc, reqwest::Method::DELETE, "a", "cancel", "b").await;
    assert_eq!(first.status(), 204);
    let second = op(&client, &svc, reqwest::Method::DELETE, "a", "cancel", "b").await;
    assert_eq!(second.status(), 500);
}

#[tokio::test]
async fn accept_without_request_fails_cleanly() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a", "b"]).await;

    assert_eq!(accept(&client, &svc, "a", "b").await, 500);
    assert!(friend_list(&client, &svc, "/friends/a").await.is_empty());
    assert!(friend_list(&client, &svc, "/friends/b").await.is_empty());
    assert_eq!(svc.store.edge_count(), 0);
}

#[tokio::test]
async fn duplicate_request_fails() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a", "b"]).await;

    assert_eq!(add(&client, &svc, "a", "b").await, 201);
    assert_eq!(add(&client, &svc, "a", "b").await, 500);
    assert_eq!(add(&client, &svc, "b", "a").await, 500);
    assert_eq!(svc.store.edge_count(), 1);
}

#[tokio::test]
async fn self_request_fails() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a"]).await;
    assert_eq!(add(&client, &svc, "a", "a").await, 500);
}

#[tokio::test]
async fn unknown_friend_fails() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a"]).await;
    assert_eq!(add(&client, &svc, "a", "ghost").await, 500);
}

#[tokio::test]
async fn errors_are_plain_text_500() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["alice"]).await;

    let dup = insert(&client, &svc, "alice").await;
    assert_eq!(dup.status(), 500);
    assert!(dup.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    assert_eq!(dup.text().await.unwrap(), "INTERNAL ERROR");

    let no_body = client
        .post(svc.url("/friends/alice/add"))
        .send()
        .await
        .unwrap();
    assert_eq!(no_body.status(), 500);
}

#[tokio::test]
async fn status_follows_lifecycle() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a", "b"]).await;

    let state = |body: Value| body["state"].as_str().unwrap().to_string();
    assert_eq!(state(list(&client, &svc, "/friends/a/status/b").await), "none");
    add(&client, &svc, "a", "b").await;
    assert_eq!(state(list(&client, &svc, "/friends/a/status/b").await), "request_sent");
    assert_eq!(state(list(&client, &svc, "/friends/b/status/a").await), "request_received");
    accept(&client, &svc, "b", "a").await;
    assert_eq!(state(list(&client, &svc, "/friends/a/status/b").await), "friends");

    // A one-sided FRIEND edge can only come from outside the API.
    svc.store
        .delete_relationship(&NodeTemplate::user("b"), &NodeTemplate::user("a"), RelType::Friend)
        .await
        .unwrap();
    assert_eq!(state(list(&client, &svc, "/friends/a/status/b").await), "inconsistent");
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

async fn hub_with_requests(client: &reqwest::Client, svc: &TestService, n: usize) {
    insert_all(client, svc, &["hub"]).await;
    for i in 0..n {
        let u = format!("u{i}");
        insert_all(client, svc, &[u.as_str()]).await;
        assert_eq!(add(client, svc, &u, "hub").await, 201);
    }
}

#[tokio::test]
async fn pagination_next_link_lifecycle() {
    let svc = spawn_service().await;
    let client = make_client();
    hub_with_requests(&client, &svc, 7).await;

    // Three left past offset 4: window full, more follow.
    let body = list(&client, &svc, "/friends/hub/pending?limit=2&offset=4").await;
    assert_eq!(body["friend_list"], json!(["u4", "u5"]));
    assert_eq!(rels(&body), vec!["prev", "self", "next"]);
    assert_eq!(
        href(&body, "next").as_deref(),
        Some("/friends/hub/pending?limit=2&offset=6")
    );

    // Exactly one left: no next.
    let body = list(&client, &svc, "/friends/hub/pending?limit=2&offset=6").await;
    assert_eq!(body["friend_list"], json!(["u6"]));
    assert_eq!(rels(&body), vec!["prev", "self"]);
}

#[tokio::test]
async fn exact_window_omits_next() {
    let svc = spawn_service().await;
    let client = make_client();
    hub_with_requests(&client, &svc, 6).await;

    let body = list(&client, &svc, "/friends/hub/pending?limit=2&offset=4").await;
    assert_eq!(body["friend_list"].as_array().unwrap().len(), 2);
    assert!(href(&body, "next").is_none());
}

#[tokio::test]
async fn prev_link_omits_non_positive_offset() {
    let svc = spawn_service().await;
    let client = make_client();
    hub_with_requests(&client, &svc, 4).await;

    let body = list(&client, &svc, "/friends/hub/pending?offset=1&limit=2").await;
    assert_eq!(href(&body, "prev").as_deref(), Some("/friends/hub/pending?limit=2"));
    assert_eq!(
        href(&body, "self").as_deref(),
        Some("/friends/hub/pending?limit=2&offset=1")
    );
}

#[tokio::test]
async fn where_clause_is_display_only() {
    let svc = spawn_service().await;
    let client = make_client();
    hub_with_requests(&client, &svc, 2).await;

    let body = list(&client, &svc, "/friends/hub/pending?city=Paris&limit=5").await;
    assert_eq!(body["friend_list"], json!(["u0", "u1"]));
    assert_eq!(
        href(&body, "self").as_deref(),
        Some("/friends/hub/pending?city=Paris&limit=5")
    );
}

#[tokio::test]
async fn limit_is_capped_by_configured_ceiling() {
    let config = ServiceConfig {
        default_limit: 3,
        ..ServiceConfig::default()
    };
    let svc = spawn_service_with(config).await;
    let client = make_client();
    hub_with_requests(&client, &svc, 5).await;

    let body = list(&client, &svc, "/friends/hub/pending?limit=50").await;
    assert_eq!(body["friend_list"].as_array().unwrap().len(), 3);
    assert_eq!(
        href(&body, "next").as_deref(),
        Some("/friends/hub/pending?limit=3&offset=3")
    );
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mutations_publish_events() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a", "b", "c"]).await;

    add(&client, &svc, "a", "b").await;
    accept(&client, &svc, "b", "a").await;
    op(&client, &svc, reqwest::Method::DELETE, "a", "delete", "b").await;
    add(&client, &svc, "c", "a").await;
    op(&client, &svc, reqwest::Method::DELETE, "a", "decline", "c").await;
    add(&client, &svc, "b", "c").await;
    op(&client, &svc, reqwest::Method::DELETE, "b", "cancel", "c").await;

    let events = svc.notifier.wait_for(7, Duration::from_secs(2)).await;
    let mut subjects: Vec<_> = events.iter().map(|(s, _)| s.as_str()).collect();
    subjects.sort_unstable();
    let mut expected = vec![
        "NEW FRIEND REQUEST ADDED",
        "NEW FRIEND ADDED",
        "A FRIEND IS DELETED",
        "NEW FRIEND REQUEST ADDED",
        "A FRIEND REQUEST IS DECLINED",
        "NEW FRIEND REQUEST ADDED",
        "A FRIEND REQUEST IS CANCELLED",
    ];
    expected.sort_unstable();
    assert_eq!(subjects, expected);

    let accepted = events
        .iter()
        .find(|(s, _)| s == "NEW FRIEND ADDED")
        .map(|(_, e)| e)
        .unwrap();
    assert_eq!(accepted.user_id, "b");
    assert_eq!(accepted.friend_id, "a");
}

#[tokio::test]
async fn failed_mutation_publishes_nothing() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a", "b"]).await;

    assert_eq!(accept(&client, &svc, "a", "b").await, 500);
    let events = svc.notifier.wait_for(1, Duration::from_millis(200)).await;
    assert!(events.is_empty());
}

#[tokio::test]
async fn reads_and_inserts_publish_nothing() {
    let svc = spawn_service().await;
    let client = make_client();
    insert_all(&client, &svc, &["a"]).await;
    list(&client, &svc, "/friends/a").await;
    list(&client, &svc, "/friends/a/pending").await;

    let events = svc.notifier.wait_for(1, Duration::from_millis(200)).await;
    assert!(events.is_empty());
}
