//! Integration tests for the backend client against a mock server.

use std::io::Write;

use futures_util::StreamExt;
use pinboard_core::backend::{BackendClient, BackendErrorKind, ChangeEvent, ChangeOp};
use pinboard_core::compose::submit_post;
use pinboard_core::config::Config;
use pinboard_core::feed::load_posts;
use pinboard_core::types::NewPost;
use serde_json::json;
use wiremock::matchers::{header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> BackendClient {
    let config = Config {
        base_url: server.uri(),
        anon_key: "anon-key".to_string(),
        ..Config::default()
    };
    BackendClient::new(config, Some("session-token".to_string()))
}

fn post_row(id: i64, created_at: &str, user_id: &str, image_id: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "content": format!("post {}", id),
        "user_id": user_id,
        "image_id": image_id,
        "created_at": created_at,
        "user_data": { "email": "alice@example.com" }
    })
}

#[tokio::test]
async fn test_current_user_sends_session_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": "alice@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let user = client_for(&server).current_user().await.unwrap();
    assert_eq!(user.id, "user-1");
    assert_eq!(user.email, "alice@example.com");
}

#[tokio::test]
async fn test_current_user_expired_session_is_auth_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "JWT expired" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).current_user().await.unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::Auth);
    assert!(err.message.contains("JWT expired"));
}

#[tokio::test]
async fn test_current_user_without_token_fails_without_request() {
    let server = MockServer::start().await;
    // No mock mounted: a request would 404 and the error message would say so.

    let config = Config {
        base_url: server.uri(),
        anon_key: "anon-key".to_string(),
        ..Config::default()
    };
    let client = BackendClient::new(config, None);

    let err = client.current_user().await.unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::Auth);
    assert_eq!(err.message, "Not signed in");
}

#[tokio::test]
async fn test_sign_in_returns_token_and_user() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh-token",
            "user": { "id": "user-1", "email": "alice@example.com" }
        })))
        .mount(&server)
        .await;

    let resp = client_for(&server)
        .sign_in("alice@example.com", "hunter2")
        .await
        .unwrap();
    assert_eq!(resp.access_token, "fresh-token");
    assert_eq!(resp.user.email, "alice@example.com");
}

#[tokio::test]
async fn test_sign_in_rejection_surfaces_backend_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "message": "Invalid login credentials" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .sign_in("alice@example.com", "wrong")
        .await
        .unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::Auth);
    assert!(err.message.contains("Invalid login credentials"));
}

#[tokio::test]
async fn test_sign_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer session-token"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).sign_out().await.unwrap();
}

#[tokio::test]
async fn test_load_posts_requests_join_and_order_and_sorts() {
    let server = MockServer::start().await;

    // Backend returns rows out of order with a created_at tie; the client
    // must enforce newest-first with id-descending tie-break.
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .and(query_param("select", "*,user_data(email)"))
        .and(query_param("order", "created_at.desc,id.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            post_row(1, "2026-01-01T10:00:00Z", "user-1", None),
            post_row(3, "2026-01-01T12:00:00Z", "user-2", Some("img-3")),
            post_row(2, "2026-01-01T12:00:00Z", "user-1", None),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let posts = load_posts(&client_for(&server)).await.unwrap();
    let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(posts[0].author_email(), "alice@example.com");
    assert_eq!(posts[0].image_id.as_deref(), Some("img-3"));
}

#[tokio::test]
async fn test_load_posts_failure_is_persistence_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "relation missing" })),
        )
        .mount(&server)
        .await;

    let err = load_posts(&client_for(&server)).await.unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::Persistence);
    assert!(err.message.contains("relation missing"));
}

#[tokio::test]
async fn test_insert_post_returns_server_row() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/posts"))
        .and(header("prefer", "return=representation"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([post_row(7, "2026-01-02T08:00:00Z", "user-1", None)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let post = client_for(&server)
        .insert_post(&NewPost {
            content: "hello".to_string(),
            user_id: "user-1".to_string(),
            image_id: None,
        })
        .await
        .unwrap();
    assert_eq!(post.id, 7);
}

#[tokio::test]
async fn test_delete_post_targets_row_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/posts"))
        .and(query_param("id", "eq.42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).delete_post(42).await.unwrap();
}

#[tokio::test]
async fn test_remove_object_sends_prefix_body() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/storage/v1/object/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .remove_object("user-1/img-1")
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body, json!({ "prefixes": ["user-1/img-1"] }));
}

#[tokio::test]
async fn test_submit_post_without_attachment_inserts_once_uploads_never() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": "alice@example.com"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/posts"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!([post_row(10, "2026-01-03T09:00:00Z", "user-1", None)])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/.*$"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let submitted = submit_post(&client_for(&server), "no attachment here", None)
        .await
        .unwrap();
    assert!(!submitted.uploaded);
    assert_eq!(submitted.post.id, 10);

    // Insert body carries a null image_id
    let requests = server.received_requests().await.unwrap();
    let insert = requests
        .iter()
        .find(|r| r.url.path() == "/rest/v1/posts")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&insert.body).unwrap();
    assert_eq!(body["image_id"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_submit_post_with_attachment_uploads_to_derived_path() {
    let server = MockServer::start().await;

    let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    file.write_all(b"not really a png").unwrap();

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": "alice@example.com"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([post_row(
            11,
            "2026-01-03T10:00:00Z",
            "user-1",
            Some("placeholder")
        )])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(
            r"^/storage/v1/object/images/user-1/[0-9a-f-]{36}$",
        ))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let submitted = submit_post(&client_for(&server), "with attachment", Some(file.path()))
        .await
        .unwrap();
    assert!(submitted.uploaded);

    // The row insert and the upload must reference the same attachment id.
    let requests = server.received_requests().await.unwrap();
    let insert = requests
        .iter()
        .find(|r| r.url.path() == "/rest/v1/posts")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&insert.body).unwrap();
    let image_id = body["image_id"].as_str().unwrap();
    assert_eq!(image_id.len(), 36);

    let upload = requests
        .iter()
        .find(|r| r.url.path().starts_with("/storage/v1/object/images/"))
        .unwrap();
    assert_eq!(
        upload.url.path(),
        format!("/storage/v1/object/images/user-1/{}", image_id)
    );
    assert_eq!(upload.body, b"not really a png");
}

#[tokio::test]
async fn test_submit_post_upload_failure_leaves_row_with_dangling_image_id() {
    let server = MockServer::start().await;

    let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
    file.write_all(b"jpeg bytes").unwrap();

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-1",
            "email": "alice@example.com"
        })))
        .mount(&server)
        .await;

    // Insert succeeds exactly once; the later upload failure must not undo it.
    Mock::given(method("POST"))
        .and(path("/rest/v1/posts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([post_row(
            12,
            "2026-01-03T11:00:00Z",
            "user-1",
            Some("dangling-id")
        )])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/storage/v1/object/images/.*$"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "bucket unavailable" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    // The row, as the backend now holds it, still carries the image_id.
    Mock::given(method("GET"))
        .and(path("/rest/v1/posts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([post_row(
            12,
            "2026-01-03T11:00:00Z",
            "user-1",
            Some("dangling-id")
        )])))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = submit_post(&client, "upload will fail", Some(file.path()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::Storage);
    assert!(err.message.contains("bucket unavailable"));

    // A subsequent load observes the dangling reference.
    let posts = load_posts(&client).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].image_id.as_deref(), Some("dangling-id"));
}

#[tokio::test]
async fn test_subscribe_changes_parses_stream() {
    let server = MockServer::start().await;

    let sse_body = "event: ping\n\n\
                    event: change\ndata: {\"table\":\"posts\",\"type\":\"INSERT\"}\n\n\
                    event: change\ndata: {\"table\":\"posts\",\"type\":\"DELETE\"}\n\n";

    Mock::given(method("GET"))
        .and(path("/realtime/v1/changes"))
        .and(query_param("table", "posts"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse_body, "text/event-stream"))
        .mount(&server)
        .await;

    let mut stream = client_for(&server).subscribe_changes().await.unwrap();

    let mut events = Vec::new();
    while let Some(result) = stream.next().await {
        events.push(result.unwrap());
    }

    assert_eq!(events.len(), 3);
    assert_eq!(events[0], ChangeEvent::Ping);
    assert_eq!(
        events[1],
        ChangeEvent::Change {
            table: "posts".to_string(),
            op: ChangeOp::Insert
        }
    );
    assert_eq!(
        events[2],
        ChangeEvent::Change {
            table: "posts".to_string(),
            op: ChangeOp::Delete
        }
    );
}

#[tokio::test]
async fn test_subscribe_changes_rejected_subscription() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/realtime/v1/changes"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client_for(&server).subscribe_changes().await.unwrap_err();
    assert_eq!(err.kind, BackendErrorKind::Persistence);
}
