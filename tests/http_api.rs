use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use polling_chat::{router, ChatServer, Store};

fn app() -> Router {
    router(ChatServer::spawn(Store::new(), 64))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    call(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call(app, Method::POST, uri, Some(body)).await
}

#[tokio::test]
async fn test_channel_chat_scenario() {
    let app = app();

    let (status, alice) = post(&app, "/user", json!({"nickname": "alice"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alice["key"], "alice");

    let (_, again) = post(&app, "/user", json!({"nickname": "alice"})).await;
    assert_eq!(again["key"], "alice0");
    assert_eq!(again["suffix"], 0);

    let (status, channel) = post(
        &app,
        "/channel",
        json!({"channelname": "general", "operators": ["alice"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(channel["key"], "general");

    let (status, joined) = post(&app, "/join", json!({"user": "alice", "channel": "general"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["connected"], json!(["alice"]));

    let msg = json!({"timestamp": 100, "sender": "alice", "receiver": "#general", "text": "hi"});
    let (status, echoed) = post(&app, "/chat/send", msg.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(echoed, msg);

    let (status, recv) = get(&app, "/chat/recv/%23general/0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(recv, json!([msg]));

    let (_, recv) = get(&app, "/chat/recv/%23general/100").await;
    assert_eq!(recv, json!([]));
}

#[tokio::test]
async fn test_private_message_round_trip() {
    let app = app();
    post(&app, "/user", json!({"nickname": "alice"})).await;
    post(&app, "/user", json!({"nickname": "bob"})).await;

    let msg = json!({"timestamp": 7, "sender": "alice", "receiver": "@bob", "text": "psst"});
    let (status, _) = post(&app, "/chat/send", msg.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (_, inbox) = get(&app, "/chat/recv/@bob/0").await;
    assert_eq!(inbox, json!([msg]));

    let (_, conversation) = get(&app, "/privatemessage/alice/bob").await;
    assert_eq!(conversation, json!([msg]));

    let (_, empty) = get(&app, "/privatemessage/bob/alice").await;
    assert_eq!(empty, json!([]));

    let (_, all) = get(&app, "/privatemessages").await;
    assert_eq!(all["alice"]["bob"], json!([msg]));
}

#[tokio::test]
async fn test_lookups_degrade_to_null() {
    let app = app();
    post(&app, "/user", json!({"nickname": "alice"})).await;

    let (status, user) = get(&app, "/user/alice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["name"], "alice");
    assert!(user["connection"].is_null());

    let (status, missing) = get(&app, "/user/ghost").await;
    assert_eq!(status, StatusCode::OK);
    assert!(missing.is_null());

    let (status, missing) = get(&app, "/channel/void").await;
    assert_eq!(status, StatusCode::OK);
    assert!(missing.is_null());

    let (_, recv) = get(&app, "/chat/recv/%23void/0").await;
    assert_eq!(recv, json!([]));
}

#[tokio::test]
async fn test_listings() {
    let app = app();
    post(&app, "/user", json!({"nickname": "bob"})).await;
    post(&app, "/user", json!({"nickname": "alice"})).await;
    post(&app, "/channel", json!({"channelname": "random"})).await;
    post(&app, "/channel", json!({"channelname": "general"})).await;

    let (_, users) = get(&app, "/users").await;
    let keys: Vec<_> = users.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["alice", "bob"]);

    let (_, channels) = get(&app, "/channels").await;
    let names: Vec<_> = channels
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["key"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["general", "random"]);

    let (_, logs) = get(&app, "/chatchannels").await;
    assert_eq!(logs["general"]["chats"], json!([]));

    let (_, log) = get(&app, "/chatchannel/random").await;
    assert_eq!(log["channel"]["key"], "random");
}

#[tokio::test]
async fn test_join_unknown_keys_is_rejected() {
    let app = app();
    post(&app, "/user", json!({"nickname": "alice"})).await;
    post(&app, "/channel", json!({"channelname": "general"})).await;

    let (status, body) = post(&app, "/join", json!({"user": "ghost", "channel": "general"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, _) = post(&app, "/join", json!({"user": "alice", "channel": "void"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, user) = get(&app, "/user/alice").await;
    assert!(user["connection"].is_null());
    let (_, channel) = get(&app, "/channel/general").await;
    assert_eq!(channel["connected"], json!([]));
}

#[tokio::test]
async fn test_join_switches_channel() {
    let app = app();
    post(&app, "/user", json!({"nickname": "alice"})).await;
    post(&app, "/channel", json!({"channelname": "general"})).await;
    post(&app, "/channel", json!({"channelname": "random"})).await;

    post(&app, "/join", json!({"user": "alice", "channel": "general"})).await;
    let (_, random) = post(&app, "/join", json!({"user": "alice", "channel": "random"})).await;
    assert_eq!(random["connected"], json!(["alice"]));

    let (_, general) = get(&app, "/channel/general").await;
    assert_eq!(general["connected"], json!([]));
    let (_, user) = get(&app, "/user/alice").await;
    assert_eq!(user["connection"], "random");
}

#[tokio::test]
async fn test_malformed_requests_are_rejected() {
    let app = app();
    post(&app, "/user", json!({"nickname": "alice"})).await;

    let (status, body) = post(&app, "/user", json!({"name": "alice"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "malformed");

    let (status, _) = post(&app, "/join", json!({"user": "alice"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_sigil = json!({"timestamp": 1, "sender": "alice", "receiver": "+general", "text": "x"});
    let (status, body) = post(&app, "/chat/send", bad_sigil).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_address");

    let no_sigil = json!({"timestamp": 1, "sender": "alice", "receiver": "general", "text": "x"});
    let (status, body) = post(&app, "/chat/send", no_sigil).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_address");

    let (_, log) = get(&app, "/chatchannels").await;
    assert_eq!(log, json!({}));

    let (status, body) = get(&app, "/chat/recv/general/0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_address");

    let (status, body) = get(&app, "/chat/recv/@alice/yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "malformed");

    // nothing was registered by the rejected body
    let (_, users) = get(&app, "/users").await;
    assert_eq!(users.as_object().unwrap().len(), 1);
}

#[tokio::test]
async fn test_send_to_unknown_channel_is_rejected() {
    let app = app();
    post(&app, "/user", json!({"nickname": "alice"})).await;

    let msg = json!({"timestamp": 1, "sender": "alice", "receiver": "#nowhere", "text": "hello?"});
    let (status, body) = post(&app, "/chat/send", msg).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}
