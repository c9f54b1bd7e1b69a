//! Router-level tests: every request goes through `couple_api::router` backed by
//! an in-memory database and a publisher that records what it was asked to send.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use couple_api::mailer::Mailer;
use couple_api::push::PushSender;
use couple_api::{AppState, AppStateInner, router};
use couple_db::Database;
use couple_gateway::Publisher;

#[derive(Default)]
struct RecordingPublisher {
    sent: Mutex<Vec<(String, String, Value)>>,
}

impl RecordingPublisher {
    fn events(&self) -> Vec<(String, String, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, channel: &str, event: &str, payload: Value) -> anyhow::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), event.to_string(), payload));
        Ok(())
    }
}

struct FailingPublisher;

#[async_trait]
impl Publisher for FailingPublisher {
    async fn publish(&self, _: &str, _: &str, _: Value) -> anyhow::Result<()> {
        anyhow::bail!("relay unavailable")
    }
}

fn app_with(publisher: Arc<dyn Publisher>) -> Router {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        publisher,
        mailer: Mailer::disabled("http://localhost:3000"),
        push: PushSender::disabled(),
    });
    router(state)
}

fn test_app() -> (Router, Arc<RecordingPublisher>) {
    let publisher = Arc::new(RecordingPublisher::default());
    (app_with(publisher.clone()), publisher)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

// =============================================================================
// Validation & errors
// =============================================================================

#[tokio::test]
async fn health_reports_database() {
    let (app, _) = test_app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn activities_without_date_is_bad_request() {
    let (app, _) = test_app();
    let (status, body) = get(&app, "/api/activities").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Date required");
}

#[tokio::test]
async fn malformed_json_is_bad_request_with_error_body() {
    let (app, _) = test_app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/activities")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn publish_failure_does_not_fail_request() {
    let app = app_with(Arc::new(FailingPublisher));
    let (status, body) = post(
        &app,
        "/api/activities",
        json!({ "text": "Went for a walk", "sender": "sajid" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "pending");
}

// =============================================================================
// Activities
// =============================================================================

#[tokio::test]
async fn activity_lifecycle() {
    let (app, publisher) = test_app();

    let (status, created) = post(
        &app,
        "/api/activities",
        json!({ "text": "Cooked dinner", "sender": "nasywa" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["id"].as_str().unwrap().to_string();
    let date = created["date"].as_str().unwrap().to_string();

    let (_, listed) = get(&app, &format!("/api/activities?date={}", date)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, reacted) = send(
        &app,
        Method::PATCH,
        "/api/activities",
        Some(json!({ "id": id, "reaction": "❤️", "sender": "sajid" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reacted["reactions"], json!([{ "emoji": "❤️", "user": "sajid" }]));

    let (status, comment) = post(
        &app,
        "/api/activities/comment",
        json!({ "activityId": id, "text": "Looks tasty", "user": "sajid" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(comment["text"], "Looks tasty");

    let events = publisher.events();
    assert_eq!(events[0].0, "nasywa-sajid");
    assert_eq!(events[0].1, "new-activity");
    assert_eq!(events[1].1, "activity-update");
    let (channel, event, payload) = &events[2];
    assert_eq!(channel, &format!("activities-{}", date));
    assert_eq!(event, "update-activity");
    assert_eq!(payload["comments"][0]["text"], "Looks tasty");
}

#[tokio::test]
async fn patch_unknown_activity_is_not_found() {
    let (app, _) = test_app();
    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/activities",
        Some(json!({ "id": "missing", "status": "done" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Messages
// =============================================================================

async fn post_message(app: &Router, id: &str, text: &str) -> Value {
    let (status, body) = post(
        app,
        "/api/messages",
        json!({
            "user1": "sajid",
            "user2": "nasywa",
            "message": { "id": id, "text": text, "sender": "sajid", "type": "text" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn messages_use_sorted_chat_key() {
    let (app, publisher) = test_app();
    let stored = post_message(&app, "m1", "hi").await;
    assert_eq!(stored["chatKey"], "nasywa-sajid");
    post_message(&app, "m2", "there").await;

    let (_, history) = get(&app, "/api/messages?user1=nasywa&user2=sajid").await;
    let texts: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["hi", "there"]);

    assert!(publisher
        .events()
        .iter()
        .all(|(channel, event, _)| channel == "nasywa-sajid" && event == "new-message"));
}

#[tokio::test]
async fn reaction_toggles_on_and_off() {
    let (app, publisher) = test_app();
    post_message(&app, "m1", "hi").await;
    let react = json!({ "messageId": "m1", "emoji": "😂", "user": "nasywa", "chatKey": "nasywa-sajid" });

    let (_, first) = post(&app, "/api/messages/react", react.clone()).await;
    assert_eq!(first["reactions"].as_array().unwrap().len(), 1);
    let (_, second) = post(&app, "/api/messages/react", react.clone()).await;
    assert!(second["reactions"].as_array().unwrap().is_empty());
    let (_, third) = post(&app, "/api/messages/react", react).await;
    assert_eq!(third["reactions"][0]["emoji"], "😂");

    let (channel, event, payload) = publisher.events().pop().unwrap();
    assert_eq!(channel, "nasywa-sajid");
    assert_eq!(event, "message-reaction");
    assert_eq!(payload["messageId"], "m1");
}

#[tokio::test]
async fn react_to_missing_message_is_not_found() {
    let (app, _) = test_app();
    let (status, body) = post(
        &app,
        "/api/messages/react",
        json!({ "messageId": "nope", "emoji": "👍", "user": "sajid" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Message not found");
}

#[tokio::test]
async fn pin_falls_back_to_stored_chat_key() {
    let (app, publisher) = test_app();
    post_message(&app, "m1", "remember this").await;

    let (status, pinned) = post(
        &app,
        "/api/messages/pin",
        json!({ "messageId": "m1", "isPinned": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pinned["isPinned"], true);

    let (channel, event, payload) = publisher.events().pop().unwrap();
    assert_eq!((channel.as_str(), event.as_str()), ("nasywa-sajid", "message-pin"));
    assert_eq!(payload, json!({ "messageId": "m1", "isPinned": true }));
}

#[tokio::test]
async fn edit_delete_and_clear() {
    let (app, publisher) = test_app();
    post_message(&app, "m1", "typo").await;
    post_message(&app, "m2", "second").await;

    let (_, edited) = send(
        &app,
        Method::PATCH,
        "/api/messages",
        Some(json!({ "messageId": "m1", "text": "fixed" })),
    )
    .await;
    assert_eq!(edited["text"], "fixed");
    assert_eq!(edited["status"], "edited");

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/messages",
        Some(json!({ "messageId": "m1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(&app, "/api/messages/clear", json!({ "chatKey": "nasywa-sajid" })).await;
    assert_eq!(status, StatusCode::OK);
    let (_, history) = get(&app, "/api/messages?user1=sajid&user2=nasywa").await;
    assert!(history.as_array().unwrap().is_empty());

    let names: Vec<String> = publisher.events().into_iter().map(|(_, e, _)| e).collect();
    assert_eq!(
        names,
        ["new-message", "new-message", "message-edited", "message-deleted", "clear-chat"]
    );
}

// =============================================================================
// Relay endpoints
// =============================================================================

#[tokio::test]
async fn signal_is_relayed_on_pair_channel() {
    let (app, publisher) = test_app();
    let signal = json!({
        "sender": "sajid",
        "receiver": "nasywa",
        "type": "candidate",
        "data": { "candidate": "candidate:1 1 UDP 2122252543 192.0.2.1 54400 typ host" }
    });

    let (status, body) = post(&app, "/api/chat/signal", signal.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (channel, event, payload) = publisher.events().pop().unwrap();
    assert_eq!(channel, "nasywa-sajid");
    assert_eq!(event, "signal");
    assert_eq!(payload, signal);
}

#[tokio::test]
async fn unknown_signal_type_is_rejected() {
    let (app, publisher) = test_app();
    let (status, body) = post(
        &app,
        "/api/chat/signal",
        json!({ "sender": "sajid", "receiver": "nasywa", "type": "teleport" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn chat_music_requires_chat_key() {
    let (app, _) = test_app();
    let (status, body) = post(&app, "/api/chat/music", json!({ "index": 2 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing chatKey");
}

#[tokio::test]
async fn location_updates_profile_and_broadcasts() {
    let (app, publisher) = test_app();
    let (status, profile) = post(
        &app,
        "/api/location",
        json!({ "role": "nasywa", "latitude": -6.2, "longitude": 106.8 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["name"], "Nasywa");
    assert_eq!(profile["latitude"], -6.2);

    let (_, event, payload) = publisher.events().pop().unwrap();
    assert_eq!(event, "location-update");
    assert_eq!(payload["role"], "nasywa");
}

// =============================================================================
// Images
// =============================================================================

#[tokio::test]
async fn one_time_image_is_gone_after_first_view() {
    let (app, _) = test_app();
    let (status, uploaded) = post(
        &app,
        "/api/images",
        json!({
            "image": "https://img.example/secret.jpg",
            "sender": "sajid",
            "receiver": "nasywa",
            "viewType": "one-time"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let image_id = uploaded["image"]["id"].as_str().unwrap().to_string();

    let (status, _) = post(
        &app,
        "/api/images/view",
        json!({ "imageId": image_id, "user": "sajid" }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let view = json!({ "imageId": image_id, "user": "nasywa" });
    let (status, first) = post(&app, "/api/images/view", view.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["url"], "https://img.example/secret.jpg");
    assert_eq!(first["viewType"], "one-time");

    let (status, second) = post(&app, "/api/images/view", view.clone()).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(second["error"], "Image already viewed and deleted");

    let (status, _) = post(&app, "/api/images/view", view).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn permanent_image_can_be_viewed_repeatedly() {
    let (app, _) = test_app();
    let (_, uploaded) = post(
        &app,
        "/api/images",
        json!({ "image": "https://img.example/a.jpg", "sender": "nasywa", "receiver": "sajid" }),
    )
    .await;
    assert_eq!(uploaded["image"]["viewType"], "permanent");
    let view = json!({ "imageId": uploaded["image"]["id"], "user": "sajid" });

    for _ in 0..3 {
        let (status, _) = post(&app, "/api/images/view", view.clone()).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, listed) = get(&app, "/api/images?user=sajid").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

// =============================================================================
// Notifications & admin
// =============================================================================

#[tokio::test]
async fn mood_notify_is_simulated_without_smtp() {
    let (app, _) = test_app();
    let (status, body) = post(
        &app,
        "/api/mood-notify",
        json!({ "from": "Sajid", "toEmail": "nasywa@example.com", "mood": "Missing You" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "simulated": true }));

    let (status, _) = post(&app, "/api/mood-notify", json!({ "from": "Sajid" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn subscribe_requires_subscription() {
    let (app, _) = test_app();
    let (status, _) = post(&app, "/api/notifications/subscribe", json!({ "userId": "sajid" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post(
        &app,
        "/api/notifications/subscribe",
        json!({
            "userId": "sajid",
            "subscription": { "endpoint": "https://push.example/1", "keys": { "p256dh": "p", "auth": "a" } }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn settings_update_is_broadcast() {
    let (app, publisher) = test_app();
    let (_, initial) = get(&app, "/api/admin/settings").await;
    assert_eq!(initial["stopEffects"], false);

    let (status, updated) = post(
        &app,
        "/api/admin/settings",
        json!({ "stopEffects": true, "updatedBy": "admin" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["stopEffects"], true);

    let (_, event, payload) = publisher.events().pop().unwrap();
    assert_eq!(event, "global-settings-update");
    assert_eq!(payload["updatedBy"], "admin");
}

#[tokio::test]
async fn songs_crud() {
    let (app, _) = test_app();
    let (_, created) = post(
        &app,
        "/api/admin/songs",
        json!({ "url": "https://audio.example/1.mp3", "title": "Our Song" }),
    )
    .await;
    assert_eq!(created["song"]["effect"], "none");
    let id = created["song"]["id"].clone();

    let (_, songs) = get(&app, "/api/admin/songs").await;
    assert_eq!(songs.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, "/api/admin/songs", Some(json!({ "id": id }))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::DELETE, "/api/admin/songs", Some(json!({ "id": id }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_you_is_simulated_without_smtp() {
    let (app, _) = test_app();
    let (status, body) = post(
        &app,
        "/api/send-missing-you",
        json!({ "sender": "sajid", "recipient": "nasywa@example.com", "message": "Come home soon" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "simulated": true }));

    let (status, body) = post(
        &app,
        "/api/send-missing-you",
        json!({ "sender": "sajid", "recipient": "not an address", "message": "hi" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not an address"));
}

// =============================================================================
// Profiles
// =============================================================================

#[tokio::test]
async fn profile_is_initialized_on_first_access() {
    let (app, _) = test_app();
    let (status, profile) = get(&app, "/api/profiles?role=sajid").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["role"], "sajid");
    assert_eq!(profile["name"], "Sajid");
    assert_eq!(profile["avatarUrl"], Value::Null);

    let (_, again) = get(&app, "/api/profiles?role=sajid").await;
    assert_eq!(again["id"], profile["id"]);

    let (status, body) = get(&app, "/api/profiles").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Role required");
}

#[tokio::test]
async fn profile_upsert_keeps_fields_left_out() {
    let (app, _) = test_app();
    let (status, created) = post(
        &app,
        "/api/profiles",
        json!({ "role": "sajid", "name": "Saj", "avatarUrl": "https://a/p.png" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["name"], "Saj");

    let (_, avatar_only) = post(
        &app,
        "/api/profiles",
        json!({ "role": "sajid", "avatarUrl": "https://a/q.png" }),
    )
    .await;
    assert_eq!(avatar_only["id"], created["id"]);
    assert_eq!(avatar_only["name"], "Saj");
    assert_eq!(avatar_only["avatarUrl"], "https://a/q.png");

    let (_, name_only) = post(&app, "/api/profiles", json!({ "role": "sajid", "name": "Sajid K" })).await;
    assert_eq!(name_only["name"], "Sajid K");
    assert_eq!(name_only["avatarUrl"], "https://a/q.png");

    let (_, fetched) = get(&app, "/api/profiles?role=sajid").await;
    assert_eq!(fetched["name"], "Sajid K");
}

#[tokio::test]
async fn new_profile_without_name_uses_role() {
    let (app, _) = test_app();
    let (_, profile) = post(&app, "/api/profiles", json!({ "role": "nasywa" })).await;
    assert_eq!(profile["name"], "Nasywa");
}

// =============================================================================
// Music & typing
// =============================================================================

#[tokio::test]
async fn music_updates_profile_and_broadcasts_on_shared_channel() {
    let (app, publisher) = test_app();
    let (status, profile) = post(
        &app,
        "/api/music",
        json!({
            "role": "nasywa",
            "trackName": "Until I Found You",
            "trackArtist": "Stephen Sanchez",
            "trackImage": "https://img.example/cover.jpg",
            "isPlaying": true,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["trackName"], "Until I Found You");
    assert_eq!(profile["isPlaying"], true);

    let (channel, event, payload) = publisher.events().pop().unwrap();
    assert_eq!(channel, "nasywa-sajid");
    assert_eq!(event, "music-update");
    assert_eq!(payload["role"], "nasywa");
    assert_eq!(payload["trackArtist"], "Stephen Sanchez");
    assert_eq!(payload["isPlaying"], true);

    let (_, stored) = get(&app, "/api/profiles?role=nasywa").await;
    assert_eq!(stored["trackImage"], "https://img.example/cover.jpg");
}

#[tokio::test]
async fn typing_is_relayed_on_chat_channel() {
    let (app, publisher) = test_app();
    let (status, body) = post(
        &app,
        "/api/messages/typing",
        json!({ "chatKey": "nasywa-sajid", "user": "sajid", "isTyping": true }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        publisher.events(),
        [(
            "nasywa-sajid".to_string(),
            "typing".to_string(),
            json!({ "user": "sajid", "isTyping": true })
        )]
    );

    let (status, _) = post(&app, "/api/messages/typing", json!({ "user": "sajid" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Empty required fields
// =============================================================================

#[tokio::test]
async fn empty_required_strings_are_rejected() {
    let (app, publisher) = test_app();
    let cases = [
        ("/api/activities", json!({ "text": "", "sender": "" })),
        ("/api/activities", json!({ "text": "walk", "sender": " " })),
        (
            "/api/images",
            json!({ "image": "", "sender": "", "receiver": "" }),
        ),
        (
            "/api/images",
            json!({ "image": "https://img/x.jpg", "sender": "sajid", "receiver": "" }),
        ),
        ("/api/images/view", json!({ "imageId": "", "user": "nasywa" })),
        ("/api/admin/songs", json!({ "url": "", "title": "" })),
        (
            "/api/mood-notify",
            json!({ "from": "", "toEmail": "n@example.com", "mood": "happy" }),
        ),
        (
            "/api/send-missing-you",
            json!({ "sender": "sajid", "recipient": "n@example.com", "message": "" }),
        ),
    ];

    for (uri, body) in cases {
        let (status, response) = post(&app, uri, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} accepted {}", uri, body);
        assert!(response["error"].is_string());
    }

    let (_, images) = get(&app, "/api/images").await;
    assert_eq!(images, json!([]));
    let (_, songs) = get(&app, "/api/admin/songs").await;
    assert_eq!(songs, json!([]));
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn empty_activity_change_is_rejected() {
    let (app, _) = test_app();
    let (_, activity) = post(&app, "/api/activities", json!({ "text": "walk", "sender": "sajid" })).await;
    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/activities",
        Some(json!({ "id": activity["id"], "status": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
