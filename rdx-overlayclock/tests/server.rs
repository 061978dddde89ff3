use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use overlayclock::prelude::*;
use overlayclock::server::router;
use overlayclock::speech::NoopNotifier;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> (Router, StateStore, ManualClock) {
    let clock = ManualClock::new(500.0);
    let store = StateStore::with_parts(
        DefaultsConfig::default(),
        Arc::new(clock.clone()),
        Arc::new(NoopNotifier),
    );
    (router(store.clone()), store, clock)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn state_route_serves_the_wire_format() {
    let (app, _, _) = app();
    let (status, body) = call(&app, "GET", "/api/state", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["value"], json!(0.0));
    assert_eq!(body["timer"]["last_update"], json!(500.0));
    assert_eq!(body["countdown"]["initial"], json!(0.0));
    assert_eq!(body["message"]["color"], json!("#b71c1c"));
    assert_eq!(body["event"]["type"], json!(""));
}

#[tokio::test]
async fn timer_routes_drive_the_store() {
    let (app, store, clock) = app();
    let (status, body) = call(&app, "POST", "/api/timer/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    clock.advance(2.0);
    call(&app, "POST", "/api/timer/stop", Some(json!({}))).await;
    clock.advance(2.0);
    let (_, body) = call(&app, "GET", "/api/state", None).await;
    assert_eq!(body["timer"]["value"], json!(2.0));
    assert_eq!(body["timer"]["running"], json!(false));

    call(&app, "POST", "/api/timer/reset", None).await;
    assert_eq!(store.get_state().await.timer.value, 0.0);
}

#[tokio::test]
async fn unknown_actions_and_targets_are_acknowledged_no_ops() {
    let (app, store, _) = app();
    let before = store.get_state().await;

    let (status, body) = call(&app, "POST", "/api/timer/explode", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    let (status, _) = call(&app, "POST", "/api/countdown/rewind", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, "POST", "/api/visibility/message", None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(store.get_state().await, before);
}

#[tokio::test]
async fn countdown_start_reads_minutes() {
    let (app, store, _) = app();
    call(&app, "POST", "/api/countdown/start", Some(json!({ "minutes": 1.5 }))).await;
    let snapshot = store.get_state().await;
    assert_eq!(snapshot.countdown.value, 90.0);
    assert!(snapshot.countdown.running);

    // Missing minutes starts an empty countdown, which stops on the next read.
    call(&app, "POST", "/api/countdown/start", None).await;
    let snapshot = store.get_state().await;
    assert_eq!(snapshot.countdown.value, 0.0);
    assert!(!snapshot.countdown.running);
}

#[tokio::test]
async fn negative_minutes_are_a_client_error() {
    let (app, store, _) = app();
    let (status, body) =
        call(&app, "POST", "/api/countdown/start", Some(json!({ "minutes": -2 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("invalid minutes: must not be negative"));
    assert!(!store.get_state().await.countdown.running);
}

#[tokio::test]
async fn visibility_route_toggles() {
    let (app, store, _) = app();
    call(&app, "POST", "/api/visibility/countdown", None).await;
    assert!(!store.get_state().await.countdown.visible);
    call(&app, "POST", "/api/visibility/countdown", None).await;
    assert!(store.get_state().await.countdown.visible);
}

#[tokio::test]
async fn message_accepts_form_style_strings() {
    let (app, store, clock) = app();
    let (status, _) = call(
        &app,
        "POST",
        "/api/message",
        Some(json!({ "text": "Welcome!", "color": "#00ff00", "duration": "10" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let snapshot = store.get_state().await;
    assert_eq!(snapshot.message.text, "Welcome!");
    assert_eq!(snapshot.message.expires_at, 510.0);

    clock.advance(11.0);
    let (_, body) = call(&app, "GET", "/api/state", None).await;
    assert_eq!(body["message"]["active"], json!(false));

    call(&app, "POST", "/api/message/clear", None).await;
    assert_eq!(store.get_state().await.message.text, "");
}

#[tokio::test]
async fn blank_duration_falls_back_to_default() {
    let (app, store, _) = app();
    call(
        &app,
        "POST",
        "/api/event",
        Some(json!({ "type": "confetti", "duration": "" })),
    )
    .await;
    let snapshot = store.get_state().await;
    assert_eq!(snapshot.event.event_type, "confetti");
    assert_eq!(snapshot.event.expires_at, 505.0);
    assert!(snapshot.event.active);
}

#[tokio::test]
async fn malformed_bodies_are_rejected() {
    let (app, _, _) = app();
    let (status, body) = call(
        &app,
        "POST",
        "/api/event",
        Some(json!({ "type": "glitch", "duration": "soon" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));

    let (status, _) = call(&app, "POST", "/api/message", Some(json!([1, 2, 3]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
