//! The HTTP control API over a `StateStore`.
//!
//! Every command answers `{"success": true}`. Unknown action verbs and unknown
//! visibility targets are acknowledged and ignored; malformed bodies and
//! invalid numbers get a `400` with `{"success": false, "error": ...}`.

use crate::common::Target;
use crate::config::ServerConfig;
use crate::engine::StateStore;
use crate::error::ControlError;
use crate::state::Snapshot;
use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, info};

/// A request the control API refused.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error("malformed request body: {0}")]
    Body(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "success": false, "error": self.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

fn ack() -> Json<Value> {
    Json(json!({ "success": true }))
}

/// Parses an optional JSON body. An empty body means "all defaults".
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

/// Accepts a JSON number or a numeric string; a blank string counts as absent.
///
/// HTML form inputs hand their values over as strings.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<f64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("`{text}` is not a number")))
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CountdownRequest {
    #[serde(default, deserialize_with = "lenient_number")]
    minutes: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageRequest {
    #[serde(default)]
    text: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    duration: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct EventRequest {
    #[serde(default, rename = "type")]
    event_type: String,
    #[serde(default, deserialize_with = "lenient_number")]
    duration: Option<f64>,
}

/// Builds the control API router.
pub fn router(store: StateStore) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/timer/:action", post(timer_control))
        .route("/api/countdown/:action", post(countdown_control))
        .route("/api/visibility/:element", post(toggle_visibility))
        .route("/api/message", post(set_message))
        .route("/api/message/clear", post(clear_message))
        .route("/api/event", post(trigger_event))
        .with_state(store)
}

/// Binds `config`'s address and serves the control API until Ctrl+C.
pub async fn serve(config: &ServerConfig, store: StateStore) -> anyhow::Result<()> {
    let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Control API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(store))
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received.");
        })
        .await
        .context("Control API server failed")?;
    Ok(())
}

async fn get_state(State(store): State<StateStore>) -> Json<Snapshot> {
    Json(store.get_state().await)
}

async fn timer_control(State(store): State<StateStore>, Path(action): Path<String>) -> ApiResult {
    match action.as_str() {
        "start" => store.timer_start().await,
        "stop" => store.timer_stop().await,
        "reset" => store.timer_reset().await,
        other => debug!(action = other, "Ignoring unknown timer action."),
    }
    Ok(ack())
}

async fn countdown_control(
    State(store): State<StateStore>,
    Path(action): Path<String>,
    body: Bytes,
) -> ApiResult {
    match action.as_str() {
        "start" => {
            let request: CountdownRequest = parse_body(&body)?;
            store.countdown_start(request.minutes.unwrap_or(0.0)).await?;
        }
        "stop" => store.countdown_stop().await,
        "reset" => store.countdown_reset().await,
        other => debug!(action = other, "Ignoring unknown countdown action."),
    }
    Ok(ack())
}

async fn toggle_visibility(
    State(store): State<StateStore>,
    Path(element): Path<String>,
) -> ApiResult {
    match Target::parse(&element) {
        Some(target) => {
            store.toggle_visibility(target).await;
        }
        None => debug!(element = %element, "Ignoring visibility toggle for unknown element."),
    }
    Ok(ack())
}

async fn set_message(State(store): State<StateStore>, body: Bytes) -> ApiResult {
    let request: MessageRequest = parse_body(&body)?;
    store
        .set_message(request.text, request.color, request.duration)
        .await?;
    Ok(ack())
}

async fn clear_message(State(store): State<StateStore>) -> ApiResult {
    store.clear_message().await;
    Ok(ack())
}

async fn trigger_event(State(store): State<StateStore>, body: Bytes) -> ApiResult {
    let request: EventRequest = parse_body(&body)?;
    store
        .trigger_event(request.event_type, request.duration)
        .await?;
    Ok(ack())
}
