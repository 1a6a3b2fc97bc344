use anyhow::{Context, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::future::Future;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use airmind_engine::{ControlState, CropProfile, EngineError, Snapshot};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct GreetingResponse {
    pub greeting: String,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rendered as `{ "kind": ..., "message": ... }` with a matching status code.
#[derive(Debug)]
pub enum ApiError {
    Engine(EngineError),
    BadRequest(String),
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self::Engine(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Engine(e) => {
                let status = match e {
                    EngineError::NotFound(_) => StatusCode::NOT_FOUND,
                    EngineError::PurgeUnavailable => StatusCode::CONFLICT,
                    EngineError::InvalidConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, Json(e)).into_response()
            }
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "kind": "BadRequest", "message": message })),
            )
                .into_response(),
        }
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/status", get(api_status))
        .route("/api/crops", get(api_crops))
        .route("/api/crops/{id}/select", post(select_crop))
        .route("/api/control/pause", post(toggle_pause))
        .route("/api/control/purge", post(request_purge))
        .route("/api/assistant", get(greeting).post(ask_assistant))
        .with_state(state)
}

async fn api_status(State(state): State<AppState>) -> Json<Snapshot> {
    let st = state.session.read().await;
    Json(st.snapshot())
}

async fn api_crops(State(state): State<AppState>) -> Json<Vec<CropProfile>> {
    let st = state.session.read().await;
    Json(st.catalog().iter().cloned().collect())
}

async fn select_crop(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Snapshot>, ApiError> {
    let mut st = state.session.write().await;
    st.on_crop_selected(&id)?;
    Ok(Json(st.snapshot()))
}

async fn toggle_pause(State(state): State<AppState>) -> Json<ControlState> {
    let mut st = state.session.write().await;
    Json(st.toggle_pause())
}

async fn request_purge(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let mut st = state.session.write().await;
    st.request_purge()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn greeting(State(state): State<AppState>) -> Json<GreetingResponse> {
    let assistant = state.assistant.lock().await;
    Json(GreetingResponse {
        greeting: assistant.greeting(),
    })
}

async fn ask_assistant(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message is empty".to_string()));
    }

    let reply = state.assistant.lock().await.reply(&req.message);
    if !state.reply_delay.is_zero() {
        tokio::time::sleep(state.reply_delay).await;
    }
    Ok(Json(AskResponse { reply }))
}

// ---------------------------------------------------------------------------
// Server entry-point
// ---------------------------------------------------------------------------

pub async fn serve<F>(state: AppState, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind web port {addr}"))?;

    info!(%addr, "web api listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("web server error")
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use airmind_engine::assistant::{default_replies, CannedReplies, DEFAULT_GREETING};
    use airmind_engine::{Catalog, FastrandNoise, Session, SessionSettings};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let session = Session::new(
            Arc::new(Catalog::builtin()),
            SessionSettings::default(),
            Box::new(FastrandNoise::with_seed(6)),
        );
        let bot = CannedReplies::with_seed(DEFAULT_GREETING.into(), default_replies(), 6).unwrap();
        AppState::new(session, Box::new(bot), Duration::ZERO)
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn status_returns_snapshot() {
        let (status, json) = send(router(test_state()), Method::GET, "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["lifecycle"]["crop_id"], "lettuce");
        assert_eq!(json["lifecycle"]["day"], 12);
        assert_eq!(json["reading"]["ph"], 5.8);
        assert_eq!(json["autonomous"], true);
    }

    #[tokio::test]
    async fn crops_lists_catalog() {
        let (status, json) = send(router(test_state()), Method::GET, "/api/crops", None).await;
        assert_eq!(status, StatusCode::OK);
        let crops = json.as_array().unwrap();
        assert_eq!(crops.len(), 5);
        assert_eq!(crops[4]["id"], "strawberry");
    }

    #[tokio::test]
    async fn select_known_crop_resets_cycle() {
        let state = test_state();
        let (status, json) = send(
            router(state.clone()),
            Method::POST,
            "/api/crops/basil/select",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["lifecycle"]["crop_id"], "basil");
        assert_eq!(json["lifecycle"]["day"], 1);
        assert_eq!(json["notices"][0]["kind"], "crop");
    }

    #[tokio::test]
    async fn select_unknown_crop_is_404_and_keeps_state() {
        let state = test_state();
        let (status, json) = send(
            router(state.clone()),
            Method::POST,
            "/api/crops/Strawberry/select",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["kind"], "NotFound");
        assert_eq!(json["message"], "Strawberry");

        let st = state.session.read().await;
        assert_eq!(st.lifecycle().crop().id, "lettuce");
        assert_eq!(st.lifecycle().day(), 12);
    }

    #[tokio::test]
    async fn pause_toggles_and_purge_follows() {
        let state = test_state();

        let (status, json) =
            send(router(state.clone()), Method::POST, "/api/control/purge", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["kind"], "PurgeUnavailable");

        let (_, json) = send(router(state.clone()), Method::POST, "/api/control/pause", None).await;
        assert_eq!(json["paused"], true);

        let (status, _) =
            send(router(state.clone()), Method::POST, "/api/control/purge", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, json) = send(router(state.clone()), Method::POST, "/api/control/pause", None).await;
        assert_eq!(json["paused"], false);
    }

    #[tokio::test]
    async fn assistant_greets_and_replies_from_fixed_set() {
        let state = test_state();

        let (status, json) = send(router(state.clone()), Method::GET, "/api/assistant", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["greeting"], DEFAULT_GREETING);

        let (status, json) = send(
            router(state.clone()),
            Method::POST,
            "/api/assistant",
            Some(json!({ "message": "how are my plants?" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let reply = json["reply"].as_str().unwrap().to_string();
        assert!(default_replies().contains(&reply));
    }

    #[tokio::test]
    async fn assistant_rejects_blank_message() {
        let (status, json) = send(
            router(test_state()),
            Method::POST,
            "/api/assistant",
            Some(json!({ "message": "   " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "BadRequest");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (status, _) = send(router(test_state()), Method::GET, "/api/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
