//! HTTP gateway for Teidaishu.
//!
//! Routes:
//! - `GET /health`: liveness
//! - `POST /query`: raw similarity query, optionally with passage text
//! - `POST /ask`: retrieval-grounded answer with its sources
//!
//! Every response body is JSON with an `ok` flag. Failures carry
//! `{"ok": false, "code": <status>, "msg": <kind>}`; upstream failures add an
//! `err` detail.

use axum::body::{Body, Bytes};
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{Request, StatusCode};
use axum::response::Json;
use axum::routing::{any, post};
use axum::Router;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use teidaishu_core::Error;
use teidaishu_pipeline::{AnswerPipeline, AskParams, QueryParams};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: AnswerPipeline,
}

pub type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", any(health_handler))
        .route("/query", post(query_handler).fallback(not_found_handler))
        .route("/ask", post(ask_handler).fallback(not_found_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %uuid::Uuid::new_v4(),
                )
            }),
        )
        .with_state(state)
}

/// Start the gateway HTTP server.
pub async fn start(config: teidaishu_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let pipeline = teidaishu_pipeline::build_from_config(&config)?;
    let state = Arc::new(GatewayState { pipeline });
    let app = build_router(state, config.gateway.max_body_bytes);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
}

// --- Responses ---

#[derive(Debug, Serialize)]
struct ErrorResponse {
    ok: bool,
    code: u16,
    msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    err: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult = Result<Json<Value>, ApiError>;

fn api_error(status: StatusCode, msg: impl Into<String>, err: Option<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            ok: false,
            code: status.as_u16(),
            msg: msg.into(),
            err,
        }),
    )
}

fn api_error_from(e: Error) -> ApiError {
    if e.is_client_error() {
        let kind = match e {
            Error::MalformedInput(kind) => kind,
            other => other.to_string(),
        };
        return api_error(StatusCode::BAD_REQUEST, kind, None);
    }

    error!(error = %e, "Request failed");
    api_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        Some(e.to_string()),
    )
}

/// Wrap a payload as `{"ok": true, ...payload}`.
fn ok_json<T: Serialize>(payload: &T) -> ApiResult {
    let mut value = serde_json::to_value(payload).map_err(|e| api_error_from(e.into()))?;
    match value.as_object_mut() {
        Some(map) => {
            map.insert("ok".into(), Value::Bool(true));
            Ok(Json(value))
        }
        None => Err(api_error_from(Error::Internal(
            "response payload is not an object".into(),
        ))),
    }
}

fn parse_body(body: Result<Bytes, BytesRejection>) -> Result<Value, ApiError> {
    let body = body.map_err(|rejection| match rejection.status() {
        StatusCode::PAYLOAD_TOO_LARGE => {
            api_error(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", None)
        }
        status => api_error(status, "bad_request", Some(rejection.body_text())),
    })?;
    serde_json::from_slice(&body)
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "bad_json", None))
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> ApiResult {
    ok_json(&HealthResponse { status: "ok" })
}

async fn query_handler(
    State(state): State<SharedState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let body = parse_body(body)?;
    let params = QueryParams::from_json(&body).map_err(api_error_from)?;

    info!(topk = params.top_k, with_text = params.with_text, "Query request");

    let output = state.pipeline.query(&params).await.map_err(api_error_from)?;
    ok_json(&output)
}

async fn ask_handler(
    State(state): State<SharedState>,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult {
    let body = parse_body(body)?;
    let params = AskParams::from_json(&body).map_err(api_error_from)?;

    info!(
        topk = params.top_k,
        max_docs = params.max_docs,
        ctx_max_chars = params.ctx_max_chars,
        dedup_sid = params.dedup_sid,
        "Ask request"
    );

    let output = state.pipeline.ask(&params).await.map_err(api_error_from)?;
    ok_json(&output)
}

async fn not_found_handler() -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", None)
}
