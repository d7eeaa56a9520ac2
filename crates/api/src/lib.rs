mod config;
mod error;
mod rate_limit;

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, Json, Query, State};
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use hervival_core::{
    ChatReply, CrisisAssessment, CrisisDetector, EmergencyCategory, ExerciseKind,
    KeywordResponder, Priority, ReplySource, ResourceProvider,
};
use hervival_observability::{AppMetrics, ChatOutcome, MetricsSnapshot};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub use config::ApiConfig;
pub use error::ApiError;
pub use rate_limit::{ClientRateLimiter, RateDecision};

const EMPTY_MESSAGE_REPLY: &str =
    "I notice you haven't shared anything yet. Would you like to tell me what's on your mind?";
const NOT_FOUND_REPLY: &str = "I couldn't find the page you were looking for, but I'm still here \
                               if you'd like to talk about what's on your mind.";
const DEFAULT_EMOTION: &str = "neutral";
const DEFAULT_CONFIDENCE: f32 = 0.8;
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
pub struct ApiState {
    pub responder: Arc<KeywordResponder>,
    pub detector: CrisisDetector,
    pub resources: ResourceProvider,
    pub metrics: Arc<AppMetrics>,
    pub limiter: ClientRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
    pub trust_forwarded_for: bool,
}

impl ApiState {
    pub fn new(config: &ApiConfig, responder: KeywordResponder) -> Self {
        Self {
            responder: Arc::new(responder),
            detector: CrisisDetector::new(),
            resources: ResourceProvider::new(),
            metrics: AppMetrics::shared(),
            limiter: ClientRateLimiter::new(config.rate_limit_window, config.rate_limit_max),
            allowed_origins: Arc::new(config.allowed_origins.clone()),
            trust_forwarded_for: config.trust_forwarded_for,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Kept as raw JSON so falsy non-string values read as "no message".
    #[serde(default)]
    pub message: Option<Value>,
    /// Hints accept any JSON value; non-string or non-numeric values fall back to defaults.
    #[serde(default)]
    pub emotion: Option<Value>,
    #[serde(default)]
    pub confidence: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct CrisisCheckRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct ResourcesQuery {
    category: Option<String>,
}

#[derive(Debug, Serialize)]
struct ResourcesResponse {
    category: Option<EmergencyCategory>,
    resources: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SelfCareQuery {
    kind: Option<String>,
}

#[derive(Debug, Serialize)]
struct SelfCareResponse {
    kind: Option<ExerciseKind>,
    exercises: Vec<String>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
}

pub fn build_app(config: &ApiConfig) -> Router {
    build_router(ApiState::new(config, KeywordResponder::default()))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/chat",
            post(chat)
                .layer(CatchPanicLayer::custom(chat_panic_handler(state.metrics.clone())))
                .layer(middleware::from_fn_with_state(
                    state.metrics.clone(),
                    track_chat,
                )),
        )
        .route("/crisis/check", post(crisis_check))
        .route("/resources", get(emergency_resources))
        .route("/self-care", get(self_care))
        .route("/user/activity", post(user_activity))
        .fallback(not_found)
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(CatchPanicLayer::custom(handle_server_panic))
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: chrono::Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn chat(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    match respond_to_chat(&state, payload) {
        Ok((reply, outcome)) => {
            state.metrics.record(outcome);
            Ok(Json(reply))
        }
        Err(err) => {
            state.metrics.record(ChatOutcome::Failure);
            error!(error = %err, "error in chat endpoint");
            Err(err)
        }
    }
}

fn respond_to_chat(
    state: &ApiState,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<(ChatReply, ChatOutcome), ApiError> {
    let Json(request) = payload?;

    let Some(message) = message_text(request.message)? else {
        return Ok((
            ChatReply::new(EMPTY_MESSAGE_REPLY, Priority::Low),
            ChatOutcome::EmptyMessage,
        ));
    };

    let classified = state.responder.classify_and_respond(
        &message,
        request
            .emotion
            .as_ref()
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_EMOTION),
        request
            .confidence
            .as_ref()
            .and_then(Value::as_f64)
            .map(|confidence| confidence as f32)
            .unwrap_or(DEFAULT_CONFIDENCE),
    );

    let outcome = match classified.source {
        ReplySource::Crisis(category) => {
            info!(
                category = %category,
                resources = classified.reply.resources.as_ref().map_or(0, Vec::len),
                "crisis reply issued"
            );
            ChatOutcome::Crisis
        }
        ReplySource::Emotion(_) => ChatOutcome::Emotion,
        ReplySource::Fallback => ChatOutcome::Fallback,
    };

    Ok((classified.reply, outcome))
}

/// Falsy JSON values (`null`, `false`, `0`, `""`, `[]`, `{}`) count as no
/// message. Any other non-string value is rejected.
fn message_text(message: Option<Value>) -> Result<Option<String>, ApiError> {
    match message.unwrap_or(Value::Null) {
        Value::String(text) if text.is_empty() => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Null | Value::Bool(false) => Ok(None),
        Value::Number(number) if number.as_f64() == Some(0.0) => Ok(None),
        Value::Array(items) if items.is_empty() => Ok(None),
        Value::Object(fields) if fields.is_empty() => Ok(None),
        Value::Bool(_) => Err(ApiError::InvalidMessage("boolean")),
        Value::Number(_) => Err(ApiError::InvalidMessage("number")),
        Value::Array(_) => Err(ApiError::InvalidMessage("array")),
        Value::Object(_) => Err(ApiError::InvalidMessage("object")),
    }
}

async fn track_chat(
    State(metrics): State<Arc<AppMetrics>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    metrics.inc_request();

    let response = next.run(request).await;
    metrics.observe_latency(started.elapsed());
    response
}

async fn crisis_check(
    State(state): State<ApiState>,
    Json(request): Json<CrisisCheckRequest>,
) -> Json<CrisisAssessment> {
    Json(state.detector.detect_crisis(&request.text))
}

async fn emergency_resources(
    State(state): State<ApiState>,
    Query(query): Query<ResourcesQuery>,
) -> Json<ResourcesResponse> {
    let category = query.category.as_deref().and_then(EmergencyCategory::parse);
    Json(ResourcesResponse {
        category,
        resources: state.resources.emergency_resources(category),
    })
}

async fn self_care(
    State(state): State<ApiState>,
    Query(query): Query<SelfCareQuery>,
) -> Json<SelfCareResponse> {
    let kind = query.kind.as_deref().and_then(ExerciseKind::parse);
    Json(SelfCareResponse {
        kind,
        exercises: state.resources.self_care_exercises(kind),
    })
}

async fn user_activity() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "success" }))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ChatReply::new(NOT_FOUND_REPLY, Priority::Low)),
    )
}

fn panic_detail(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "unexpected failure".to_string()
    }
}

/// Chat panics answer with the usual apology and count as failed chats.
fn chat_panic_handler(
    metrics: Arc<AppMetrics>,
) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone + Send + Sync + 'static {
    move |panic| {
        metrics.record(ChatOutcome::Failure);
        let detail = panic_detail(panic.as_ref());
        error!(panic = %detail, "chat handler panicked");
        ApiError::Internal(detail).into_response()
    }
}

fn handle_server_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic_detail(panic.as_ref());
    error!(panic = %detail, "request handler panicked");
    ApiError::Server(detail).into_response()
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let client = client_address(&request, state.trust_forwarded_for);
    match state.limiter.check(&client) {
        RateDecision::Allowed => next.run(request).await,
        RateDecision::Limited { retry_after } => {
            warn!(client = %client, "rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "rate_limited",
                    "message": "too many messages in a short time. please wait a moment and try again."
                })),
            )
                .into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

fn client_address(request: &Request<Body>, trust_forwarded_for: bool) -> String {
    let forwarded = trust_forwarded_for
        .then(|| request.headers().get("x-forwarded-for"))
        .flatten()
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    forwarded
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "local".to_string())
}
