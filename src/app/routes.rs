//! HTTP routes: service info, health, and the analysis endpoint.

use crate::app::cors::cors_layer;
use crate::config::AppConfig;
use crate::core::pipeline::SentimentPipeline;
use crate::core::{AnalysisRequest, AnalysisResult, CompletionClient};
use crate::utils::error::{ErrorBody, Result, SentimentError};
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

pub const SERVICE_NAME: &str = "Sentiment Aura API";

/// Shared, read-only state handed to every handler.
pub struct AppState<C: CompletionClient> {
    pub pipeline: Arc<SentimentPipeline<C>>,
    pub health: Arc<HealthStatus>,
}

impl<C: CompletionClient> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            health: Arc::clone(&self.health),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Health payload. Computed once at startup so repeated calls are identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub openai_configured: bool,
    pub speech_configured: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotFoundBody {
    pub error: String,
    pub path: String,
}

impl HealthStatus {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            status: "healthy".to_string(),
            openai_configured: !config.openai_api_key.is_empty(),
            speech_configured: config.speech_configured(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Build the router with the full middleware stack applied.
pub fn build_router<C>(pipeline: SentimentPipeline<C>, config: &AppConfig) -> Result<Router>
where
    C: CompletionClient + 'static,
{
    let state = AppState {
        pipeline: Arc::new(pipeline),
        health: Arc::new(HealthStatus::from_config(config)),
    };

    with_middleware(api_routes(state), config)
}

/// Wrap `router` in panic recovery, the body limit, CORS and tracing.
/// Panic recovery sits innermost so its 500 still passes through CORS.
pub fn with_middleware(router: Router, config: &AppConfig) -> Result<Router> {
    Ok(router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(cors_layer(&config.cors_allowed_origins)?)
        .layer(TraceLayer::new_for_http()))
}

/// Routes without middleware.
pub fn api_routes<C>(state: AppState<C>) -> Router
where
    C: CompletionClient + 'static,
{
    Router::new()
        .route("/", get(root).fallback(method_not_allowed))
        .route("/health", get(health::<C>).fallback(method_not_allowed))
        .route(
            "/process_text",
            post(process_text::<C>).fallback(method_not_allowed),
        )
        .fallback(not_found)
        .with_state(state)
}

async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "online".to_string(),
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn health<C: CompletionClient + 'static>(
    State(state): State<AppState<C>>,
) -> Json<HealthStatus> {
    Json(state.health.as_ref().clone())
}

async fn process_text<C: CompletionClient + 'static>(
    State(state): State<AppState<C>>,
    payload: std::result::Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!("Rejected request body: {}", rejection.body_text());
        SentimentError::validation(rejection.body_text())
    })?;

    match state.pipeline.analyze(&request.text).await {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            tracing::error!(
                "Analysis failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            Err(e)
        }
    }
}

async fn not_found(uri: Uri) -> (StatusCode, Json<NotFoundBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundBody {
            error: "Endpoint not found".to_string(),
            path: uri.to_string(),
        }),
    )
}

async fn method_not_allowed(method: Method, uri: Uri) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody {
            error: "Method not allowed".to_string(),
            detail: format!("{} is not supported on {}", method, uri.path()),
        }),
    )
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic payload");
    tracing::error!("Handler panicked: {}", message);

    SentimentError::internal(message).into_response()
}
