use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tower_http::catch_panic::{CatchPanicLayer, ResponseForPanic};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::models::{DateEvents, Event, SourceFailure};
use crate::query::EventFilter;
use crate::scraping::SourceInfo;
use crate::service::EventService;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"));

#[derive(Clone)]
pub struct AppState {
    service: Arc<EventService>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid date format. Use YYYY-MM-DD")]
    InvalidDate,
    #[error("{0}")]
    Internal(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::InvalidDate => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventsResponse {
    events: Vec<Event>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed_sources: Vec<SourceFailure>,
}

#[derive(Debug, Serialize)]
struct SourcesResponse {
    sources: Vec<SourceInfo>,
}

/// Turns a handler panic into a 500 carrying the route's static message.
#[derive(Clone, Copy)]
struct PanicMessage(&'static str);

impl ResponseForPanic for PanicMessage {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(&mut self, err: Box<dyn Any + Send + 'static>) -> Response {
        let detail = err
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| err.downcast_ref::<String>().cloned())
            .unwrap_or_default();
        error!("{}: handler panicked: {detail}", self.0);
        ApiError::Internal(self.0).into_response()
    }
}

fn catch_panic(message: &'static str) -> CatchPanicLayer<PanicMessage> {
    CatchPanicLayer::custom(PanicMessage(message))
}

pub fn router(service: Arc<EventService>) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route(
            "/events",
            get(get_events).layer(catch_panic("Failed to fetch events")),
        )
        .route(
            "/events/date/:date",
            get(get_events_for_date)
                .layer(catch_panic("Failed to fetch events for the specified date")),
        )
        .route(
            "/events/search",
            get(search_events).layer(catch_panic("Failed to search events")),
        )
        .route(
            "/events/sources",
            get(get_sources).layer(catch_panic("Failed to fetch sources")),
        )
        .with_state(AppState { service });

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// GET /api/health
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /api/events
async fn get_events(State(state): State<AppState>) -> Json<EventsResponse> {
    Json(EventsResponse {
        events: state.service.all_events().await.value,
        failed_sources: Vec::new(),
    })
}

/// GET /api/events/date/:date
async fn get_events_for_date(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<DateEvents>, ApiError> {
    if !DATE_RE.is_match(&date) {
        return Err(ApiError::InvalidDate);
    }

    Ok(Json(state.service.events_for_date(&date).await.value))
}

/// GET /api/events/search?q=&category=&city=&date=
async fn search_events(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> Json<EventsResponse> {
    let result = state.service.search(&filter).await;
    Json(EventsResponse {
        events: result.value,
        failed_sources: result.failures,
    })
}

/// GET /api/events/sources
async fn get_sources(State(state): State<AppState>) -> Json<SourcesResponse> {
    Json(SourcesResponse {
        sources: state.service.sources(),
    })
}
