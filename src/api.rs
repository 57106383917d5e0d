use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::service::{EventService, Outcome, Reply};

#[derive(Clone)]
pub struct AppState {
    service: Arc<EventService>,
}

pub fn router(service: Arc<EventService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/events", get(read_events).post(refresh_events))
        .route("/api/events/{id}", get(find_event))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

fn respond<T: Serialize>(reply: Reply<T>) -> Response {
    let status = match reply.outcome {
        Outcome::Ok => StatusCode::OK,
        Outcome::NotFound => StatusCode::NOT_FOUND,
        Outcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(reply.body)).into_response()
}

async fn read_events(State(state): State<AppState>) -> Response {
    respond(state.service.read().await)
}

async fn refresh_events(State(state): State<AppState>) -> Response {
    respond(state.service.refresh().await)
}

async fn find_event(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    respond(state.service.find(&id).await)
}
