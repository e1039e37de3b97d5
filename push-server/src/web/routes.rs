//! HTTP route handlers.
//!
//! The ingest endpoints acknowledge everything: the upstream feed is an
//! at-least-once queue, so a malformed message is logged and discarded,
//! never bounced back to block redelivery.

use axum::body::Bytes;
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::feed::{EstimatedVehicleJourney, SituationNotice};

use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/messages/et", post(ingest_et))
        .route("/messages/sx", post(ingest_sx))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Operational counters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    subscriptions: usize,
    live_journeys: usize,
    in_flight_deliveries: usize,
}

async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        subscriptions: state.store.len(),
        live_journeys: state.live.len(),
        in_flight_deliveries: state.engine.in_flight(),
    })
}

/// Ingest one estimated-timetable update.
async fn ingest_et(State(state): State<AppState>, body: Bytes) -> StatusCode {
    match serde_json::from_slice::<EstimatedVehicleJourney>(&body) {
        Ok(journey) => {
            state.handler.handle_et(journey).await;
            StatusCode::OK
        }
        Err(e) => {
            warn!(error = %e, "discarding unparseable estimated-timetable message");
            StatusCode::OK
        }
    }
}

/// Ingest one situation-exchange notice.
async fn ingest_sx(State(state): State<AppState>, body: Bytes) -> StatusCode {
    match serde_json::from_slice::<SituationNotice>(&body) {
        Ok(notice) => {
            state.handler.handle_sx(notice).await;
            StatusCode::OK
        }
        Err(e) => {
            warn!(error = %e, "discarding unparseable situation-exchange message");
            StatusCode::OK
        }
    }
}
