//! HTTP request handlers.

use super::types::{HealthResponse, PairQuery, PairResponse};
use super::AppState;
use crate::error::GatewayError;
use crate::number::normalize_number;
use crate::pairing::{run_pairing, PairingOutcome, ResponseGate};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{info, warn};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let bridge_healthy = state.connector.health_check().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        bridge_healthy,
    })
}

/// Issue a pairing code for the phone number in the query string.
///
/// Validation failures are answered here directly; no session exists yet.
/// Once a session starts, the response comes through its gate, whichever of
/// the concurrent paths concludes first.
pub async fn pair(State(state): State<AppState>, Query(query): Query<PairQuery>) -> Response {
    let raw = match query.number {
        Some(n) if !n.trim().is_empty() => n,
        _ => return GatewayError::MissingNumber.into_response(),
    };

    let number = match normalize_number(&raw) {
        Ok(number) => number,
        Err(reason) => {
            warn!(input = %raw, "Rejected phone number: {}", reason);
            return GatewayError::InvalidNumber.into_response();
        }
    };

    info!(phone_number = %number, "Pairing request received");

    let (gate, outcome) = ResponseGate::channel();
    // The orchestrator outlives this handler: a caller disconnect drops the
    // receiver, not the session.
    tokio::spawn(run_pairing(
        state.store.as_ref().clone(),
        state.connector.clone(),
        state.pairing.clone(),
        number,
        gate,
    ));

    match outcome.await {
        Ok(outcome) => outcome_response(outcome),
        Err(_) => {
            GatewayError::Internal("Pairing attempt ended without a result".into())
                .into_response()
        }
    }
}

fn outcome_response(outcome: PairingOutcome) -> Response {
    let (status, code) = match outcome {
        PairingOutcome::PairCode(code) => (StatusCode::OK, code),
        PairingOutcome::AlreadyRegistered => (
            StatusCode::OK,
            "Already registered — no pairing required".to_string(),
        ),
        PairingOutcome::Failure(reason) => (StatusCode::INTERNAL_SERVER_ERROR, reason),
    };

    (status, Json(PairResponse { code })).into_response()
}
