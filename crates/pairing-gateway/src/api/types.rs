//! API request and response types.

use serde::{Deserialize, Serialize};

/// Query parameters for the pairing endpoint.
#[derive(Debug, Deserialize)]
pub struct PairQuery {
    /// Phone number in full international form.
    pub number: Option<String>,
}

/// The single response body shape: every reply, success or failure,
/// carries one `code` field.
#[derive(Debug, Serialize, Deserialize)]
pub struct PairResponse {
    pub code: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub bridge_healthy: bool,
}
