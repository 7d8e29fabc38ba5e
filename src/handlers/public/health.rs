use axum::{extract::State, http::Uri, response::Json};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

/// GET / - service description
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Medicine Delivery API",
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": {
                "login": "POST /login (public)",
                "health": "GET /health (public)",
                "patients": "GET|POST /patients, GET /patients/:id (bearer)",
                "deliveries": "GET|POST /deliveries, GET|PATCH|PUT /deliveries/:id (bearer)"
            }
        }
    }))
}

/// GET /health - liveness plus total record counts. The per-status
/// breakdown stays behind the token (`medadmin inspect` reads it offline).
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let summary = state.service.summary().await;
    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "records": {
                "patients": summary.patients,
                "deliveries": summary.deliveries
            }
        }
    }))
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("No route for {}", uri.path()))
}
