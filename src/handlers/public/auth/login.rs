use axum::{
    extract::{FromRequest, Request, State},
    http::{header, HeaderMap},
    Form, Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::IssuedToken;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// POST /login - Authenticate the admin and receive a bearer token
///
/// Accepts either a JSON body or an OAuth2 password-flow form
/// (`application/x-www-form-urlencoded`):
///
/// ```json
/// { "username": "admin", "password": "..." }
/// ```
///
/// Responds with an OAuth2 token response (no success envelope):
///
/// ```json
/// { "access_token": "eyJhbGciOiJIUzI1NiI...", "token_type": "bearer", "expires_in": 1800 }
/// ```
pub async fn login(State(state): State<AppState>, request: Request) -> Result<Json<IssuedToken>, ApiError> {
    let payload = if is_form_request(request.headers()) {
        let Form(payload) = Form::<LoginRequest>::from_request(request, &state).await?;
        payload
    } else {
        let Json(payload) = Json::<LoginRequest>::from_request(request, &state).await?;
        payload
    };

    if payload.username.trim().is_empty() || payload.password.is_empty() {
        let mut field_errors = std::collections::BTreeMap::new();
        if payload.username.trim().is_empty() {
            field_errors.insert("username".to_string(), "This field is required".to_string());
        }
        if payload.password.is_empty() {
            field_errors.insert("password".to_string(), "This field is required".to_string());
        }
        return Err(ApiError::validation_error("Missing required fields", Some(field_errors)));
    }

    // Password hashing is CPU bound, keep it off the async workers
    let verifier = state.verifier.clone();
    // Matched exactly as sent, surrounding whitespace included
    let username = payload.username;
    let attempted = username.clone();
    let result = tokio::task::spawn_blocking(move || verifier.authenticate(&username, &payload.password))
        .await
        .map_err(|e| {
            tracing::error!("Login task failed: {}", e);
            ApiError::internal_server_error("Login failed")
        })?;

    match result {
        Ok(token) => {
            tracing::info!("Admin '{}' logged in", attempted);
            Ok(Json(token))
        }
        Err(e) => {
            tracing::warn!("Failed login attempt for '{}'", attempted);
            Err(e.into())
        }
    }
}

fn is_form_request(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.starts_with("application/x-www-form-urlencoded"))
        .unwrap_or(false)
}
