use super::types::{ErrorBody, InboundRequest};
use crate::config::RequestDefaults;
use crate::provider::UnsupportedRole;
use crate::router::{RouteError, Router};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Failures surfaced by the HTTP entry point.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error(transparent)]
    UnsupportedRole(#[from] UnsupportedRole),

    #[error(transparent)]
    Route(#[from] RouteError),
}

impl ApiError {
    /// Status code for this error.
    ///
    /// Without `strict`, every failure is reported as 500. With it, caller
    /// mistakes become 400 and backend failures 502.
    pub fn status(&self, strict: bool) -> StatusCode {
        if !strict {
            return StatusCode::INTERNAL_SERVER_ERROR;
        }

        match self {
            ApiError::MalformedRequest(_)
            | ApiError::UnsupportedRole(_)
            | ApiError::Route(RouteError::UnknownProvider(_)) => StatusCode::BAD_REQUEST,
            ApiError::Route(RouteError::Backend(_)) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn into_response_with(self, strict: bool) -> Response {
        let status = self.status(strict);
        (status, Json(ErrorBody::internal(self.to_string()))).into_response()
    }
}

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Router,
    pub defaults: Arc<RequestDefaults>,
    pub strict_status: bool,
}

/// Parses a raw body, fills defaults, and routes it.
///
/// An empty body is treated as `{}` so every field takes its default.
pub async fn handle_route(state: &AppState, body: &[u8]) -> Result<Value, ApiError> {
    let inbound: InboundRequest = if body.iter().all(u8::is_ascii_whitespace) {
        InboundRequest::default()
    } else {
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedRequest(e.to_string()))?
    };

    let request = inbound.into_route_request(&state.defaults)?;
    debug!(provider = %request.provider, model = %request.model, "Routing inbound request");

    Ok(state.router.route(&request).await?)
}

/// `POST /` and `POST /v1/route`.
pub async fn route(State(state): State<AppState>, body: Bytes) -> Response {
    match handle_route(&state, &body).await {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(err) => {
            warn!(error = %err, "Request failed");
            err.into_response_with(state.strict_status)
        }
    }
}

/// `GET /health`.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /providers`.
pub async fn providers(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "providers": state.router.registry().names() }))
}
