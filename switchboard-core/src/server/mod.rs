//! HTTP entry point for the router.
//!
//! The server is organized into separate concerns:
//! - `types`: Wire types for inbound requests and error bodies
//! - `handler`: Request parsing, defaulting and status mapping

mod handler;
mod types;

// Re-export types for external use
pub use handler::{handle_route, ApiError, AppState};
pub use types::{ErrorBody, InboundMessage, InboundRequest};

use crate::config::Config;
use crate::provider::ProviderError;
use crate::router::{ProviderRegistry, Router};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use std::any::Any as PanicPayload;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to initialize providers: {0}")]
    Provider(#[from] ProviderError),
}

pub type Result<T> = std::result::Result<T, ServerError>;

/// Main server wiring the provider registry to the HTTP listener.
pub struct Server {
    config: Config,
    router: Router,
}

impl Server {
    /// Creates a server with the standard provider set.
    pub fn new(config: Config) -> Result<Self> {
        let registry = ProviderRegistry::from_config(&config)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Creates a server around a caller-built registry.
    pub fn with_registry(config: Config, registry: ProviderRegistry) -> Self {
        Self {
            router: Router::new(Arc::new(registry)),
            config,
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Builds the axum application for this server.
    pub fn app(&self) -> axum::Router {
        app(
            self.router.clone(),
            self.config.defaults.clone(),
            self.config.server.strict_status,
        )
    }

    /// Binds the configured address and serves until Ctrl+C.
    pub async fn start(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = TcpListener::bind(&addr).await?;

        info!(
            address = %listener.local_addr()?,
            providers = ?self.router.registry().names(),
            strict_status = self.config.server.strict_status,
            "Switchboard listening"
        );

        axum::serve(listener, self.app())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

/// Builds the HTTP routes around `router`.
pub fn app(router: Router, defaults: crate::config::RequestDefaults, strict_status: bool) -> axum::Router {
    let state = AppState {
        router,
        defaults: Arc::new(defaults),
        strict_status,
    };

    axum::Router::new()
        .route("/", post(handler::route))
        .route("/v1/route", post(handler::route))
        .route("/health", get(handler::health))
        .route("/providers", get(handler::providers))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Turns a panic inside a handler or provider into the usual error body.
fn panic_response(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let detail = if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "Unknown panic".to_string()
    };

    error!(panic = %detail, "Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody::internal(detail)),
    )
        .into_response()
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{GenerationParams, Message, PendingProvider, Provider};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    struct PanickingProvider;

    #[async_trait]
    impl Provider for PanickingProvider {
        fn name(&self) -> &str {
            "broken"
        }

        async fn invoke(
            &self,
            _model: &str,
            _messages: &[Message],
            _params: &GenerationParams,
        ) -> crate::provider::Result<Value> {
            panic!("backend adapter bug")
        }
    }

    fn test_app(strict_status: bool) -> axum::Router {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(PendingProvider::openai()));
        registry.register(Arc::new(PendingProvider::anthropic()));
        registry.register(Arc::new(PanickingProvider));
        app(
            Router::new(Arc::new(registry)),
            crate::config::RequestDefaults::default(),
            strict_status,
        )
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app(false)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_providers_listing() {
        let response = test_app(false)
            .oneshot(Request::get("/providers").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(
            body_json(response).await,
            serde_json::json!({"providers": ["anthropic", "broken", "openai"]})
        );
    }

    #[tokio::test]
    async fn test_route_success_carries_cors_and_json_headers() {
        let response = test_app(false)
            .oneshot(post_json("/v1/route", r#"{"provider": "anthropic", "model": "claude"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_json(response).await["status"], "pending");
    }

    #[tokio::test]
    async fn test_unknown_provider_status_depends_on_strictness() {
        let lenient = test_app(false)
            .oneshot(post_json("/", r#"{"provider": "unknown"}"#))
            .await
            .unwrap();
        assert_eq!(lenient.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(lenient.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body = body_json(lenient).await;
        assert_eq!(body["error"], "Unknown provider: unknown");
        assert_eq!(body["message"], "Internal server error");

        let strict = test_app(true)
            .oneshot(post_json("/", r#"{"provider": "unknown"}"#))
            .await
            .unwrap();
        assert_eq!(strict.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unsupported_role() {
        let response = test_app(true)
            .oneshot(post_json(
                "/",
                r#"{"provider": "openai", "messages": [{"role": "tool", "content": "x"}]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Unsupported message role: tool");
    }

    #[tokio::test]
    async fn test_provider_panic_becomes_error_body() {
        let response = test_app(false)
            .oneshot(post_json("/", r#"{"provider": "broken"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body = body_json(response).await;
        assert_eq!(body["error"], "backend adapter bug");
        assert_eq!(body["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_preflight() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/v1/route")
            .header(header::ORIGIN, "https://chat.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = test_app(false).oneshot(request).await.unwrap();
        assert!(response.status().is_success());
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let methods = response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS]
            .to_str()
            .unwrap()
            .to_string();
        assert!(methods.contains("POST"));
        assert!(methods.contains("OPTIONS"));
    }
}
