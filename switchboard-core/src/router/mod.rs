//! Provider dispatch.
//!
//! The [`Router`] looks up the requested provider in an immutable
//! [`ProviderRegistry`] and hands the request to it. It does no retries,
//! timeouts or response validation; those belong to each provider.

mod registry;

pub use registry::ProviderRegistry;

use crate::provider::{GenerationParams, Message, ProviderError};
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors produced while routing a request.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The provider name is not registered. No backend was contacted.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// The provider was found but its backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] ProviderError),
}

impl RouteError {
    /// Stable tag for logs and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            RouteError::UnknownProvider(_) => "unknown_provider",
            RouteError::Backend(_) => "backend_error",
        }
    }
}

/// Either the provider's native payload or a routing failure.
pub type RouteResult = std::result::Result<Value, RouteError>;

/// Normalized request handed to the router.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub provider: String,
    pub model: String,
    pub messages: Vec<Message>,
    pub params: GenerationParams,
}

impl RouteRequest {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
            messages,
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }
}

/// Dispatch table over registered providers.
///
/// Cheap to clone; every clone shares the same registry.
#[derive(Clone)]
pub struct Router {
    registry: Arc<ProviderRegistry>,
}

impl Router {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Sends `request` to the provider it names.
    ///
    /// Provider errors are passed through as [`RouteError::Backend`] without
    /// translation.
    pub async fn route(&self, request: &RouteRequest) -> RouteResult {
        let Some(provider) = self.registry.get(&request.provider) else {
            warn!(provider = %request.provider, "Rejected request for unknown provider");
            return Err(RouteError::UnknownProvider(request.provider.clone()));
        };

        debug!(
            provider = %request.provider,
            model = %request.model,
            message_count = request.messages.len(),
            "Dispatching request"
        );

        provider
            .invoke(&request.model, &request.messages, &request.params)
            .await
            .map_err(|e| {
                warn!(provider = %request.provider, model = %request.model, error = %e, "Provider call failed");
                RouteError::Backend(e)
            })
    }
}
