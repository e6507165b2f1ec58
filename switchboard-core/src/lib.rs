//! switchboard-core - Provider routing and request normalization
//!
//! Provides the building blocks for fronting several LLM backends with one
//! request shape:
//! - Provider abstraction (Amazon Bedrock, pending OpenAI/Anthropic stubs)
//! - Prompt formatting for completion-style backends
//! - Provider registry and router
//! - Configuration management
//! - HTTP entry point (primary interface)
//!
//! ## Primary API
//!
//! Most users start a [`Server`]; embedders can call [`Router::route`] directly.

// Public modules
pub mod config;
pub mod prompt;
pub mod provider;
pub mod router;
pub mod server;

// Public exports
pub use config::{BedrockConfig, Config, RequestDefaults, ServerConfig};
pub use prompt::{format_prompt, parse_prompt};
pub use router::{ProviderRegistry, RouteError, RouteRequest, RouteResult, Router};
pub use server::{ApiError, Server};

// Provider exports
pub use provider::{
    BedrockProvider, GenerationParams, Message, PendingProvider, Provider, ProviderError, Role,
};
