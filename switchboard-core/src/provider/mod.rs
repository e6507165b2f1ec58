//! LLM provider abstraction layer.
//!
//! Each backend gets one [`Provider`] implementation that owns its wire
//! format. Bedrock is fully implemented; OpenAI and Anthropic are registered
//! as [`PendingProvider`] placeholders.

mod types;
pub mod bedrock;
pub mod pending;
pub mod sigv4;

// Re-export common types
pub use types::{
    GenerationParams,
    Message,
    Provider,
    ProviderError,
    Result,
    Role,
    UnsupportedRole,
};

// Re-export provider implementations
pub use bedrock::{BedrockAuth, BedrockProvider};
pub use pending::PendingProvider;
