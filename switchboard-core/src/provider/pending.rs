//! Placeholder provider for backends that are registered but not wired up.
//!
//! Calls succeed with a payload that says the integration is pending, so a
//! caller can tell "not available yet" apart from "the backend call failed".

use super::types::*;
use async_trait::async_trait;
use serde_json::{json, Value};

/// Provider that answers every request with an "integration pending" marker.
#[derive(Debug, Clone)]
pub struct PendingProvider {
    name: String,
    label: String,
}

impl PendingProvider {
    /// `name` is the registry key, `label` the human-readable backend name.
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }

    pub fn openai() -> Self {
        Self::new("openai", "OpenAI")
    }

    pub fn anthropic() -> Self {
        Self::new("anthropic", "Anthropic")
    }
}

#[async_trait]
impl Provider for PendingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(
        &self,
        model: &str,
        _messages: &[Message],
        _params: &GenerationParams,
    ) -> Result<Value> {
        Ok(json!({
            "error": format!("{} integration pending", self.label),
            "status": "pending",
            "provider": self.name,
            "model": model,
        }))
    }
}
