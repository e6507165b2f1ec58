use crate::config::Config;
use crate::provider::{BedrockProvider, PendingProvider, Provider, ProviderError};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry mapping provider names to their integrations.
///
/// Built once at startup and shared read-only afterwards; lookups are
/// case-insensitive because names are stored lowercase.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Builds the standard set: Bedrock plus the pending OpenAI and
    /// Anthropic placeholders.
    pub fn from_config(config: &Config) -> Result<Self, ProviderError> {
        let mut registry = Self::new();
        registry.register(Arc::new(BedrockProvider::new(&config.bedrock)?));
        registry.register(Arc::new(PendingProvider::openai()));
        registry.register(Arc::new(PendingProvider::anthropic()));
        Ok(registry)
    }

    /// Register a provider under its own name.
    /// Returns the provider previously registered under that name, if any.
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Option<Arc<dyn Provider>> {
        let name = provider.name().to_lowercase();
        self.register_as(name, provider)
    }

    /// Register a provider under an explicit name (an alias, for instance).
    pub fn register_as(
        &mut self,
        name: impl Into<String>,
        provider: Arc<dyn Provider>,
    ) -> Option<Arc<dyn Provider>> {
        self.providers.insert(name.into().to_lowercase(), provider)
    }

    /// Get a provider by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
