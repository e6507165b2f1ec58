use crate::config::RequestDefaults;
use crate::provider::{GenerationParams, Message, Role, UnsupportedRole};
use crate::router::RouteRequest;
use serde::{Deserialize, Serialize};

/// A message as received on the wire.
///
/// The role is kept as a string here so an unknown role is reported as
/// such rather than as a generic parse failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    pub role: String,
    pub content: String,
}

/// Body of a routing request. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default)]
    pub messages: Vec<InboundMessage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl InboundRequest {
    /// Fills in defaults and lowercases the provider name.
    pub fn into_route_request(
        self,
        defaults: &RequestDefaults,
    ) -> Result<RouteRequest, UnsupportedRole> {
        let messages = self
            .messages
            .into_iter()
            .map(|m| m.role.parse::<Role>().map(|role| Message::new(role, m.content)))
            .collect::<Result<Vec<_>, UnsupportedRole>>()?;

        let fallback = defaults.params();
        let params = GenerationParams {
            max_tokens: self.max_tokens.unwrap_or(fallback.max_tokens),
            temperature: self.temperature.unwrap_or(fallback.temperature),
            stream: self.stream.unwrap_or(fallback.stream),
        };

        let provider = self.provider.unwrap_or_else(|| defaults.provider.clone());

        Ok(RouteRequest {
            provider: provider.to_lowercase(),
            model: self.model.unwrap_or_else(|| defaults.model.clone()),
            messages,
            params,
        })
    }
}

/// Body returned for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn internal(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_request_uses_defaults() {
        let request = InboundRequest::default()
            .into_route_request(&RequestDefaults::default())
            .unwrap();

        assert_eq!(request.provider, "bedrock");
        assert_eq!(request.model, "anthropic.claude-v2");
        assert!(request.messages.is_empty());
        assert_eq!(request.params, GenerationParams::default());
    }

    #[test]
    fn test_provider_is_lowercased() {
        let inbound: InboundRequest = serde_json::from_str(r#"{"provider": "OpenAI"}"#).unwrap();
        let request = inbound.into_route_request(&RequestDefaults::default()).unwrap();
        assert_eq!(request.provider, "openai");
    }

    #[test]
    fn test_explicit_fields_override_defaults() {
        let inbound: InboundRequest = serde_json::from_str(
            r#"{
                "model": "m1",
                "messages": [{"role": "system", "content": "s"}, {"role": "user", "content": "u"}],
                "temperature": 0.1,
                "max_tokens": 12,
                "stream": true
            }"#,
        )
        .unwrap();
        let request = inbound.into_route_request(&RequestDefaults::default()).unwrap();

        assert_eq!(request.model, "m1");
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1], Message::user("u"));
        assert_eq!(
            request.params,
            GenerationParams {
                max_tokens: 12,
                temperature: 0.1,
                stream: true
            }
        );
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let inbound: InboundRequest =
            serde_json::from_str(r#"{"messages": [{"role": "tool", "content": "x"}]}"#).unwrap();
        let err = inbound.into_route_request(&RequestDefaults::default()).unwrap_err();
        assert_eq!(err, UnsupportedRole("tool".to_string()));
    }

    #[test]
    fn test_error_body_shape() {
        let body = serde_json::to_value(ErrorBody::internal("boom")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"error": "boom", "message": "Internal server error"})
        );
    }
}
