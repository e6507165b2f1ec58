//! Amazon Bedrock provider implementation.
//!
//! Calls the Bedrock runtime `InvokeModel` API with a completion-style body:
//! the conversation is flattened by [`format_prompt`](crate::prompt::format_prompt)
//! and the JSON returned by Bedrock is handed back to the caller as-is.

use super::sigv4::{AwsCredentials, Signer};
use super::types::*;
use crate::config::BedrockConfig;
use crate::prompt::format_prompt;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const PROVIDER_NAME: &str = "bedrock";

const SIGNING_SERVICE: &str = "bedrock";
const DEFAULT_REGION: &str = "us-east-1";

/// How requests to Bedrock are authenticated.
#[derive(Debug, Clone)]
pub enum BedrockAuth {
    Sigv4(AwsCredentials),
    Bearer(String),
}

impl BedrockAuth {
    /// Picks credentials from configuration first, then from the environment.
    ///
    /// Within each source a bearer token wins over an access key pair.
    pub fn resolve(config: &BedrockConfig, env: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let from_config = Self::from_values(
            config.bearer_token.clone(),
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            config.session_token.clone(),
        );

        from_config.or_else(|| {
            Self::from_values(
                env("AWS_BEARER_TOKEN_BEDROCK"),
                env("AWS_ACCESS_KEY_ID"),
                env("AWS_SECRET_ACCESS_KEY"),
                env("AWS_SESSION_TOKEN"),
            )
        })
    }

    fn from_values(
        bearer: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        session_token: Option<String>,
    ) -> Option<Self> {
        if let Some(token) = non_empty(bearer) {
            return Some(Self::Bearer(token));
        }

        match (non_empty(access_key_id), non_empty(secret_access_key)) {
            (Some(access_key_id), Some(secret_access_key)) => Some(Self::Sigv4(AwsCredentials {
                access_key_id,
                secret_access_key,
                session_token: non_empty(session_token),
            })),
            _ => None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Amazon Bedrock runtime provider.
#[derive(Debug, Clone)]
pub struct BedrockProvider {
    http_client: reqwest::Client,
    region: String,
    endpoint: Option<String>,
    auth: Option<BedrockAuth>,
}

impl BedrockProvider {
    /// Creates a provider from configuration, reading missing credentials
    /// and region from the process environment.
    pub fn new(config: &BedrockConfig) -> Result<Self> {
        Self::with_env(config, |key| std::env::var(key).ok())
    }

    /// Like [`new`](Self::new) with an explicit environment lookup.
    pub fn with_env(config: &BedrockConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let region = non_empty(config.region.clone())
            .or_else(|| non_empty(env("AWS_REGION")))
            .or_else(|| non_empty(env("AWS_DEFAULT_REGION")))
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Ok(Self {
            http_client: builder.build()?,
            region,
            endpoint: non_empty(config.endpoint.clone()),
            auth: BedrockAuth::resolve(config, &env),
        })
    }

    /// Replaces whatever credentials were resolved at construction.
    pub fn with_auth(mut self, auth: BedrockAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Builds the `InvokeModel` URL; the model id is the routing key.
    fn invoke_url(&self, model: &str) -> Result<Url> {
        let model = model.trim();
        if model.is_empty() {
            return Err(ProviderError::Other("Bedrock model id cannot be empty".to_string()));
        }

        let base = self
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://bedrock-runtime.{}.amazonaws.com", self.region));
        let mut url = Url::parse(&base)
            .map_err(|e| ProviderError::Other(format!("Invalid Bedrock endpoint '{}': {}", base, e)))?;

        url.path_segments_mut()
            .map_err(|()| ProviderError::Other(format!("Bedrock endpoint '{}' cannot carry a path", base)))?
            .pop_if_empty()
            .extend(["model", model, "invoke"]);

        Ok(url)
    }

    /// Converts a conversation into Bedrock's completion request body.
    pub fn build_request(messages: &[Message], params: &GenerationParams) -> BedrockInvokeRequest {
        BedrockInvokeRequest {
            prompt: format_prompt(messages),
            max_tokens_to_sample: params.max_tokens,
            temperature: params.temperature,
            stream: params.stream,
        }
    }
}

#[async_trait]
impl Provider for BedrockProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn invoke(
        &self,
        model: &str,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<Value> {
        let url = self.invoke_url(model)?;
        let body = serde_json::to_vec(&Self::build_request(messages, params))?;

        let auth = self.auth.as_ref().ok_or_else(|| {
            ProviderError::Auth(
                "Bedrock requires credentials: set bedrock.bearer_token, bedrock.access_key_id/secret_access_key, \
                 AWS_BEARER_TOKEN_BEDROCK or AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY"
                    .to_string(),
            )
        })?;

        debug!(
            model = %model,
            url = %url,
            message_count = messages.len(),
            max_tokens = params.max_tokens,
            "Invoking Bedrock model"
        );

        let mut request = self
            .http_client
            .post(url.as_str())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        request = match auth {
            BedrockAuth::Bearer(token) => request.bearer_auth(token),
            BedrockAuth::Sigv4(credentials) => {
                let signed = Signer::new(credentials, &self.region, SIGNING_SERVICE)
                    .sign("POST", &url, &body, Utc::now())?;
                let request = request
                    .header("authorization", signed.authorization)
                    .header("x-amz-date", signed.amz_date)
                    .header("x-amz-content-sha256", signed.payload_hash);
                match signed.security_token {
                    Some(token) => request.header("x-amz-security-token", token),
                    None => request,
                }
            }
        };

        let response = request.body(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            warn!(model = %model, status = status.as_u16(), "Bedrock returned an error");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }
}

/// Request body for Bedrock's completion-style `InvokeModel` call.
#[derive(Debug, Clone, Serialize)]
pub struct BedrockInvokeRequest {
    pub prompt: String,
    pub max_tokens_to_sample: u32,
    pub temperature: f64,
    pub stream: bool,
}
