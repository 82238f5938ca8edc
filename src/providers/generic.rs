//! Generic model provider: Hugging Face style inference endpoints, addressed
//! either by hosted model id or by a full URL.

use crate::config::{ProviderKind, DEFAULT_TIMEOUT};
use crate::error::{Result, StoryVizError};
use crate::prompt::story_prompt;
use crate::provider::ImageProvider;
use crate::types::{ImageRequest, RawProviderResponse};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const HOSTED_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/models";

/// Where the generic provider sends its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelTarget {
    /// Fully-qualified endpoint, posted to verbatim.
    Url(String),
    /// Hosted model id such as `org/model-name`.
    Hosted(String),
}

impl ModelTarget {
    /// Classifies a `CUSTOM_IMAGE_MODEL` value.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let lower = value.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(value.to_string())
        } else {
            Self::Hosted(value.trim_matches('/').to_string())
        }
    }

    /// Returns the URL requests are posted to.
    pub fn endpoint(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::Hosted(model) => format!("{HOSTED_INFERENCE_BASE}/{model}"),
        }
    }
}

/// Builder for GenericModelClient.
#[derive(Debug, Clone)]
pub struct GenericModelClientBuilder {
    api_key: Option<String>,
    target: Option<ModelTarget>,
    timeout: Duration,
}

impl Default for GenericModelClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            target: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GenericModelClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bearer token.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model id or URL.
    pub fn target(mut self, model_ref: impl AsRef<str>) -> Self {
        self.target = Some(ModelTarget::parse(model_ref.as_ref()));
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client. Both the key and the target are required.
    pub fn build(self) -> Result<GenericModelClient> {
        let (api_key, target) = match (self.api_key, self.target) {
            (Some(key), Some(target)) => (key, target),
            _ => return Err(StoryVizError::ConfigurationAbsent),
        };

        Ok(GenericModelClient {
            client: super::http_client(self.timeout)?,
            api_key,
            target,
            timeout: self.timeout,
        })
    }
}

/// Generic model client.
pub struct GenericModelClient {
    client: reqwest::Client,
    api_key: String,
    target: ModelTarget,
    timeout: Duration,
}

impl GenericModelClient {
    /// Creates a new `GenericModelClientBuilder`.
    pub fn builder() -> GenericModelClientBuilder {
        GenericModelClientBuilder::new()
    }

    /// Returns the configured target.
    pub fn target(&self) -> &ModelTarget {
        &self.target
    }
}

#[async_trait]
impl ImageProvider for GenericModelClient {
    async fn generate(&self, request: &ImageRequest) -> Result<RawProviderResponse> {
        let body = InferenceRequest::new(story_prompt(request));
        let url = self.target.endpoint();
        tracing::debug!(
            provider = %ProviderKind::GenericModel,
            url = %url,
            prompt_chars = body.inputs.chars().count(),
            "submitting inference request"
        );

        let http = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body);

        super::dispatch(ProviderKind::GenericModel, http, self.timeout).await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::GenericModel
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest {
    inputs: String,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    num_inference_steps: u32,
    guidance_scale: f32,
    width: u32,
    height: u32,
}

impl InferenceRequest {
    fn new(prompt: String) -> Self {
        Self {
            inputs: prompt,
            parameters: InferenceParameters {
                num_inference_steps: 50,
                guidance_scale: 7.5,
                width: 1024,
                height: 1024,
            },
        }
    }
}
