//! Gemini used as an image provider. Shares its credential with story
//! generation.
//!
//! Gemini image models answer `generateContent` with inline image parts.
//! Imagen models (`imagen-*`) only serve `:predict`, which takes
//! `instances`/`parameters` and answers with `predictions[].bytesBase64Encoded`.

use crate::config::{ProviderKind, DEFAULT_GEMINI_BASE, DEFAULT_GEMINI_MODEL, DEFAULT_TIMEOUT};
use crate::error::{Result, StoryVizError};
use crate::prompt::story_prompt;
use crate::provider::ImageProvider;
use crate::types::{ImageRequest, RawProviderResponse};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Builder for GeminiImagingClient.
#[derive(Debug, Clone)]
pub struct GeminiImagingClientBuilder {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl Default for GeminiImagingClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GeminiImagingClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the imaging model.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<GeminiImagingClient> {
        let api_key = self
            .api_key
            .ok_or(StoryVizError::ConfigurationAbsent)?;

        Ok(GeminiImagingClient {
            client: super::http_client(self.timeout)?,
            api_key,
            model: self.model,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            timeout: self.timeout,
        })
    }
}

/// Gemini imaging client.
pub struct GeminiImagingClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiImagingClient {
    /// Creates a new `GeminiImagingClientBuilder`.
    pub fn builder() -> GeminiImagingClientBuilder {
        GeminiImagingClientBuilder::new()
    }

    fn method(&self) -> ImagingMethod {
        if self.model.starts_with("imagen-") {
            ImagingMethod::Predict
        } else {
            ImagingMethod::GenerateContent
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.base_url,
            self.model,
            self.method().as_str()
        )
    }
}

/// REST method serving a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImagingMethod {
    GenerateContent,
    Predict,
}

impl ImagingMethod {
    fn as_str(self) -> &'static str {
        match self {
            Self::GenerateContent => "generateContent",
            Self::Predict => "predict",
        }
    }
}

#[async_trait]
impl ImageProvider for GeminiImagingClient {
    async fn generate(&self, request: &ImageRequest) -> Result<RawProviderResponse> {
        let prompt = story_prompt(request);
        let method = self.method();
        tracing::debug!(
            provider = %ProviderKind::Gemini,
            model = %self.model,
            method = method.as_str(),
            "submitting imaging request"
        );

        let http = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json");
        let http = match method {
            ImagingMethod::GenerateContent => http.json(&GeminiRequest::from_prompt(prompt)),
            ImagingMethod::Predict => http.json(&ImagenRequest::from_prompt(prompt)),
        };

        super::dispatch(ProviderKind::Gemini, http, self.timeout).await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiTextPart>,
}

#[derive(Debug, Serialize)]
struct GeminiTextPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiConfig {
    response_modalities: Vec<String>,
}

impl GeminiRequest {
    fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![GeminiTextPart { text: prompt }],
            }],
            generation_config: GeminiConfig {
                response_modalities: vec!["IMAGE".to_string()],
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ImagenRequest {
    instances: Vec<ImagenInstance>,
    parameters: ImagenParameters,
}

#[derive(Debug, Serialize)]
struct ImagenInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenParameters {
    sample_count: u32,
    aspect_ratio: &'static str,
}

impl ImagenRequest {
    fn from_prompt(prompt: String) -> Self {
        Self {
            instances: vec![ImagenInstance { prompt }],
            parameters: ImagenParameters {
                sample_count: 1,
                aspect_ratio: "1:1",
            },
        }
    }
}
