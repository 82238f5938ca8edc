//! Clipdrop text-to-image provider. Answers with raw image bytes.

use crate::config::{ProviderKind, DEFAULT_CLIPDROP_URL, DEFAULT_TIMEOUT};
use crate::error::{Result, StoryVizError};
use crate::prompt::story_prompt;
use crate::provider::ImageProvider;
use crate::types::{ImageRequest, RawProviderResponse};
use async_trait::async_trait;
use std::time::Duration;

/// Builder for ClipdropClient.
#[derive(Debug, Clone)]
pub struct ClipdropClientBuilder {
    api_key: Option<String>,
    endpoint: String,
    timeout: Duration,
}

impl Default for ClipdropClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_CLIPDROP_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClipdropClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the text-to-image endpoint.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<ClipdropClient> {
        let api_key = self
            .api_key
            .ok_or(StoryVizError::ConfigurationAbsent)?;

        Ok(ClipdropClient {
            client: super::http_client(self.timeout)?,
            api_key,
            endpoint: self.endpoint,
            timeout: self.timeout,
        })
    }
}

/// Clipdrop text-to-image client.
pub struct ClipdropClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl ClipdropClient {
    /// Creates a new `ClipdropClientBuilder`.
    pub fn builder() -> ClipdropClientBuilder {
        ClipdropClientBuilder::new()
    }
}

#[async_trait]
impl ImageProvider for ClipdropClient {
    async fn generate(&self, request: &ImageRequest) -> Result<RawProviderResponse> {
        let prompt = story_prompt(request);
        tracing::debug!(
            provider = %ProviderKind::Clipdrop,
            prompt_chars = prompt.chars().count(),
            "submitting text-to-image request"
        );

        let form = reqwest::multipart::Form::new().text("prompt", prompt);
        let http = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .multipart(form);

        super::dispatch(ProviderKind::Clipdrop, http, self.timeout).await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Clipdrop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_with_explicit_key() {
        let client = ClipdropClientBuilder::new().api_key("cd-key").build();
        assert!(client.is_ok());
    }

    #[test]
    fn test_builder_without_key_fails() {
        let err = ClipdropClientBuilder::new().build().err().unwrap();
        assert!(matches!(err, StoryVizError::ConfigurationAbsent));
    }

    #[test]
    fn test_builder_overrides() {
        let client = ClipdropClient::builder()
            .api_key("cd-key")
            .endpoint("http://localhost:1234/t2i")
            .timeout(Duration::from_secs(3))
            .build()
            .unwrap();
        assert_eq!(client.endpoint, "http://localhost:1234/t2i");
        assert_eq!(client.timeout, Duration::from_secs(3));
        assert_eq!(client.kind(), ProviderKind::Clipdrop);
    }
}
