//! Provider capability trait and the closed set of provider clients.

use crate::config::{provider_chain, ProviderConfig, ProviderKind};
use crate::error::Result;
use crate::providers::{ClipdropClient, GeminiImagingClient, GenericModelClient};
use crate::types::{ImageRequest, RawProviderResponse};
use async_trait::async_trait;

/// Capability shared by every network image provider.
///
/// Implementations make exactly one HTTP call, bounded by their timeout, and
/// hand back the raw 2xx response. Non-2xx statuses, timeouts and transport
/// failures come back as errors; nothing retries here.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Asks the provider for an image illustrating `request`.
    async fn generate(&self, request: &ImageRequest) -> Result<RawProviderResponse>;

    /// Returns the kind of this provider.
    fn kind(&self) -> ProviderKind;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str {
        self.kind().display_name()
    }
}

/// One configured provider client.
pub enum ProviderClient {
    /// Binary-image provider.
    Clipdrop(ClipdropClient),
    /// Generic model endpoint.
    GenericModel(GenericModelClient),
    /// Text model used through its imaging endpoint.
    Gemini(GeminiImagingClient),
}

impl ProviderClient {
    /// Builds the client for `kind` from `config`.
    ///
    /// Returns `Ok(None)` for [`ProviderKind::Fallback`] and for kinds whose
    /// required fields are missing.
    pub fn from_config(kind: ProviderKind, config: &ProviderConfig) -> Result<Option<Self>> {
        let client = match kind {
            ProviderKind::Clipdrop => match (&config.api_key, config.clipdrop_enabled) {
                (Some(key), true) => Some(Self::Clipdrop(
                    ClipdropClient::builder()
                        .api_key(key)
                        .endpoint(&config.clipdrop_url)
                        .timeout(config.timeout)
                        .build()?,
                )),
                _ => None,
            },
            ProviderKind::GenericModel => match (&config.api_key, &config.model_ref) {
                (Some(key), Some(model)) => Some(Self::GenericModel(
                    GenericModelClient::builder()
                        .api_key(key)
                        .target(model)
                        .timeout(config.timeout)
                        .build()?,
                )),
                _ => None,
            },
            ProviderKind::Gemini => match &config.gemini_api_key {
                Some(key) => Some(Self::Gemini(
                    GeminiImagingClient::builder()
                        .api_key(key)
                        .model(&config.gemini_model)
                        .base_url(&config.gemini_base_url)
                        .timeout(config.timeout)
                        .build()?,
                )),
                None => None,
            },
            ProviderKind::Fallback => None,
        };
        Ok(client)
    }

    /// Builds every client the configuration enables, in priority order.
    pub fn chain(config: &ProviderConfig) -> Result<Vec<Self>> {
        let mut clients = Vec::new();
        for kind in provider_chain(config) {
            if let Some(client) = Self::from_config(kind, config)? {
                clients.push(client);
            }
        }
        Ok(clients)
    }
}

#[async_trait]
impl ImageProvider for ProviderClient {
    async fn generate(&self, request: &ImageRequest) -> Result<RawProviderResponse> {
        match self {
            Self::Clipdrop(client) => client.generate(request).await,
            Self::GenericModel(client) => client.generate(request).await,
            Self::Gemini(client) => client.generate(request).await,
        }
    }

    fn kind(&self) -> ProviderKind {
        match self {
            Self::Clipdrop(_) => ProviderKind::Clipdrop,
            Self::GenericModel(_) => ProviderKind::GenericModel,
            Self::Gemini(_) => ProviderKind::Gemini,
        }
    }
}
