//! Image acquisition with provider fallback.
//!
//! [`ImagePipeline`] tries each configured provider once, in priority order,
//! and normalizes the first successful response. When every provider fails,
//! or none is configured, the local [`FallbackRenderer`] draws the image, so
//! acquisition itself never fails.

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{Result, StoryVizError};
use crate::normalize::normalize;
use crate::prompt::story_prompt;
use crate::provider::{ImageProvider, ProviderClient};
use crate::render::{FallbackRenderer, RenderSpec};
use crate::types::{DecodedImage, ImageRequest};
use std::time::Instant;

/// Outcome of one acquisition.
#[derive(Debug)]
pub struct Acquisition {
    /// The image handed to the caller.
    pub image: DecodedImage,
    /// Where the image came from.
    pub source: ProviderKind,
    /// Providers that were tried and failed, in the order they were tried.
    pub failures: Vec<(ProviderKind, StoryVizError)>,
}

impl Acquisition {
    /// Returns true if the local renderer produced the image.
    pub fn is_fallback(&self) -> bool {
        self.source == ProviderKind::Fallback
    }
}

/// Orchestrates providers, normalization and the fallback renderer.
///
/// Providers are the configured [`ProviderClient`]s unless built otherwise
/// with [`from_parts`](Self::from_parts).
pub struct ImagePipeline<P = ProviderClient> {
    providers: Vec<P>,
    renderer: FallbackRenderer,
}

impl<P: ImageProvider> std::fmt::Debug for ImagePipeline<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|p| p.name()).collect();
        f.debug_struct("ImagePipeline")
            .field("providers", &names)
            .field("renderer", &self.renderer)
            .finish()
    }
}

impl ImagePipeline {
    /// Builds the pipeline from `config`, with the renderer configured from
    /// the environment.
    ///
    /// Fails only if the renderer cannot draw at all.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let renderer = FallbackRenderer::new(RenderSpec::from_env())?;
        Self::with_renderer(config, renderer)
    }

    /// Builds the pipeline from `config` around an existing renderer.
    pub fn with_renderer(config: &ProviderConfig, renderer: FallbackRenderer) -> Result<Self> {
        Ok(Self::from_parts(ProviderClient::chain(config)?, renderer))
    }
}

impl<P: ImageProvider> ImagePipeline<P> {
    /// Builds the pipeline from explicit providers, tried in the given order.
    pub fn from_parts(providers: Vec<P>, renderer: FallbackRenderer) -> Self {
        if providers.is_empty() {
            tracing::info!("no image provider configured; images will be rendered locally");
        }
        Self {
            providers,
            renderer,
        }
    }

    /// Kinds of the providers that will be tried, in order.
    pub fn provider_kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    /// The fallback renderer.
    pub fn renderer(&self) -> &FallbackRenderer {
        &self.renderer
    }

    /// Returns an image for `request`; never fails.
    pub async fn acquire(&self, request: &ImageRequest) -> DecodedImage {
        self.acquire_detailed(request).await.image
    }

    /// Like [`acquire`](Self::acquire), also reporting the source and
    /// every provider failure.
    pub async fn acquire_detailed(&self, request: &ImageRequest) -> Acquisition {
        let started = Instant::now();
        let mut failures = Vec::new();

        for provider in &self.providers {
            let kind = provider.kind();
            tracing::debug!(
                provider = %kind,
                prompt_chars = story_prompt(request).chars().count(),
                "trying image provider"
            );
            match self.attempt(provider, request).await {
                Ok(image) => {
                    tracing::info!(
                        source = %kind,
                        width = image.width(),
                        height = image.height(),
                        duration_ms = started.elapsed().as_millis() as u64,
                        "image acquired"
                    );
                    return Acquisition {
                        image,
                        source: kind,
                        failures,
                    };
                }
                Err(err) => {
                    if err.is_recoverable() {
                        tracing::warn!(
                            provider = %kind,
                            status = ?err.status(),
                            error_kind = ?err.kind(),
                            error = %err,
                            "provider attempt failed"
                        );
                    } else {
                        tracing::error!(
                            provider = %kind,
                            error_kind = ?err.kind(),
                            error = %err,
                            "provider attempt failed with a local error"
                        );
                    }
                    failures.push((kind, err));
                }
            }
        }

        if !self.providers.is_empty() {
            tracing::info!(
                attempts = failures.len(),
                "all providers failed; rendering fallback image"
            );
        }
        let image = self.renderer.render(request);
        tracing::info!(
            source = %ProviderKind::Fallback,
            width = image.width(),
            height = image.height(),
            duration_ms = started.elapsed().as_millis() as u64,
            "image acquired"
        );
        Acquisition {
            image,
            source: ProviderKind::Fallback,
            failures,
        }
    }

    async fn attempt(&self, provider: &P, request: &ImageRequest) -> Result<DecodedImage> {
        let raw = provider.generate(request).await?;
        normalize(&raw)
    }
}
