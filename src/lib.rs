#![warn(missing_docs)]
//! StoryViz - illustrations for children's stories.
//!
//! Turns a story (title, body, language) into a single image. Configured
//! image providers are tried in priority order; when none is configured or
//! every one fails, a local renderer draws a storybook page with the story
//! text, so acquiring an image never fails.
//!
//! # Quick Start
//!
//! ```no_run
//! use storyviz::{ImagePipeline, ImageRequest, Language, ProviderConfig};
//!
//! #[tokio::main]
//! async fn main() -> storyviz::Result<()> {
//!     let config = ProviderConfig::from_env();
//!     let pipeline = ImagePipeline::new(&config)?;
//!     let request = ImageRequest::new("الثعلب الصغير", "كان يا ما كان...", Language::Ar)?;
//!     let image = pipeline.acquire(&request).await;
//!     image.save("story.png")?;
//!     Ok(())
//! }
//! ```
//!
//! # Providers
//!
//! - Clipdrop: binary text-to-image API (`USE_CLIPDROP` + `CUSTOM_IMAGE_API_KEY`)
//! - Generic model: Hugging Face style inference endpoint
//!   (`CUSTOM_IMAGE_API_KEY` + `CUSTOM_IMAGE_MODEL`)
//! - Gemini: text model imaging endpoint (`GEMINI_API_KEY`)
//!
//! # Features
//!
//! - `cli` (default): the `storyviz` command-line tool

pub mod config;
mod error;
pub mod normalize;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod render;
pub mod types;

// Re-export error types at crate root
pub use error::{ErrorKind, Result, StoryVizError};

pub use config::{provider_chain, select_provider, ProviderConfig, ProviderKind};
pub use normalize::normalize;
pub use pipeline::{Acquisition, ImagePipeline};
pub use provider::{ImageProvider, ProviderClient};
pub use providers::{
    ClipdropClient, ClipdropClientBuilder, GeminiImagingClient, GeminiImagingClientBuilder,
    GenericModelClient, GenericModelClientBuilder, ModelTarget,
};
pub use render::{FallbackRenderer, RenderSpec};
pub use types::{DecodedImage, ImageFormat, ImageRequest, Language, RawProviderResponse};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{ProviderConfig, ProviderKind};
    pub use crate::error::{Result, StoryVizError};
    pub use crate::pipeline::ImagePipeline;
    pub use crate::provider::ImageProvider;
    pub use crate::render::FallbackRenderer;
    pub use crate::types::{DecodedImage, ImageRequest, Language};
}
