//! Image provider clients.

mod clipdrop;
mod gemini;
mod generic;

pub use clipdrop::{ClipdropClient, ClipdropClientBuilder};
pub use gemini::{GeminiImagingClient, GeminiImagingClientBuilder};
pub use generic::{GenericModelClient, GenericModelClientBuilder, ModelTarget};

use crate::config::ProviderKind;
use crate::error::{sanitize_error_message, Result, StoryVizError};
use crate::types::RawProviderResponse;
use std::time::Duration;

/// Sends a prepared request and returns the raw response if it is 2xx.
pub(crate) async fn dispatch(
    provider: ProviderKind,
    request: reqwest::RequestBuilder,
    timeout: Duration,
) -> Result<RawProviderResponse> {
    let response = request
        .send()
        .await
        .map_err(|e| StoryVizError::from_transport(e, timeout))?;

    let raw = RawProviderResponse::read(response)
        .await
        .map_err(|e| StoryVizError::from_transport(e, timeout))?;

    if !(200..300).contains(&raw.status) {
        return Err(StoryVizError::ProviderRejected {
            provider,
            status: raw.status,
            message: sanitize_error_message(&String::from_utf8_lossy(&raw.bytes)),
        });
    }

    tracing::debug!(
        provider = %provider,
        status = raw.status,
        content_type = raw.content_type().as_deref().unwrap_or("-"),
        bytes = raw.bytes.len(),
        "provider responded"
    );
    Ok(raw)
}

/// Builds a reqwest client with the per-call timeout applied.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
