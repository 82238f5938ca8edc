//! Provider configuration and the selection policy.
//!
//! Configuration is read once at process start into an immutable
//! [`ProviderConfig`]. Every decision about which provider to call is a pure
//! function of that value, so the policy can be tested without touching the
//! process environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Credential for the generic-model or binary-image provider.
pub const ENV_CUSTOM_IMAGE_API_KEY: &str = "CUSTOM_IMAGE_API_KEY";
/// Model identifier or fully-qualified URL for the generic provider.
pub const ENV_CUSTOM_IMAGE_MODEL: &str = "CUSTOM_IMAGE_MODEL";
/// Flag selecting the binary-image (Clipdrop) provider path.
pub const ENV_USE_CLIPDROP: &str = "USE_CLIPDROP";
/// Credential for the text-model-as-imaging path.
pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
/// Gemini model used for imaging; `imagen-*` models go through `:predict`.
pub const ENV_IMAGE_MODEL: &str = "IMAGE_MODEL";
/// Per-request timeout in seconds.
pub const ENV_IMAGE_TIMEOUT_SECS: &str = "IMAGE_TIMEOUT_SECS";
/// Clipdrop endpoint override.
pub const ENV_CLIPDROP_API_URL: &str = "CLIPDROP_API_URL";
/// Gemini API base override.
pub const ENV_GEMINI_API_BASE: &str = "GEMINI_API_BASE";
/// Font file tried first for Latin text by the fallback renderer.
pub const ENV_FONT_LATIN: &str = "STORY_FONT_LATIN";
/// Font file tried first for Arabic text by the fallback renderer.
pub const ENV_FONT_ARABIC: &str = "STORY_FONT_ARABIC";

/// Default Clipdrop text-to-image endpoint.
pub const DEFAULT_CLIPDROP_URL: &str = "https://clipdrop-api.co/text-to-image/v1";
/// Default Gemini API base.
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";
/// Default Gemini imaging model.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash-image";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The provider families the pipeline knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Clipdrop text-to-image; answers with raw image bytes.
    Clipdrop,
    /// Hugging Face style inference endpoint (hosted model id or URL).
    GenericModel,
    /// Gemini used through its image-generation endpoint.
    Gemini,
    /// Local renderer, no network.
    Fallback,
}

impl ProviderKind {
    /// Human-readable name for display.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Clipdrop => "Clipdrop text-to-image",
            Self::GenericModel => "Generic model endpoint",
            Self::Gemini => "Gemini imaging",
            Self::Fallback => "Local fallback renderer",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clipdrop => write!(f, "clipdrop"),
            Self::GenericModel => write!(f, "generic-model"),
            Self::Gemini => write!(f, "gemini"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Immutable provider configuration, loaded once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// `USE_CLIPDROP` flag.
    pub clipdrop_enabled: bool,
    /// `CUSTOM_IMAGE_API_KEY`.
    pub api_key: Option<String>,
    /// `CUSTOM_IMAGE_MODEL`: bare model id or full URL.
    pub model_ref: Option<String>,
    /// `GEMINI_API_KEY`.
    pub gemini_api_key: Option<String>,
    /// `IMAGE_MODEL`: Gemini or Imagen model used for imaging.
    pub gemini_model: String,
    /// Timeout applied to every provider call.
    pub timeout: Duration,
    /// Clipdrop endpoint.
    pub clipdrop_url: String,
    /// Gemini API base URL.
    pub gemini_base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            clipdrop_enabled: false,
            api_key: None,
            model_ref: None,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            clipdrop_url: DEFAULT_CLIPDROP_URL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE.to_string(),
        }
    }
}

impl ProviderConfig {
    /// Loads the configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Empty or whitespace-only values count as absent. Unparseable numeric
    /// values fall back to their defaults instead of failing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout = get(ENV_IMAGE_TIMEOUT_SECS)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);

        Self {
            clipdrop_enabled: get(ENV_USE_CLIPDROP).is_some_and(|v| parse_flag(&v)),
            api_key: get(ENV_CUSTOM_IMAGE_API_KEY),
            model_ref: get(ENV_CUSTOM_IMAGE_MODEL),
            gemini_api_key: get(ENV_GEMINI_API_KEY),
            gemini_model: get(ENV_IMAGE_MODEL).unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            timeout,
            clipdrop_url: get(ENV_CLIPDROP_API_URL)
                .unwrap_or_else(|| DEFAULT_CLIPDROP_URL.to_string()),
            gemini_base_url: get(ENV_GEMINI_API_BASE)
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE.to_string()),
        }
    }

    /// Returns true if a Gemini credential is present.
    pub fn gemini_key_present(&self) -> bool {
        self.gemini_api_key.is_some()
    }

    fn clipdrop_ready(&self) -> bool {
        self.clipdrop_enabled && self.api_key.is_some()
    }

    fn generic_ready(&self) -> bool {
        self.api_key.is_some() && self.model_ref.is_some()
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Returns every network provider the configuration enables, highest
/// priority first.
///
/// A half-configured provider (flag without key, key without model) is
/// skipped silently.
pub fn provider_chain(config: &ProviderConfig) -> Vec<ProviderKind> {
    let mut chain = Vec::with_capacity(3);
    if config.clipdrop_ready() {
        chain.push(ProviderKind::Clipdrop);
    }
    if config.generic_ready() {
        chain.push(ProviderKind::GenericModel);
    }
    if config.gemini_key_present() {
        chain.push(ProviderKind::Gemini);
    }
    chain
}

/// Picks the highest-priority provider for this configuration.
pub fn select_provider(config: &ProviderConfig) -> ProviderKind {
    provider_chain(config)
        .first()
        .copied()
        .unwrap_or(ProviderKind::Fallback)
}
