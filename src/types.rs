//! Core types shared by the providers, the normalizer and the renderer.

use crate::error::{Result, StoryVizError};
use ::image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;

/// Story language; decides paragraph direction when rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Arabic, right-to-left.
    #[default]
    Ar,
    /// English, left-to-right.
    En,
}

impl Language {
    /// Returns true for right-to-left languages.
    pub fn is_rtl(&self) -> bool {
        matches!(self, Self::Ar)
    }

    /// Returns the language code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ar => "ar",
            Self::En => "en",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = StoryVizError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ar" | "arabic" | "العربية" => Ok(Self::Ar),
            "en" | "english" => Ok(Self::En),
            other => Err(StoryVizError::InvalidRequest(format!(
                "unsupported language: {other}"
            ))),
        }
    }
}

/// A request to illustrate one story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Story title.
    pub title: String,
    /// Story body. Never empty when built through [`ImageRequest::new`].
    pub body: String,
    /// Story language.
    pub language: Language,
}

impl ImageRequest {
    /// Creates a new request, rejecting an empty body.
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        language: Language,
    ) -> Result<Self> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(StoryVizError::InvalidRequest("story body is empty".into()));
        }
        Ok(Self {
            title: title.into(),
            body,
            language,
        })
    }
}

/// An HTTP response exactly as a provider returned it.
#[derive(Debug, Clone)]
pub struct RawProviderResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, names lowercased.
    pub headers: BTreeMap<String, String>,
    /// Response body.
    pub bytes: Vec<u8>,
}

impl RawProviderResponse {
    /// Creates a response, lowercasing header names.
    pub fn new<I, K, V>(status: u16, headers: I, bytes: Vec<u8>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
            .collect();
        Self {
            status,
            headers,
            bytes,
        }
    }

    /// Drains a reqwest response into an owned value.
    pub(crate) async fn read(response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let bytes = response.bytes().await?.to_vec();
        Ok(Self::new(status, headers, bytes))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Declared content type, lowercased and without parameters.
    pub fn content_type(&self) -> Option<String> {
        self.header("content-type").map(|ct| {
            ct.split(';')
                .next()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase()
        })
    }
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    #[default]
    Png,
    /// JPEG format (lossy).
    Jpeg,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Detects format from magic bytes. Anything other than JPEG is
    /// re-encoded as PNG on export.
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else {
            Self::Png
        }
    }

    fn codec(&self) -> ::image::ImageFormat {
        match self {
            Self::Png => ::image::ImageFormat::Png,
            Self::Jpeg => ::image::ImageFormat::Jpeg,
        }
    }
}

/// A decoded raster image. This is the pipeline's only output type; it does
/// not record which provider produced it.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "decoded image should be saved or processed"]
pub struct DecodedImage {
    /// RGBA pixel buffer.
    pub pixels: RgbaImage,
    /// Format used when the image is encoded for export.
    pub format: ImageFormat,
}

impl DecodedImage {
    /// Wraps an existing pixel buffer.
    pub fn new(pixels: RgbaImage, format: ImageFormat) -> Self {
        Self { pixels, format }
    }

    /// Decodes an encoded image (PNG, JPEG, WebP, GIF, ...).
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(StoryVizError::Decode("empty image payload".into()));
        }
        let decoded = ::image::load_from_memory(bytes)
            .map_err(|e| StoryVizError::Decode(e.to_string()))?;
        Ok(Self::new(
            decoded.to_rgba8(),
            ImageFormat::from_magic_bytes(bytes),
        ))
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Encodes the image in its own format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let dynamic = match self.format {
            ImageFormat::Png => DynamicImage::ImageRgba8(self.pixels.clone()),
            // JPEG has no alpha channel.
            ImageFormat::Jpeg => {
                DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(self.pixels.clone()).to_rgb8())
            }
        };
        let mut out = Cursor::new(Vec::new());
        dynamic
            .write_to(&mut out, self.format.codec())
            .map_err(|e| StoryVizError::Decode(format!("encode failed: {e}")))?;
        Ok(out.into_inner())
    }

    /// Encodes and writes the image to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.encode()?)?;
        Ok(())
    }

    /// Returns the encoded image as a data URL.
    pub fn to_data_url(&self) -> Result<String> {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(self.encode()?);
        Ok(format!("data:{};base64,{}", self.format.mime_type(), encoded))
    }
}
