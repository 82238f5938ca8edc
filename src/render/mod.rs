//! Offline fallback renderer.
//!
//! Draws a storybook illustration locally: a decorative background, a
//! translucent panel, the title and the wrapped body text. Arabic text is
//! shaped and reordered before drawing. Rendering never touches the network
//! and never fails once the renderer has been built.
//!
//! # Example
//!
//! ```rust,no_run
//! use storyviz::render::{FallbackRenderer, RenderSpec};
//! use storyviz::{ImageRequest, Language};
//!
//! # fn main() -> storyviz::Result<()> {
//! let renderer = FallbackRenderer::new(RenderSpec::default())?;
//! let request = ImageRequest::new("The Fox", "Once upon a time...", Language::En)?;
//! let image = renderer.render(&request);
//! image.save("fox.png")?;
//! # Ok(())
//! # }
//! ```

pub mod background;
pub mod bidi;
pub mod font;
pub mod layout;
pub mod shaping;

pub use background::BackgroundStyle;
pub use font::FontSet;
pub use layout::TextLayout;

use crate::config::{ENV_FONT_ARABIC, ENV_FONT_LATIN};
use crate::error::{Result, StoryVizError};
use crate::types::{DecodedImage, ImageFormat, ImageRequest};
use background::{fill_rect, paint};
use image::{Rgba, RgbaImage};
use std::path::PathBuf;

/// Font file candidates, tried in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontFamilies {
    /// Fonts for Latin text and digits.
    pub latin: Vec<PathBuf>,
    /// Fonts for Arabic text.
    pub arabic: Vec<PathBuf>,
}

impl FontFamilies {
    /// Common locations of system fonts on Linux, macOS and Windows.
    pub fn system() -> Self {
        Self {
            latin: paths(&[
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/TTF/DejaVuSans.ttf",
                "/usr/share/fonts/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
                "/Library/Fonts/Arial.ttf",
                "/System/Library/Fonts/Supplemental/Arial.ttf",
                "C:\\Windows\\Fonts\\arial.ttf",
            ]),
            arabic: paths(&[
                "/usr/share/fonts/truetype/noto/NotoNaskhArabic-Regular.ttf",
                "/usr/share/fonts/noto/NotoNaskhArabic-Regular.ttf",
                "/usr/share/fonts/truetype/noto/NotoSansArabic-Regular.ttf",
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
                "/System/Library/Fonts/Supplemental/GeezaPro.ttc",
                "C:\\Windows\\Fonts\\tahoma.ttf",
                "C:\\Windows\\Fonts\\arial.ttf",
            ]),
        }
    }
}

fn paths(list: &[&str]) -> Vec<PathBuf> {
    list.iter().map(|p| PathBuf::from(*p)).collect()
}

/// Geometry, typography and styling of the fallback image.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSpec {
    /// Canvas width and height in pixels.
    pub canvas_size: (u32, u32),
    /// Background style.
    pub background: BackgroundStyle,
    /// Font candidates.
    pub fonts: FontFamilies,
    /// Upper bound on characters per wrapped line.
    pub max_chars_per_line: usize,
    /// Starting title size in pixels.
    pub title_font_size: f32,
    /// Starting body size in pixels.
    pub body_font_size: f32,
    /// Smallest body size before text is truncated.
    pub min_font_size: f32,
    /// Amount the font shrinks per fitting step.
    pub font_size_step: f32,
    /// Line height as a multiple of the font size.
    pub line_spacing: f32,
    /// Vertical gap between title and body.
    pub title_gap: f32,
    /// Distance from the canvas edge to the text panel.
    pub margin: u32,
    /// Distance from the panel edge to the text.
    pub padding: u32,
    /// Title colour.
    pub title_color: [u8; 3],
    /// Body colour.
    pub text_color: [u8; 3],
    /// Panel fill colour and opacity.
    pub panel_color: ([u8; 3], f32),
    /// Panel border colour and width.
    pub panel_border: Option<([u8; 3], u32)>,
}

impl Default for RenderSpec {
    fn default() -> Self {
        Self {
            canvas_size: (1024, 1024),
            background: BackgroundStyle::Storybook,
            fonts: FontFamilies::system(),
            max_chars_per_line: 64,
            title_font_size: 56.0,
            body_font_size: 30.0,
            min_font_size: 14.0,
            font_size_step: 2.0,
            line_spacing: 1.35,
            title_gap: 24.0,
            margin: 48,
            padding: 32,
            title_color: [139, 69, 19],
            text_color: [51, 51, 51],
            panel_color: ([255, 255, 255], 0.85),
            panel_border: Some(([139, 69, 19], 3)),
        }
    }
}

impl RenderSpec {
    /// Defaults with font overrides from `STORY_FONT_LATIN` and
    /// `STORY_FONT_ARABIC` tried first.
    pub fn from_env() -> Self {
        let mut spec = Self::default();
        if let Some(path) = env_path(ENV_FONT_LATIN) {
            spec = spec.with_latin_font(path);
        }
        if let Some(path) = env_path(ENV_FONT_ARABIC) {
            spec = spec.with_arabic_font(path);
        }
        spec
    }

    /// Tries `path` before the other Latin candidates.
    pub fn with_latin_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.fonts.latin.insert(0, path.into());
        self
    }

    /// Tries `path` before the other Arabic candidates.
    pub fn with_arabic_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.fonts.arabic.insert(0, path.into());
        self
    }

    fn validate(&self) -> Result<()> {
        let (w, h) = self.canvas_size;
        if w == 0 || h == 0 {
            return Err(StoryVizError::Render(format!("empty canvas {w}x{h}")));
        }
        if 2 * (self.margin + self.padding) >= w.min(h) {
            return Err(StoryVizError::Render(
                "margin and padding leave no room for text".to_string(),
            ));
        }
        let sizes = [
            self.title_font_size,
            self.body_font_size,
            self.min_font_size,
            self.line_spacing,
        ];
        if sizes.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(StoryVizError::Render(
                "font sizes and line spacing must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Renders story text into a local image.
pub struct FallbackRenderer {
    spec: RenderSpec,
    fonts: FontSet,
}

impl std::fmt::Debug for FallbackRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackRenderer")
            .field("spec", &self.spec)
            .field("builtin_glyphs", &self.fonts.is_builtin_only())
            .finish()
    }
}

impl FallbackRenderer {
    /// Loads the fonts named in `spec` and checks that drawing works.
    pub fn new(spec: RenderSpec) -> Result<Self> {
        let fonts = FontSet::load(&spec.fonts.latin, &spec.fonts.arabic);
        Self::with_fonts(spec, fonts)
    }

    /// Builds a renderer around already loaded fonts.
    pub fn with_fonts(spec: RenderSpec, fonts: FontSet) -> Result<Self> {
        spec.validate()?;
        let renderer = Self { spec, fonts };
        renderer.verify()?;
        Ok(renderer)
    }

    /// Draws sample text on a small canvas and PNG-encodes it.
    fn verify(&self) -> Result<()> {
        let blank = Rgba([255, 255, 255, 255]);
        let mut sample = RgbaImage::from_pixel(96, 48, blank);
        self.fonts.draw(&mut sample, "Ab", 4.0, 40.0, 32.0, [0, 0, 0]);
        self.fonts.draw(&mut sample, "\u{FE8F}", 60.0, 40.0, 32.0, [0, 0, 0]);
        if sample.pixels().all(|p| *p == blank) {
            return Err(StoryVizError::Render("sample text left no ink".to_string()));
        }
        DecodedImage::new(sample, ImageFormat::Png)
            .encode()
            .map_err(|e| StoryVizError::Render(format!("sample encode failed: {e}")))?;
        Ok(())
    }

    /// The active spec.
    pub fn spec(&self) -> &RenderSpec {
        &self.spec
    }

    /// Returns true if no font file could be loaded.
    pub fn uses_builtin_glyphs(&self) -> bool {
        self.fonts.is_builtin_only()
    }

    /// Computes where text would be drawn for `request`.
    pub fn layout(&self, request: &ImageRequest) -> TextLayout {
        layout::layout(&self.spec, &self.fonts, request)
    }

    /// Renders `request` into a PNG-format image.
    pub fn render(&self, request: &ImageRequest) -> DecodedImage {
        let (width, height) = self.spec.canvas_size;
        let mut canvas = paint(self.spec.background, width, height);
        let placed = self.layout(request);

        let panel = placed.panel;
        fill_rect(
            &mut canvas,
            panel.x,
            panel.y,
            panel.width,
            panel.height,
            self.spec.panel_color,
            self.spec.panel_border,
        );

        if let Some(title) = &placed.title {
            self.fonts.draw(
                &mut canvas,
                &title.text,
                title.x,
                title.baseline,
                title.size,
                self.spec.title_color,
            );
        }
        for line in &placed.body {
            self.fonts.draw(
                &mut canvas,
                &line.text,
                line.x,
                line.baseline,
                line.size,
                self.spec.text_color,
            );
        }

        tracing::debug!(
            lines = placed.body.len(),
            body_size = placed.body_size,
            truncated = placed.truncated,
            "rendered fallback image"
        );
        DecodedImage::new(canvas, ImageFormat::Png)
    }
}
