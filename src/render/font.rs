//! Font loading, measurement and glyph drawing.

use super::shaping::is_arabic;
use crate::error::{Result, StoryVizError};
use ab_glyph::{point, Font, FontVec, PxScale, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// Pixels of the built-in glyph cell.
const CELL: u32 = 8;

/// A single font face.
pub enum Typeface {
    /// TrueType / OpenType outlines.
    Outline(FontVec),
    /// Built-in 8x8 bitmap glyphs (basic Latin only).
    Builtin,
}

impl Typeface {
    /// Loads an outline font from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data)
            .map_err(|e| StoryVizError::Render(format!("{}: {e}", path.display())))?;
        Ok(Self::Outline(font))
    }

    /// Returns true if the face has a real glyph for `c`.
    pub fn has_glyph(&self, c: char) -> bool {
        match self {
            Self::Outline(font) => font.glyph_id(c).0 != 0,
            Self::Builtin => BASIC_FONTS.get(c).is_some(),
        }
    }

    fn cell_scale(size: f32) -> u32 {
        ((size / CELL as f32).round() as u32).max(1)
    }

    /// Horizontal advance of `c` at `size` pixels.
    pub fn advance(&self, c: char, size: f32) -> f32 {
        match self {
            Self::Outline(font) => {
                let scaled = font.as_scaled(PxScale::from(size));
                scaled.h_advance(font.glyph_id(c))
            }
            Self::Builtin => (CELL * Self::cell_scale(size)) as f32,
        }
    }

    /// Distance from baseline to the top of the tallest glyph.
    pub fn ascent(&self, size: f32) -> f32 {
        match self {
            Self::Outline(font) => font.as_scaled(PxScale::from(size)).ascent(),
            Self::Builtin => (CELL * Self::cell_scale(size)) as f32,
        }
    }

    /// Distance from baseline to the lowest descender, as a positive value.
    pub fn descent(&self, size: f32) -> f32 {
        match self {
            Self::Outline(font) => -font.as_scaled(PxScale::from(size)).descent(),
            Self::Builtin => 0.0,
        }
    }

    /// Draws `c` with its origin at (`x`, `baseline`), clipped to the canvas.
    pub fn draw_glyph(
        &self,
        canvas: &mut RgbaImage,
        c: char,
        x: f32,
        baseline: f32,
        size: f32,
        color: [u8; 3],
    ) {
        match self {
            Self::Outline(font) => {
                let glyph = font
                    .glyph_id(c)
                    .with_scale_and_position(PxScale::from(size), point(x, baseline));
                if let Some(outlined) = font.outline_glyph(glyph) {
                    let bounds = outlined.px_bounds();
                    outlined.draw(|gx, gy, coverage| {
                        let px = bounds.min.x as i64 + gx as i64;
                        let py = bounds.min.y as i64 + gy as i64;
                        blend(canvas, px, py, color, coverage);
                    });
                }
            }
            Self::Builtin => {
                let scale = Self::cell_scale(size) as i64;
                let top = baseline as i64 - CELL as i64 * scale;
                let left = x as i64;
                match BASIC_FONTS.get(c) {
                    Some(rows) => {
                        for (row, bits) in rows.iter().enumerate() {
                            // Bit 0 is the leftmost pixel.
                            for col in 0..CELL {
                                if (*bits >> col) & 1 == 1 {
                                    fill_cell(
                                        canvas,
                                        left + col as i64 * scale,
                                        top + row as i64 * scale,
                                        scale,
                                        color,
                                    );
                                }
                            }
                        }
                    }
                    None => draw_missing_box(canvas, left, top, CELL as i64 * scale, scale, color),
                }
            }
        }
    }
}

fn fill_cell(canvas: &mut RgbaImage, x: i64, y: i64, scale: i64, color: [u8; 3]) {
    for dy in 0..scale {
        for dx in 0..scale {
            blend(canvas, x + dx, y + dy, color, 1.0);
        }
    }
}

fn draw_missing_box(canvas: &mut RgbaImage, x: i64, y: i64, size: i64, stroke: i64, color: [u8; 3]) {
    let inset = stroke;
    let (x0, y0, x1, y1) = (x + inset, y + inset, x + size - inset, y + size - inset);
    for px in x0..x1 {
        for t in 0..stroke.max(1) / 2 + 1 {
            blend(canvas, px, y0 + t, color, 1.0);
            blend(canvas, px, y1 - 1 - t, color, 1.0);
        }
    }
    for py in y0..y1 {
        for t in 0..stroke.max(1) / 2 + 1 {
            blend(canvas, x0 + t, py, color, 1.0);
            blend(canvas, x1 - 1 - t, py, color, 1.0);
        }
    }
}

/// Alpha-blends `color` onto the pixel at (`x`, `y`); out-of-canvas writes
/// are dropped.
pub(crate) fn blend(canvas: &mut RgbaImage, x: i64, y: i64, color: [u8; 3], alpha: f32) {
    if x < 0 || y < 0 || x >= canvas.width() as i64 || y >= canvas.height() as i64 {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let Rgba([r, g, b, a]) = *canvas.get_pixel(x as u32, y as u32);
    let mix = |dst: u8, src: u8| (dst as f32 * (1.0 - alpha) + src as f32 * alpha).round() as u8;
    canvas.put_pixel(
        x as u32,
        y as u32,
        Rgba([mix(r, color[0]), mix(g, color[1]), mix(b, color[2]), a]),
    );
}

/// Latin and Arabic faces with the built-in glyphs as a last resort.
pub struct FontSet {
    latin: Option<Typeface>,
    arabic: Option<Typeface>,
    builtin: Typeface,
}

impl FontSet {
    /// A set with only the built-in glyphs.
    pub fn builtin() -> Self {
        Self {
            latin: None,
            arabic: None,
            builtin: Typeface::Builtin,
        }
    }

    /// Loads the first readable font from each candidate list.
    pub fn load(latin: &[PathBuf], arabic: &[PathBuf]) -> Self {
        let latin_face = first_loadable(latin);
        let arabic_face = first_loadable(arabic);
        if latin_face.is_none() && arabic_face.is_none() {
            tracing::warn!("no font file could be loaded; using built-in glyphs");
        }
        Self {
            latin: latin_face,
            arabic: arabic_face,
            builtin: Typeface::Builtin,
        }
    }

    /// Returns true if only the built-in glyphs are available.
    pub fn is_builtin_only(&self) -> bool {
        self.latin.is_none() && self.arabic.is_none()
    }

    /// Picks the face used for `c`, preferring the script's own font.
    pub fn face_for(&self, c: char) -> &Typeface {
        let preferred = if is_arabic(c) {
            [self.arabic.as_ref(), self.latin.as_ref()]
        } else {
            [self.latin.as_ref(), self.arabic.as_ref()]
        };
        preferred
            .into_iter()
            .flatten()
            .find(|face| c.is_whitespace() || face.has_glyph(c))
            .unwrap_or(&self.builtin)
    }

    fn faces(&self) -> impl Iterator<Item = &Typeface> {
        [self.latin.as_ref(), self.arabic.as_ref(), Some(&self.builtin)]
            .into_iter()
            .flatten()
    }

    /// Width of `text` at `size` pixels.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.face_for(c).advance(c, size)).sum()
    }

    /// Largest ascent across the faces.
    pub fn ascent(&self, size: f32) -> f32 {
        self.faces().map(|f| f.ascent(size)).fold(0.0, f32::max)
    }

    /// Largest descent across the faces.
    pub fn descent(&self, size: f32) -> f32 {
        self.faces().map(|f| f.descent(size)).fold(0.0, f32::max)
    }

    /// Ellipsis that every face in the set can draw.
    pub fn ellipsis(&self) -> &'static str {
        if self.face_for('…').has_glyph('…') {
            "…"
        } else {
            "..."
        }
    }

    /// Draws `text` (already in visual order) starting at (`x`, `baseline`).
    pub fn draw(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: f32,
        baseline: f32,
        size: f32,
        color: [u8; 3],
    ) {
        let mut pen = x;
        for c in text.chars() {
            let face = self.face_for(c);
            if !c.is_whitespace() {
                face.draw_glyph(canvas, c, pen, baseline, size, color);
            }
            pen += face.advance(c, size);
        }
    }
}

fn first_loadable(paths: &[PathBuf]) -> Option<Typeface> {
    paths.iter().find_map(|path| match Typeface::load(path) {
        Ok(face) => {
            tracing::debug!(path = %path.display(), "loaded font");
            Some(face)
        }
        Err(e) => {
            tracing::trace!(path = %path.display(), error = %e, "font candidate unusable");
            None
        }
    })
}
