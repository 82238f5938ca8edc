//! Decorative, content-independent backgrounds.

use super::font::blend;
use image::{Rgba, RgbaImage};

/// Background drawn behind the story text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundStyle {
    /// Sky-to-sunset gradient with sun, clouds, stars and mountains.
    Storybook,
    /// Plain vertical gradient.
    Gradient {
        /// Colour at the top edge.
        top: [u8; 3],
        /// Colour at the bottom edge.
        bottom: [u8; 3],
    },
}

impl Default for BackgroundStyle {
    fn default() -> Self {
        Self::Storybook
    }
}

/// Paints a fresh canvas in the given style.
pub fn paint(style: BackgroundStyle, width: u32, height: u32) -> RgbaImage {
    match style {
        BackgroundStyle::Storybook => storybook(width, height),
        BackgroundStyle::Gradient { top, bottom } => {
            RgbaImage::from_fn(width, height, |_, y| {
                let t = y as f32 / height.max(1) as f32;
                let [r, g, b] = lerp_rgb(top, bottom, t);
                Rgba([r, g, b, 255])
            })
        }
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}

fn lerp_rgb(a: [u8; 3], b: [u8; 3], t: f32) -> [u8; 3] {
    [lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)]
}

const SKY: [u8; 3] = [135, 206, 250];
const HAZE: [u8; 3] = [165, 226, 220];
const DUSK: [u8; 3] = [225, 186, 170];
const SUNSET: [u8; 3] = [255, 150, 150];

fn sky_color(t: f32) -> [u8; 3] {
    if t < 0.3 {
        lerp_rgb(SKY, HAZE, t / 0.3)
    } else if t < 0.7 {
        lerp_rgb(HAZE, DUSK, (t - 0.3) / 0.4)
    } else {
        lerp_rgb(DUSK, SUNSET, (t - 0.7) / 0.3)
    }
}

fn storybook(width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_fn(width, height, |_, y| {
        let [r, g, b] = sky_color(y as f32 / height.max(1) as f32);
        Rgba([r, g, b, 255])
    });
    let w = width as f32;
    let h = height as f32;
    let unit = w.min(h) / 1024.0;

    for i in 0..30u32 {
        let x = (i * 137) % width.max(1);
        let y = (i * 89) % (height / 2).max(1);
        let r = (2 + i % 3) as f32 * unit;
        fill_circle(&mut canvas, x as f32, y as f32, r, [255, 255, 220], 0.9);
    }

    let (sun_x, sun_y, sun_r) = (w * 0.82, h * 0.16, 70.0 * unit);
    fill_circle(&mut canvas, sun_x, sun_y, sun_r * 1.35, [255, 230, 120], 0.35);
    fill_circle(&mut canvas, sun_x, sun_y, sun_r, [255, 215, 0], 1.0);

    for i in 0..5u32 {
        let cx = w * (0.1 + 0.17 * i as f32);
        let cy = h * (0.12 + 0.07 * (i % 3) as f32);
        let size = (70.0 + 25.0 * (i % 3) as f32) * unit;
        for dx in [-0.5f32, 0.0, 0.5] {
            for dy in [0.0f32, -0.33] {
                fill_circle(&mut canvas, cx + dx * size, cy + dy * size, size / 3.0, [255, 255, 255], 0.92);
            }
        }
    }

    let base = h - 170.0 * unit;
    for x in 0..width {
        let xf = x as f32 / unit.max(f32::EPSILON);
        let peak = base
            - (130.0 + 45.0 * (xf / 100.0).sin() + 25.0 * (xf / 50.0).sin()) * unit;
        let top = peak.max(0.0) as u32;
        for y in top..height {
            blend(&mut canvas, x as i64, y as i64, [100, 120, 140], 1.0);
        }
    }

    canvas
}

/// Alpha-filled disc.
pub(crate) fn fill_circle(canvas: &mut RgbaImage, cx: f32, cy: f32, r: f32, color: [u8; 3], alpha: f32) {
    if r <= 0.0 {
        return;
    }
    let (x0, x1) = ((cx - r).floor() as i64, (cx + r).ceil() as i64);
    let (y0, y1) = ((cy - r).floor() as i64, (cy + r).ceil() as i64);
    let r2 = r * r;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                blend(canvas, x, y, color, alpha);
            }
        }
    }
}

/// Alpha-filled rectangle with an optional border.
pub(crate) fn fill_rect(
    canvas: &mut RgbaImage,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    fill: ([u8; 3], f32),
    border: Option<([u8; 3], u32)>,
) {
    let (x0, y0) = (x.round() as i64, y.round() as i64);
    let (x1, y1) = ((x + width).round() as i64, (y + height).round() as i64);
    let stroke = border.map_or(0, |(_, w)| w as i64);
    for py in y0..y1 {
        for px in x0..x1 {
            let on_border =
                px < x0 + stroke || px >= x1 - stroke || py < y0 + stroke || py >= y1 - stroke;
            match border {
                Some((color, _)) if on_border => blend(canvas, px, py, color, 1.0),
                _ => blend(canvas, px, py, fill.0, fill.1),
            }
        }
    }
}
