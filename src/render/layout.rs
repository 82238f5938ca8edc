//! Text layout: wrapping, font-size fitting and placement.
//!
//! Layout is computed without touching pixels so the geometry can be
//! checked on its own.

use super::bidi::{visual_order, Direction};
use super::font::FontSet;
use super::shaping::shape_arabic;
use super::RenderSpec;
use crate::types::ImageRequest;

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Returns true if `other` lies entirely inside `self`.
    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f32 = 0.01;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }
}

/// One line of text, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    /// Text in visual (left-to-right drawing) order.
    pub text: String,
    /// Pen start.
    pub x: f32,
    /// Baseline.
    pub baseline: f32,
    /// Font size in pixels.
    pub size: f32,
    /// Ink box of the line.
    pub bounds: Rect,
}

/// Result of laying out a request.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    /// Title line, absent for an empty title.
    pub title: Option<PlacedLine>,
    /// Body lines, top to bottom.
    pub body: Vec<PlacedLine>,
    /// Font size the body settled on.
    pub body_size: f32,
    /// True if body text was cut and ended with an ellipsis.
    pub truncated: bool,
    /// Area reserved for the body.
    pub text_box: Rect,
    /// Panel drawn behind title and body.
    pub panel: Rect,
}

/// Lays out `request` on the canvas described by `spec`.
pub fn layout(spec: &RenderSpec, fonts: &FontSet, request: &ImageRequest) -> TextLayout {
    let (canvas_w, canvas_h) = spec.canvas_size;
    let margin = spec.margin as f32;
    let padding = spec.padding as f32;
    let panel = Rect {
        x: margin,
        y: margin,
        width: (canvas_w as f32 - 2.0 * margin).max(0.0),
        height: (canvas_h as f32 - 2.0 * margin).max(0.0),
    };
    let inner = Rect {
        x: panel.x + padding,
        y: panel.y + padding,
        width: (panel.width - 2.0 * padding).max(0.0),
        height: (panel.height - 2.0 * padding).max(0.0),
    };
    let direction = if request.language.is_rtl() {
        Direction::Rtl
    } else {
        Direction::Ltr
    };

    let title = place_title(spec, fonts, &request.title, inner, direction);
    let body_top = title
        .as_ref()
        .map(|t| t.bounds.bottom() + spec.title_gap)
        .unwrap_or(inner.y)
        .min(inner.bottom());
    let text_box = Rect {
        x: inner.x,
        y: body_top,
        width: inner.width,
        height: inner.bottom() - body_top,
    };

    let shaped = shape_arabic(&request.body);
    let fitted = fit_body(spec, fonts, &shaped, text_box);

    let ascent = fonts.ascent(fitted.size);
    let descent = fonts.descent(fitted.size);
    let line_height = line_height(spec, fonts, fitted.size);
    let body = fitted
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let visual = visual_order(line, direction);
            let width = fonts.measure(&visual, fitted.size);
            let x = match direction {
                Direction::Rtl => text_box.right() - width,
                Direction::Ltr => text_box.x,
            };
            let baseline = text_box.y + ascent + i as f32 * line_height;
            PlacedLine {
                text: visual,
                x,
                baseline,
                size: fitted.size,
                bounds: Rect {
                    x,
                    y: baseline - ascent,
                    width,
                    height: ascent + descent,
                },
            }
        })
        .collect();

    TextLayout {
        title,
        body,
        body_size: fitted.size,
        truncated: fitted.truncated,
        text_box,
        panel,
    }
}

fn step(spec: &RenderSpec) -> f32 {
    spec.font_size_step.max(0.5)
}

fn line_height(spec: &RenderSpec, fonts: &FontSet, size: f32) -> f32 {
    (size * spec.line_spacing).max(fonts.ascent(size) + fonts.descent(size))
}

fn place_title(
    spec: &RenderSpec,
    fonts: &FontSet,
    title: &str,
    inner: Rect,
    direction: Direction,
) -> Option<PlacedLine> {
    let shaped = shape_arabic(&title.split_whitespace().collect::<Vec<_>>().join(" "));
    if shaped.is_empty() {
        return None;
    }

    let mut size = spec.title_font_size;
    let floor = spec.body_font_size.min(spec.title_font_size);
    while fonts.measure(&shaped, size) > inner.width && size > floor {
        size = (size - step(spec)).max(floor);
    }
    let mut text = shaped;
    if fonts.measure(&text, size) > inner.width {
        text = with_ellipsis(fonts, &text, size, inner.width);
    }

    let ascent = fonts.ascent(size);
    let height = ascent + fonts.descent(size);
    if height > inner.height {
        return None;
    }
    let visual = visual_order(&text, direction);
    let width = fonts.measure(&visual, size);
    let x = inner.x + (inner.width - width).max(0.0) / 2.0;
    let baseline = inner.y + ascent;
    Some(PlacedLine {
        text: visual,
        x,
        baseline,
        size,
        bounds: Rect {
            x,
            y: inner.y,
            width,
            height,
        },
    })
}

struct FittedBody {
    size: f32,
    lines: Vec<String>,
    truncated: bool,
}

/// Shrinks the font in fixed steps until the body fits; at the minimum size
/// the tail is cut and ends with an ellipsis.
fn fit_body(spec: &RenderSpec, fonts: &FontSet, text: &str, text_box: Rect) -> FittedBody {
    let min = spec.min_font_size.min(spec.body_font_size);
    let mut size = spec.body_font_size;
    loop {
        let lines = wrap(fonts, text, size, text_box.width, spec.max_chars_per_line);
        let capacity = lines_that_fit(spec, fonts, size, text_box.height);
        if lines.len() <= capacity {
            return FittedBody {
                size,
                lines,
                truncated: false,
            };
        }
        if size <= min {
            return truncate(fonts, lines, capacity, size, text_box.width);
        }
        size = (size - step(spec)).max(min);
    }
}

fn lines_that_fit(spec: &RenderSpec, fonts: &FontSet, size: f32, height: f32) -> usize {
    let ink = fonts.ascent(size) + fonts.descent(size);
    if height < ink {
        return 0;
    }
    // The last line only needs its ink height, not the full line gap.
    1 + ((height - ink) / line_height(spec, fonts, size)).floor() as usize
}

fn truncate(
    fonts: &FontSet,
    mut lines: Vec<String>,
    capacity: usize,
    size: f32,
    max_width: f32,
) -> FittedBody {
    lines.truncate(capacity);
    if let Some(last) = lines.last_mut() {
        *last = with_ellipsis(fonts, last, size, max_width);
    }
    FittedBody {
        size,
        lines,
        truncated: true,
    }
}

/// Appends an ellipsis, dropping trailing characters until the result fits.
fn with_ellipsis(fonts: &FontSet, line: &str, size: f32, max_width: f32) -> String {
    let ellipsis = fonts.ellipsis();
    let mut kept: Vec<char> = line.trim_end().chars().collect();
    loop {
        let candidate: String = kept.iter().collect::<String>().trim_end().to_string() + ellipsis;
        if kept.is_empty() || fonts.measure(&candidate, size) <= max_width {
            return candidate;
        }
        kept.pop();
    }
}

/// Greedy word wrap by measured width.
///
/// Words wider than a line are broken per character, which also handles
/// long unbroken runs. Newlines start a new line.
pub fn wrap(
    fonts: &FontSet,
    text: &str,
    size: f32,
    max_width: f32,
    max_chars: usize,
) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let space = fonts.measure(" ", size);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_width = 0.0;
        let mut current_chars = 0;

        for word in paragraph.split_whitespace() {
            let word_width = fonts.measure(word, size);
            let word_chars = word.chars().count();

            if !current.is_empty() {
                if current_width + space + word_width <= max_width
                    && current_chars + 1 + word_chars <= max_chars
                {
                    current.push(' ');
                    current.push_str(word);
                    current_width += space + word_width;
                    current_chars += 1 + word_chars;
                    continue;
                }
                lines.push(std::mem::take(&mut current));
            }

            if word_width <= max_width && word_chars <= max_chars {
                current = word.to_string();
                current_width = word_width;
                current_chars = word_chars;
                continue;
            }

            // Break an over-long word by measured character width.
            current_width = 0.0;
            current_chars = 0;
            for c in word.chars() {
                let w = fonts.measure(c.encode_utf8(&mut [0; 4]), size);
                if !current.is_empty() && (current_width + w > max_width || current_chars + 1 > max_chars)
                {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0.0;
                    current_chars = 0;
                }
                current.push(c);
                current_width += w;
                current_chars += 1;
            }
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Language;

    fn request(title: &str, body: &str, language: Language) -> ImageRequest {
        ImageRequest {
            title: title.to_string(),
            body: body.to_string(),
            language,
        }
    }

    fn canvas(spec: &RenderSpec) -> Rect {
        Rect {
            x: 0.0,
            y: 0.0,
            width: spec.canvas_size.0 as f32,
            height: spec.canvas_size.1 as f32,
        }
    }

    fn assert_within_canvas(spec: &RenderSpec, layout: &TextLayout) {
        let canvas = canvas(spec);
        assert!(canvas.contains(&layout.text_box));
        if let Some(title) = &layout.title {
            assert!(canvas.contains(&title.bounds), "title out of canvas: {:?}", title.bounds);
        }
        for line in &layout.body {
            assert!(
                layout.text_box.contains(&line.bounds),
                "line {:?} escapes text box {:?}",
                line.bounds,
                layout.text_box
            );
        }
    }

    #[test]
    fn test_wrap_respects_width() {
        let fonts = FontSet::builtin();
        // 16px advance at size 16: 10 glyphs per 160px line.
        let lines = wrap(&fonts, "aaa bbb ccc ddd", 16.0, 160.0, 100);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn test_wrap_breaks_long_runs_per_character() {
        let fonts = FontSet::builtin();
        let lines = wrap(&fonts, &"x".repeat(25), 16.0, 160.0, 100);
        assert_eq!(lines, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[test]
    fn test_wrap_respects_max_chars() {
        let fonts = FontSet::builtin();
        let lines = wrap(&fonts, "ab cd ef", 16.0, 10_000.0, 5);
        assert_eq!(lines, vec!["ab cd", "ef"]);
    }

    #[test]
    fn test_wrap_keeps_paragraphs() {
        let fonts = FontSet::builtin();
        let lines = wrap(&fonts, "one\n\ntwo", 16.0, 1000.0, 100);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_body_never_overflows_canvas() {
        let spec = RenderSpec::default();
        let fonts = FontSet::builtin();
        for len in [0usize, 50, 600, 5000] {
            let body: String = "lorem ipsum dolor sit amet "
                .chars()
                .cycle()
                .take(len)
                .collect();
            let layout = layout(&spec, &fonts, &request("A Long Night", &body, Language::En));
            assert_within_canvas(&spec, &layout);
            assert!(layout.body_size >= spec.min_font_size);
            if len == 0 {
                assert!(layout.body.is_empty());
            }
        }
    }

    #[test]
    fn test_arabic_body_never_overflows_canvas() {
        let spec = RenderSpec::default();
        let fonts = FontSet::builtin();
        for len in [0usize, 50, 600, 5000] {
            let body: String = "كان يا ما كان في قديم الزمان 2024 "
                .chars()
                .cycle()
                .take(len)
                .collect();
            let layout = layout(&spec, &fonts, &request("قصة سارة", &body, Language::Ar));
            assert_within_canvas(&spec, &layout);
        }
    }

    #[test]
    fn test_short_body_keeps_configured_size() {
        let spec = RenderSpec::default();
        let layout = layout(
            &spec,
            &FontSet::builtin(),
            &request("T", "A short tale.", Language::En),
        );
        assert_eq!(layout.body_size, spec.body_font_size);
        assert!(!layout.truncated);
        assert_eq!(layout.body.len(), 1);
        assert_eq!(layout.body[0].x, layout.text_box.x);
    }

    #[test]
    fn test_medium_body_shrinks_before_truncating() {
        let spec = RenderSpec::default();
        let body = "word ".repeat(120);
        let layout = layout(&spec, &FontSet::builtin(), &request("T", &body, Language::En));
        assert!(layout.body_size < spec.body_font_size);
        assert!(!layout.truncated);
    }

    #[test]
    fn test_huge_body_truncates_with_ellipsis() {
        let spec = RenderSpec::default();
        let fonts = FontSet::builtin();
        let body = "word ".repeat(1000);
        let layout = layout(&spec, &fonts, &request("T", &body, Language::En));
        assert!(layout.truncated);
        assert_eq!(layout.body_size, spec.min_font_size);
        assert!(layout.body.last().unwrap().text.ends_with(fonts.ellipsis()));
    }

    #[test]
    fn test_rtl_lines_are_right_aligned_and_reordered() {
        let spec = RenderSpec::default();
        let layout = layout(
            &spec,
            &FontSet::builtin(),
            &request("", "اب 12", Language::Ar),
        );
        assert!(layout.title.is_none());
        let line = &layout.body[0];
        assert!((line.bounds.right() - layout.text_box.right()).abs() < 0.01);
        // Digits keep their order on the left; beh then alef to their right.
        let chars: Vec<char> = line.text.chars().collect();
        assert_eq!(&chars[..3], &['1', '2', ' ']);
        assert_eq!(chars[3] as u32, 0xFE8F);
        assert_eq!(chars[4] as u32, 0xFE8D);
    }

    #[test]
    fn test_title_is_centered() {
        let spec = RenderSpec::default();
        let layout = layout(
            &spec,
            &FontSet::builtin(),
            &request("Tale", "body", Language::En),
        );
        let title = layout.title.unwrap();
        let left = title.bounds.x - layout.text_box.x;
        let right = layout.text_box.right() - title.bounds.right();
        assert!((left - right).abs() < 1.0);
        assert!(layout.text_box.y >= title.bounds.bottom());
    }

    #[test]
    fn test_long_title_is_shrunk_then_cut() {
        let spec = RenderSpec::default();
        let fonts = FontSet::builtin();
        let title = "A".repeat(200);
        let layout = layout(&spec, &fonts, &request(&title, "body", Language::En));
        let placed = layout.title.unwrap();
        assert_eq!(placed.size, spec.body_font_size);
        assert!(placed.text.ends_with(fonts.ellipsis()));
        assert!(placed.bounds.width <= layout.text_box.width);
    }
}
