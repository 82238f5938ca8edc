//! Visual reordering of single lines with the Unicode bidi algorithm.

use unicode_bidi::{BidiInfo, Level};

/// Base paragraph direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Left-to-right paragraph.
    Ltr,
    /// Right-to-left paragraph.
    Rtl,
}

/// Reorders one line from logical to visual (left-to-right drawing) order.
///
/// Right-to-left runs come out reversed while digit and Latin runs inside
/// them keep their left-to-right order. Paired brackets in right-to-left
/// runs are swapped for their mirrored glyphs.
pub fn visual_order(line: &str, direction: Direction) -> String {
    if line.is_empty() {
        return String::new();
    }
    let level = match direction {
        Direction::Ltr => Level::ltr(),
        Direction::Rtl => Level::rtl(),
    };
    let info = BidiInfo::new(line, Some(level));
    let mut out = String::with_capacity(line.len());
    for para in &info.paragraphs {
        let (levels, runs) = info.visual_runs(para, para.range.clone());
        for run in runs {
            let text = &line[run.clone()];
            if levels[run.start].is_rtl() {
                out.extend(text.chars().rev().map(mirror));
            } else {
                out.push_str(text);
            }
        }
    }
    out
}

/// Bidi_Mirrored counterpart for the paired punctuation stories use.
fn mirror(c: char) -> char {
    match c {
        '(' => ')',
        ')' => '(',
        '[' => ']',
        ']' => '[',
        '{' => '}',
        '}' => '{',
        '<' => '>',
        '>' => '<',
        '«' => '»',
        '»' => '«',
        '‹' => '›',
        '›' => '‹',
        c => c,
    }
}
