//! Arabic contextual shaping.
//!
//! Glyph rasterisation here has no OpenType shaping engine, so Arabic letters
//! are mapped to their Presentation Forms-B code points (isolated, final,
//! initial, medial) according to their neighbours, and lam-alef pairs are
//! replaced by their ligatures. Shaping runs on logical order, before bidi
//! reordering.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Joining {
    /// Joins on both sides.
    Dual,
    /// Joins only to the preceding letter.
    Right,
    /// Tatweel: joins on both sides, has no forms of its own.
    Causing,
    /// Harakat: ignored when looking for neighbours.
    Transparent,
    /// Everything else breaks the join.
    None,
}

/// `(letter, isolated form, joining)`. Final, initial and medial forms
/// follow the isolated form at +1, +2, +3.
const LETTERS: &[(char, u32, Joining)] = &[
    ('\u{0621}', 0xFE80, Joining::None),
    ('\u{0622}', 0xFE81, Joining::Right),
    ('\u{0623}', 0xFE83, Joining::Right),
    ('\u{0624}', 0xFE85, Joining::Right),
    ('\u{0625}', 0xFE87, Joining::Right),
    ('\u{0626}', 0xFE89, Joining::Dual),
    ('\u{0627}', 0xFE8D, Joining::Right),
    ('\u{0628}', 0xFE8F, Joining::Dual),
    ('\u{0629}', 0xFE93, Joining::Right),
    ('\u{062A}', 0xFE95, Joining::Dual),
    ('\u{062B}', 0xFE99, Joining::Dual),
    ('\u{062C}', 0xFE9D, Joining::Dual),
    ('\u{062D}', 0xFEA1, Joining::Dual),
    ('\u{062E}', 0xFEA5, Joining::Dual),
    ('\u{062F}', 0xFEA9, Joining::Right),
    ('\u{0630}', 0xFEAB, Joining::Right),
    ('\u{0631}', 0xFEAD, Joining::Right),
    ('\u{0632}', 0xFEAF, Joining::Right),
    ('\u{0633}', 0xFEB1, Joining::Dual),
    ('\u{0634}', 0xFEB5, Joining::Dual),
    ('\u{0635}', 0xFEB9, Joining::Dual),
    ('\u{0636}', 0xFEBD, Joining::Dual),
    ('\u{0637}', 0xFEC1, Joining::Dual),
    ('\u{0638}', 0xFEC5, Joining::Dual),
    ('\u{0639}', 0xFEC9, Joining::Dual),
    ('\u{063A}', 0xFECD, Joining::Dual),
    ('\u{0641}', 0xFED1, Joining::Dual),
    ('\u{0642}', 0xFED5, Joining::Dual),
    ('\u{0643}', 0xFED9, Joining::Dual),
    ('\u{0644}', 0xFEDD, Joining::Dual),
    ('\u{0645}', 0xFEE1, Joining::Dual),
    ('\u{0646}', 0xFEE5, Joining::Dual),
    ('\u{0647}', 0xFEE9, Joining::Dual),
    ('\u{0648}', 0xFEED, Joining::Right),
    ('\u{0649}', 0xFEEF, Joining::Right),
    ('\u{064A}', 0xFEF1, Joining::Dual),
];

const LAM: char = '\u{0644}';
const TATWEEL: char = '\u{0640}';

/// `(alef variant, isolated lam-alef ligature)`; the final form is +1.
const LAM_ALEF: &[(char, u32)] = &[
    ('\u{0622}', 0xFEF5),
    ('\u{0623}', 0xFEF7),
    ('\u{0625}', 0xFEF9),
    ('\u{0627}', 0xFEFB),
];

#[derive(Debug, Clone, Copy)]
enum Form {
    Isolated = 0,
    Final = 1,
    Initial = 2,
    Medial = 3,
}

fn letter(c: char) -> Option<(u32, Joining)> {
    LETTERS
        .iter()
        .find(|(ch, _, _)| *ch == c)
        .map(|&(_, base, joining)| (base, joining))
}

fn joining(c: char) -> Joining {
    if c == TATWEEL {
        return Joining::Causing;
    }
    if matches!(c, '\u{064B}'..='\u{065F}' | '\u{0670}') {
        return Joining::Transparent;
    }
    letter(c).map_or(Joining::None, |(_, j)| j)
}

fn joins_forward(j: Joining) -> bool {
    matches!(j, Joining::Dual | Joining::Causing)
}

fn joins_backward(j: Joining) -> bool {
    matches!(j, Joining::Dual | Joining::Right | Joining::Causing)
}

/// Returns true for characters in the Arabic blocks, including
/// presentation forms.
pub fn is_arabic(c: char) -> bool {
    matches!(
        c,
        '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}'
    )
}

/// Replaces Arabic letters with their contextual presentation forms.
/// Non-Arabic text passes through unchanged.
pub fn shape_arabic(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if !chars.iter().any(|&c| letter(c).is_some()) {
        return text.to_string();
    }

    let kinds: Vec<Joining> = chars.iter().map(|&c| joining(c)).collect();
    let prev_kind = |i: usize| {
        kinds[..i]
            .iter()
            .rev()
            .copied()
            .find(|&k| k != Joining::Transparent)
            .unwrap_or(Joining::None)
    };
    let next_index = |i: usize| (i + 1..chars.len()).find(|&j| kinds[j] != Joining::Transparent);

    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let Some((base, kind)) = letter(c) else {
            out.push(c);
            i += 1;
            continue;
        };
        let joined_before = joins_forward(prev_kind(i));

        if c == LAM {
            if let Some(next) = next_index(i) {
                if let Some(&(_, ligature)) = LAM_ALEF.iter().find(|(alef, _)| *alef == chars[next]) {
                    let form = if joined_before { Form::Final } else { Form::Isolated };
                    push_code(&mut out, ligature + form as u32, c);
                    // Harakat between lam and alef are kept after the ligature.
                    out.extend(chars[i + 1..next].iter());
                    i = next + 1;
                    continue;
                }
            }
        }

        let joined_after = joins_forward(kind)
            && next_index(i).is_some_and(|j| joins_backward(kinds[j]));

        let form = match kind {
            Joining::Dual => match (joined_before, joined_after) {
                (true, true) => Form::Medial,
                (true, false) => Form::Final,
                (false, true) => Form::Initial,
                (false, false) => Form::Isolated,
            },
            Joining::Right if joined_before => Form::Final,
            _ => Form::Isolated,
        };
        push_code(&mut out, base + form as u32, c);
        i += 1;
    }
    out
}

fn push_code(out: &mut String, code: u32, original: char) {
    out.push(char::from_u32(code).unwrap_or(original));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(s: &str) -> Vec<u32> {
        s.chars().map(|c| c as u32).collect()
    }

    #[test]
    fn test_latin_passthrough() {
        assert_eq!(shape_arabic("Hello, 123"), "Hello, 123");
    }

    #[test]
    fn test_salam_with_lam_alef() {
        // seen(initial) + lam-alef(final) + meem(isolated)
        assert_eq!(codes(&shape_arabic("سلام")), vec![0xFEB3, 0xFEFC, 0xFEE1]);
    }

    #[test]
    fn test_dual_joining_word() {
        // beh(initial) + teh(medial) + beh(final)
        assert_eq!(codes(&shape_arabic("بتب")), vec![0xFE91, 0xFE98, 0xFE90]);
    }

    #[test]
    fn test_right_joining_breaks_chain() {
        // dal(isolated) + beh(isolated): dal never joins forward
        assert_eq!(codes(&shape_arabic("دب")), vec![0xFEA9, 0xFE8F]);
        // beh(initial) + dal(final) + beh(isolated)
        assert_eq!(codes(&shape_arabic("بدب")), vec![0xFE91, 0xFEAA, 0xFE8F]);
    }

    #[test]
    fn test_words_shape_independently() {
        let shaped = shape_arabic("بب بب");
        assert_eq!(
            codes(&shaped),
            vec![0xFE91, 0xFE90, ' ' as u32, 0xFE91, 0xFE90]
        );
    }

    #[test]
    fn test_harakat_are_transparent() {
        // beh + fatha + beh: the vowel mark does not break the join
        assert_eq!(
            codes(&shape_arabic("بَب")),
            vec![0xFE91, 0x064E, 0xFE90]
        );
    }

    #[test]
    fn test_isolated_lam_alef() {
        assert_eq!(codes(&shape_arabic("لا")), vec![0xFEFB]);
        assert_eq!(codes(&shape_arabic("لأ")), vec![0xFEF7]);
    }

    #[test]
    fn test_is_arabic() {
        assert!(is_arabic('ب'));
        assert!(is_arabic('\u{FEFC}'));
        assert!(!is_arabic('b'));
        assert!(!is_arabic('1'));
    }
}
