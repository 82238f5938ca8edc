//! Derives a provider prompt from a story.

use crate::types::ImageRequest;

/// Upper bound on the story snippet embedded in a prompt, in characters.
pub const MAX_SNIPPET_CHARS: usize = 500;
/// Upper bound on the title embedded in a prompt, in characters.
pub const MAX_TITLE_CHARS: usize = 120;

const STYLE_PREFIX: &str = "beautiful detailed illustration, storybook art style";
const STYLE_SUFFIX: &str = "professional digital art, vibrant colors, cinematic composition, \
     high quality, children's book illustration style";

const SENTENCE_TERMINATORS: [char; 6] = ['.', '!', '?', '؟', '۔', '…'];

/// Builds the image prompt for a story.
pub fn story_prompt(request: &ImageRequest) -> String {
    let snippet = snippet(&request.body, MAX_SNIPPET_CHARS);
    let title = self::snippet(&request.title, MAX_TITLE_CHARS);
    if title.is_empty() {
        format!("{STYLE_PREFIX}, scene showing: {snippet}, {STYLE_SUFFIX}")
    } else {
        format!("{STYLE_PREFIX}, \"{title}\", scene showing: {snippet}, {STYLE_SUFFIX}")
    }
}

/// Cuts `text` to at most `max_chars` characters.
///
/// Prefers the last sentence terminator inside the limit as long as the cut
/// keeps at least half of it, then the last whitespace, then a hard cut.
/// Newlines are collapsed first.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let text = collapse_whitespace(text);
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text;
    }

    let window = &chars[..max_chars];
    let cut = window
        .iter()
        .rposition(|c| SENTENCE_TERMINATORS.contains(c))
        .map(|i| i + 1)
        .filter(|&end| end * 2 >= max_chars)
        .or_else(|| window.iter().rposition(|c| c.is_whitespace()))
        .filter(|&i| i > 0)
        .unwrap_or(max_chars);

    window[..cut].iter().collect::<String>().trim_end().to_string()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
