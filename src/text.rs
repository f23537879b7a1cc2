//! Text helpers shared by the roster and the word games.

pub const MAX_NAME_CHARS: usize = 28;
pub const CODE_LENGTH: usize = 6;
const MAX_FILLER_CHARS: usize = 24;

/// Words ignored when matching decoy fillers to a source quote
pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "from", "if", "in", "into",
    "is", "it", "its", "of", "on", "or", "that", "the", "their", "there", "they", "this", "to",
    "was", "we", "were", "with", "you", "your",
];

/// A word found in a quote with its byte span
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSpan {
    pub word: String,
    pub normalized: String,
    pub start: usize,
    pub end: usize,
}

fn continues_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '\'' || c == '\u{2019}' || c == '-'
}

/// Split text into words: an ASCII letter or digit followed by letters, digits,
/// apostrophes or hyphens.
pub fn extract_words(text: &str) -> Vec<WordSpan> {
    let mut words = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        if !c.is_ascii_alphanumeric() {
            continue;
        }
        let mut end = start + c.len_utf8();
        while let Some(&(idx, next)) = chars.peek() {
            if !continues_word(next) {
                break;
            }
            end = idx + next.len_utf8();
            chars.next();
        }
        let word = &text[start..end];
        words.push(WordSpan {
            word: word.to_string(),
            normalized: normalize_word(word),
            start,
            end,
        });
    }

    words
}

/// Lowercase and keep only ASCII letters and digits
pub fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

pub fn is_stopword(normalized: &str) -> bool {
    STOPWORDS.contains(&normalized)
}

/// Collapse whitespace and cap the length; blank names become "Player"
pub fn sanitize_display_name(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let capped: String = collapsed.chars().take(MAX_NAME_CHARS).collect();
    let capped = capped.trim_end();
    if capped.is_empty() {
        "Player".to_string()
    } else {
        capped.to_string()
    }
}

/// Uppercase, strip anything that isn't alphanumeric, keep the first six characters
pub fn normalize_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .take(CODE_LENGTH)
        .collect()
}

/// Case- and punctuation-insensitive key for comparing author names
pub fn normalize_author(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

/// Cleaned-up decoy word shown inside a redaction box
pub fn filler_display(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| continues_word(*c))
        .take(MAX_FILLER_CHARS)
        .collect();
    if cleaned.is_empty() {
        "REDACTED".to_string()
    } else {
        cleaned.to_uppercase()
    }
}

/// Replace each redacted word with a `[[FILLER]]` box, keeping the surrounding text
pub fn render_puzzle(text: &str, redactions: &[usize], fillers: &[String]) -> String {
    let words = extract_words(text);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;

    for (slot, &index) in redactions.iter().enumerate() {
        let Some(word) = words.get(index) else {
            continue;
        };
        let filler = fillers
            .get(slot)
            .map(|f| filler_display(f))
            .unwrap_or_else(|| "REDACTED".to_string());
        out.push_str(&text[cursor..word.start]);
        out.push_str("[[");
        out.push_str(&filler);
        out.push_str("]]");
        cursor = word.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_words_keeps_apostrophes_and_hyphens() {
        let words = extract_words("Don't  over-think it, 2am!");
        let raw: Vec<_> = words.iter().map(|w| w.word.as_str()).collect();
        assert_eq!(raw, vec!["Don't", "over-think", "it", "2am"]);
        assert_eq!(words[0].normalized, "dont");
        assert_eq!(words[1].normalized, "overthink");
    }

    #[test]
    fn test_extract_words_skips_leading_punctuation() {
        let words = extract_words("--'quoted' ...");
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].word, "quoted'");
    }

    #[test]
    fn test_sanitize_display_name() {
        assert_eq!(sanitize_display_name("  Ada   Lovelace "), "Ada Lovelace");
        assert_eq!(sanitize_display_name("   "), "Player");
        assert_eq!(sanitize_display_name(&"x".repeat(40)).len(), MAX_NAME_CHARS);
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(" ab-cd ef9z"), "ABCDEF");
        assert_eq!(normalize_code("k2m"), "K2M");
    }

    #[test]
    fn test_render_puzzle() {
        let text = "The cat sat on the mat.";
        let puzzle = render_puzzle(text, &[1, 5], &["dog".to_string(), "rug!".to_string()]);
        assert_eq!(puzzle, "The [[DOG]] sat on the [[RUG]].");
    }

    #[test]
    fn test_render_puzzle_missing_filler() {
        let puzzle = render_puzzle("one two three", &[2], &[]);
        assert_eq!(puzzle, "one two [[REDACTED]]");
    }
}
